//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Project directory name
pub const PROJECT_DIR: &str = ".votelist";

/// Represents a votelist project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .votelist/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::init_force(&root)
    }

    /// Initialize even if .votelist/ exists; an existing config is kept
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let project = Self { root };

        std::fs::create_dir_all(project.reports_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let config_path = project.config_path();
        if !config_path.exists() {
            std::fs::write(&config_path, Self::default_config())
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# votelist project configuration

# Acting user and visibility scope (overridable with --user/--account)
# user: 1
# account: 1

# Columns shown when no saved list is selected
# default_columns: [photo, voter_id, fullname, gender, age, phone_number, pollsite_id, assemblydistrict_id, electiondistrict_id]

# Relations loaded when no selected column needs one
# default_eager: [pollsite, assemblydistrict, electiondistrict]

# page_size: 10
# session_ttl_minutes: 120

# Program the report launch directive runs (default: this executable)
# worker: votelist
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .votelist directory
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_dir().join("config.yaml")
    }

    /// SQLite store location
    pub fn db_path(&self) -> PathBuf {
        self.project_dir().join("votelist.db")
    }

    /// Where the report worker writes rendered files
    pub fn reports_dir(&self) -> PathBuf {
        self.project_dir().join("reports")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a votelist project (searched from {searched_from:?}). Run 'votelist init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("votelist project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.project_dir().is_dir());
        assert!(project.config_path().exists());
        assert!(project.reports_dir().is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_init_force_keeps_config() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        std::fs::write(project.config_path(), "page_size: 25\n").unwrap();

        let again = Project::init_force(tmp.path()).unwrap();
        let contents = std::fs::read_to_string(again.config_path()).unwrap();
        assert_eq!(contents, "page_size: 25\n");
    }

    #[test]
    fn test_project_discover_from_nested_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_project_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}
