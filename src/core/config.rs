//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::pagination::DEFAULT_PAGE_SIZE;
use crate::core::project::Project;
use crate::entities::Relation;

const DEFAULT_COLUMNS: &[&str] = &[
    "photo",
    "voter_id",
    "fullname",
    "gender",
    "age",
    "phone_number",
    "pollsite_id",
    "assemblydistrict_id",
    "electiondistrict_id",
];

const DEFAULT_EAGER: &[Relation] = &[
    Relation::Pollsite,
    Relation::AssemblyDistrict,
    Relation::ElectionDistrict,
];

const DEFAULT_SESSION_TTL_MINUTES: i64 = 120;

/// votelist configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Acting user id
    pub user: Option<i64>,

    /// Account the voter source is scoped to
    pub account: Option<i64>,

    /// Columns shown when no saved list or user default applies
    pub default_columns: Option<Vec<String>>,

    /// Relations loaded when no selected column needs one
    pub default_eager: Option<Vec<Relation>>,

    pub page_size: Option<u32>,

    pub session_ttl_minutes: Option<i64>,

    /// Program the report launch directive runs
    pub worker: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        Self::load_for(Project::discover().ok().as_ref())
    }

    /// Load configuration with an already-discovered project
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (accessors below)

        // 2. Global user config (~/.config/votelist/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.votelist/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        if let Some(user) = env_i64("VOTELIST_USER") {
            config.user = Some(user);
        }
        if let Some(account) = env_i64("VOTELIST_ACCOUNT") {
            config.account = Some(account);
        }
        if let Ok(worker) = std::env::var("VOTELIST_WORKER") {
            if !worker.trim().is_empty() {
                config.worker = Some(worker);
            }
        }

        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::from_yaml(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Config, serde_yml::Error> {
        serde_yml::from_str::<Config>(contents)
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "votelist")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.user.is_some() {
            self.user = other.user;
        }
        if other.account.is_some() {
            self.account = other.account;
        }
        if other.default_columns.is_some() {
            self.default_columns = other.default_columns;
        }
        if other.default_eager.is_some() {
            self.default_eager = other.default_eager;
        }
        if other.page_size.is_some() {
            self.page_size = other.page_size;
        }
        if other.session_ttl_minutes.is_some() {
            self.session_ttl_minutes = other.session_ttl_minutes;
        }
        if other.worker.is_some() {
            self.worker = other.worker;
        }
    }

    pub fn default_columns(&self) -> Vec<String> {
        match &self.default_columns {
            Some(columns) if !columns.is_empty() => columns.clone(),
            _ => DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn default_eager(&self) -> Vec<Relation> {
        match &self.default_eager {
            Some(relations) if !relations.is_empty() => relations.clone(),
            _ => DEFAULT_EAGER.to_vec(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn session_ttl_minutes(&self) -> i64 {
        self.session_ttl_minutes
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES)
    }

    /// Worker program, falling back to the running executable
    pub fn worker(&self) -> String {
        if let Some(ref worker) = self.worker {
            return worker.clone();
        }
        std::env::current_exe()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "votelist".to_string())
    }
}

fn env_i64(name: &str) -> Option<i64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
