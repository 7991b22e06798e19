//! SQLite-backed persistent store
//!
//! Holds the voter source and its lookup tables, saved lists, reports with
//! their tasks, and the key-value cache. One connection per process; every
//! write touches one list, or one report together with its task.

mod kv;
mod lists;
mod reports;
mod schema;
mod voters;

pub use voters::BuildingCount;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::core::error::EngineResult;
use crate::core::project::Project;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// The store backed by SQLite
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the store for a project
    pub fn open(project: &Project) -> EngineResult<Self> {
        Self::open_path(&project.db_path())
    }

    pub fn open_path(path: &Path) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets the worker write while a view reads
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Get direct access to the connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn parse_optional_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(parse_datetime)
}

/// Decode a JSON text column, tolerating corrupt rows
fn parse_json_column<T: serde::de::DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "undecodable JSON column, using empty value");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_schema_and_seeds() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let store = Store::open(&project).unwrap();
        assert!(project.db_path().exists());
        assert!(store.report_type_by_code("VOTER").unwrap().is_some());

        // Reopening is idempotent
        drop(store);
        let store = Store::open(&project).unwrap();
        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM report_types", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_parse_datetime_fallback() {
        assert_eq!(parse_datetime("garbage".to_string()).timestamp(), 0);
        let dt = parse_datetime("2024-05-01T10:00:00+00:00".to_string());
        assert_eq!(dt.timestamp(), 1714557600);
    }
}
