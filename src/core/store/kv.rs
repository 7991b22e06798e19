//! `KeyValueStore` over the `kv` table

use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::{parse_optional_datetime, Store};
use crate::core::error::EngineResult;
use crate::core::kv::{expiry_after, KeyValueStore};

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> EngineResult<Option<Value>> {
        let row: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT value, expires_at FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((raw, expires_at)) = row else {
            return Ok(None);
        };
        if parse_optional_datetime(expires_at).is_some_and(|at| at <= Utc::now()) {
            self.forget(key)?;
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) -> EngineResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)",
            params![key, value.to_string(), expiry_after(ttl).to_rfc3339()],
        )?;
        Ok(())
    }

    fn forever(&self, key: &str, value: Value) -> EngineResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, expires_at) VALUES (?1, ?2, NULL)",
            params![key, value.to_string()],
        )?;
        Ok(())
    }

    fn forget(&self, key: &str) -> EngineResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}
