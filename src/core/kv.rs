//! Key-value cache used for user preferences, the list-of-lists and sessions

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::error::EngineResult;

/// A small key-value store with optional expiry
pub trait KeyValueStore {
    /// Live value for `key`; expired entries read as absent
    fn get(&self, key: &str) -> EngineResult<Option<Value>>;

    /// Store `value` until `ttl` elapses
    fn put(&self, key: &str, value: Value, ttl: Duration) -> EngineResult<()>;

    /// Store `value` with no expiry
    fn forever(&self, key: &str, value: Value) -> EngineResult<()>;

    fn forget(&self, key: &str) -> EngineResult<()>;
}

/// Typed read; missing or undecodable values yield `None`
pub fn get_typed<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> EngineResult<Option<T>> {
    let Some(value) = kv.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring undecodable cache entry");
            Ok(None)
        }
    }
}

/// Typed read with a fallback
pub fn get_or<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str, default: T) -> EngineResult<T> {
    Ok(get_typed(kv, key)?.unwrap_or(default))
}

/// Cache key builders
pub mod keys {
    /// A user's preferred columns for the default view
    pub fn default_columns(user_id: i64) -> String {
        format!("{}-voter-list-default-columns", user_id)
    }

    /// A user's cached saved-list summaries
    pub fn list_of_lists(user_id: i64) -> String {
        format!("{}-voterlist-list", user_id)
    }

    pub fn session(session_id: &str, name: &str) -> String {
        format!("session:{}:{}", session_id, name)
    }
}

pub(crate) fn expiry_after(ttl: Duration) -> DateTime<Utc> {
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// In-process store for tests and one-shot runs
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, (Value, Option<DateTime<Utc>>)>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, key: &str, value: Value, expires_at: Option<DateTime<Utc>>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), (value, expires_at));
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> EngineResult<Option<Value>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some((_, Some(expires_at))) => *expires_at <= Utc::now(),
            Some(_) => false,
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) -> EngineResult<()> {
        self.insert(key, value, Some(expiry_after(ttl)));
        Ok(())
    }

    fn forever(&self, key: &str, value: Value) -> EngineResult<()> {
        self.insert(key, value, None);
        Ok(())
    }

    fn forget(&self, key: &str) -> EngineResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}
