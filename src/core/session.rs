//! Per-session state kept in the key-value cache
//!
//! A session holds the remembered page size and a one-shot "flash" slot
//! for the last search inputs, which the next view consumes as old input.

use chrono::Duration;
use serde_json::json;

use crate::core::error::EngineResult;
use crate::core::filter::FilterSet;
use crate::core::kv::{get_typed, keys, KeyValueStore};

const PER_PAGE: &str = "per_page";
const FLASH: &str = "flash";

pub struct Session<'a> {
    id: String,
    kv: &'a dyn KeyValueStore,
    ttl: Duration,
}

impl<'a> Session<'a> {
    pub fn new(id: impl Into<String>, kv: &'a dyn KeyValueStore, ttl_minutes: i64) -> Self {
        Self {
            id: id.into(),
            kv,
            ttl: Duration::minutes(ttl_minutes.max(1)),
        }
    }

    pub fn per_page(&self) -> EngineResult<Option<u32>> {
        Ok(get_typed::<u32>(self.kv, &keys::session(&self.id, PER_PAGE))?.filter(|n| *n > 0))
    }

    pub fn set_per_page(&self, per_page: u32) -> EngineResult<()> {
        self.kv
            .put(&keys::session(&self.id, PER_PAGE), json!(per_page), self.ttl)
    }

    /// Keep `inputs` for the next request only
    pub fn flash(&self, inputs: &FilterSet) -> EngineResult<()> {
        let value = serde_json::to_value(inputs)?;
        self.kv.put(&keys::session(&self.id, FLASH), value, self.ttl)
    }

    /// Read and clear the flashed inputs
    pub fn take_flashed(&self) -> EngineResult<Option<FilterSet>> {
        let key = keys::session(&self.id, FLASH);
        let flashed = get_typed::<FilterSet>(self.kv, &key)?;
        if flashed.is_some() {
            self.kv.forget(&key)?;
        }
        Ok(flashed)
    }

    /// Read the flashed inputs without consuming them
    pub fn peek_flashed(&self) -> EngineResult<Option<FilterSet>> {
        get_typed::<FilterSet>(self.kv, &keys::session(&self.id, FLASH))
    }
}
