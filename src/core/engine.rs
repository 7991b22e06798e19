//! Shared engine context: store, cache, column catalog, validator, defaults

use crate::core::config::Config;
use crate::core::error::EngineResult;
use crate::core::kv::KeyValueStore;
use crate::core::registry::ColumnRegistry;
use crate::core::store::Store;
use crate::core::validation::RecordValidator;
use crate::entities::Relation;

/// Fallbacks used when neither a list nor a session supplies a value
#[derive(Debug, Clone)]
pub struct ViewDefaults {
    pub columns: Vec<String>,
    pub eager: Vec<Relation>,
    pub page_size: u32,
    pub session_ttl_minutes: i64,
}

impl ViewDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            columns: config.default_columns(),
            eager: config.default_eager(),
            page_size: config.page_size(),
            session_ttl_minutes: config.session_ttl_minutes(),
        }
    }
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct Engine<'a> {
    pub store: &'a Store,
    pub kv: &'a dyn KeyValueStore,
    pub registry: ColumnRegistry,
    pub validator: RecordValidator,
    pub defaults: ViewDefaults,
}

impl<'a> Engine<'a> {
    pub fn new(store: &'a Store, kv: &'a dyn KeyValueStore, defaults: ViewDefaults) -> EngineResult<Self> {
        Ok(Self {
            store,
            kv,
            registry: ColumnRegistry::voters(),
            validator: RecordValidator::new()?,
            defaults,
        })
    }
}
