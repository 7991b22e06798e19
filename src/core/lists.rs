//! Saved-list lifecycle: resolve, save, change columns, delete
//!
//! Every operation is scoped to the acting user. Not-found conditions on
//! resolve degrade to the default column set with a warning; on save,
//! column change and delete they surface as `EngineError::NotFound`.

use serde_json::json;

use crate::core::actor::Actor;
use crate::core::engine::Engine;
use crate::core::error::{EngineError, EngineResult};
use crate::core::kv::{get_or, get_typed, keys};
use crate::entities::{ListFields, ListSummary, SavedList};

/// Outcome of resolving the active list
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedList {
    pub list: Option<SavedList>,
    pub columns: Vec<String>,
    pub warning: Option<String>,
}

/// Where a column change was stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnsSaved {
    List(i64),
    UserDefault,
}

pub struct ListManager<'e> {
    engine: &'e Engine<'e>,
    actor: Actor,
}

impl<'e> ListManager<'e> {
    pub fn new(engine: &'e Engine<'e>, actor: Actor) -> Self {
        Self { engine, actor }
    }

    /// The active list, or the default columns when there is none
    pub fn resolve(&self, list_id: Option<i64>) -> EngineResult<ResolvedList> {
        let Some(id) = list_id.filter(|id| *id > 0) else {
            return Ok(ResolvedList {
                list: None,
                columns: self.default_columns()?,
                warning: None,
            });
        };

        match self.engine.store.find_list(id, self.actor.user_id)? {
            Some(list) => {
                let columns = self.engine.registry.known_keys(&list.columns);
                Ok(ResolvedList {
                    list: Some(list),
                    columns,
                    warning: None,
                })
            }
            None => {
                let warning = EngineError::not_found("list", id).to_string();
                tracing::warn!(list_id = id, user = self.actor.user_id, "list not found, using defaults");
                Ok(ResolvedList {
                    list: None,
                    columns: self.default_columns()?,
                    warning: Some(warning),
                })
            }
        }
    }

    /// Per-user cached default, else the configured default
    pub fn default_columns(&self) -> EngineResult<Vec<String>> {
        let key = keys::default_columns(self.actor.user_id);
        let cached: Vec<String> = get_or(self.engine.kv, &key, Vec::new())?;
        let known = self.engine.registry.known_keys(&cached);
        if !known.is_empty() {
            return Ok(known);
        }
        Ok(self.engine.registry.known_keys(&self.engine.defaults.columns))
    }

    /// Persist `columns` as the user's durable default
    pub fn set_default_columns(&self, columns: &[String]) -> EngineResult<Vec<String>> {
        let known = self.engine.registry.known_keys(columns);
        self.engine
            .kv
            .forever(&keys::default_columns(self.actor.user_id), json!(known))?;
        tracing::info!(user = self.actor.user_id, columns = ?known, "saved default columns");
        Ok(known)
    }

    /// Update in place, or insert when there is no target or `save_as_new`.
    ///
    /// The stored filters of an owned `existing_id` list are layered over
    /// `fields.filters`, so list keys win for both update and copy.
    pub fn save(
        &self,
        mut fields: ListFields,
        existing_id: Option<i64>,
        save_as_new: bool,
    ) -> EngineResult<SavedList> {
        let store = self.engine.store;
        if let Some(id) = existing_id.filter(|id| *id > 0) {
            if let Some(source) = store.find_list(id, self.actor.user_id)? {
                fields.filters.merge(&source.filters);
            }
        }

        fields.user_id = self.actor.user_id;
        fields.columns = self.engine.registry.known_keys(&fields.columns);
        fields.filters = fields.filters.without_blanks();
        fields.description = fields
            .description
            .filter(|d| !d.trim().is_empty());

        self.engine.validator.validate_list(&fields)?;

        let saved = match existing_id.filter(|id| *id > 0) {
            Some(id) if !save_as_new => {
                if !store.update_list(id, &fields)? {
                    return Err(EngineError::not_found("list", id));
                }
                store
                    .find_list(id, self.actor.user_id)?
                    .ok_or_else(|| EngineError::not_found("list", id))?
            }
            _ => store.insert_list(&fields)?,
        };

        self.invalidate()?;
        tracing::info!(list_id = saved.id, name = %saved.name, "saved list");
        Ok(saved)
    }

    /// Store `columns` on the active list, or as the user default without one
    pub fn change_columns(&self, list_id: Option<i64>, columns: &[String]) -> EngineResult<ColumnsSaved> {
        match list_id.filter(|id| *id > 0) {
            Some(id) => {
                let known = self.engine.registry.known_keys(columns);
                if !self
                    .engine
                    .store
                    .update_list_columns(id, self.actor.user_id, &known)?
                {
                    return Err(EngineError::not_found("list", id));
                }
                self.invalidate()?;
                Ok(ColumnsSaved::List(id))
            }
            None => {
                self.set_default_columns(columns)?;
                Ok(ColumnsSaved::UserDefault)
            }
        }
    }

    /// Delete an owned list, returning its name
    pub fn delete(&self, id: i64) -> EngineResult<String> {
        let list = self
            .engine
            .store
            .find_list(id, self.actor.user_id)?
            .ok_or_else(|| EngineError::not_found("list", id))?;

        if !self.engine.store.delete_list(id, self.actor.user_id)? {
            return Err(EngineError::not_found("list", id));
        }

        self.invalidate()?;
        tracing::info!(list_id = id, name = %list.name, "deleted list");
        Ok(list.name)
    }

    /// Cached summaries of the actor's lists
    pub fn summaries(&self) -> EngineResult<Vec<ListSummary>> {
        let key = keys::list_of_lists(self.actor.user_id);
        if let Some(cached) = get_typed::<Vec<ListSummary>>(self.engine.kv, &key)? {
            return Ok(cached);
        }

        let summaries: Vec<ListSummary> = self
            .engine
            .store
            .lists_for_owner(self.actor.user_id)?
            .iter()
            .map(ListSummary::from)
            .collect();
        self.engine.kv.forever(&key, serde_json::to_value(&summaries)?)?;
        Ok(summaries)
    }

    fn invalidate(&self) -> EngineResult<()> {
        self.engine.kv.forget(&keys::list_of_lists(self.actor.user_id))
    }
}
