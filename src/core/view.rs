//! View pipeline: resolve columns, plan eager loads, compile filters,
//! count and paginate.

use serde::Serialize;

use crate::core::actor::Actor;
use crate::core::eager::plan_eager_loads;
use crate::core::engine::Engine;
use crate::core::error::{EngineError, EngineResult};
use crate::core::filter::{FilterCompiler, FilterSet, OwnershipScope};
use crate::core::lists::ListManager;
use crate::core::pagination::{self, Counts, RecordWindow};
use crate::core::session::Session;
use crate::entities::{Relation, SavedList, Voter};

/// Flash markers for the ownership toggle
const MINE_ONLY: &str = "mine_only";
const NOT_MINE: &str = "not_mine";

/// Search inputs and ownership toggle of a flashed search
pub fn split_flashed(mut flashed: FilterSet) -> (FilterSet, OwnershipScope) {
    let mine_only = flashed.remove(MINE_ONLY).is_some();
    let not_mine = flashed.remove(NOT_MINE).is_some();
    (flashed, OwnershipScope::from_flags(mine_only, not_mine))
}

/// A flashed search as list filters; the ownership toggle becomes `mine`
pub fn flashed_as_filters(flashed: FilterSet) -> FilterSet {
    let (mut filters, scope) = split_flashed(flashed);
    if let Some(mine) = scope.as_filter_value() {
        filters.insert("mine", mine);
    }
    filters
}

/// One view request as the rendering layer sends it
#[derive(Debug, Clone, Default)]
pub struct ViewRequest {
    pub list_id: Option<i64>,
    /// Explicit column override for this request only
    pub columns: Option<Vec<String>>,
    pub inputs: FilterSet,
    pub do_search: bool,
    pub scope: OwnershipScope,
    pub per_page: Option<i64>,
    pub page: Option<i64>,
    /// Re-run the search flashed by the previous request
    pub continue_search: bool,
}

/// Column metadata handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<SavedList>,
    pub columns: Vec<ColumnMeta>,
    pub voters: Vec<Voter>,
    pub counts: Counts,
    pub page: u32,
    pub per_page: u32,
    pub last_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordWindow>,
    pub eager: Vec<Relation>,
    pub applied_filters: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_input: Option<FilterSet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ViewResult {
    pub fn records_label(&self) -> Option<String> {
        self.records.map(|r| r.to_string())
    }

    /// Rendered cells for one voter, in column order
    pub fn row(&self, engine: &Engine<'_>, voter: &Voter) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| {
                engine
                    .registry
                    .get(&c.key)
                    .and_then(|def| def.value(voter))
                    .unwrap_or_default()
            })
            .collect()
    }
}

pub struct ViewEngine<'e> {
    engine: &'e Engine<'e>,
    actor: Actor,
}

impl<'e> ViewEngine<'e> {
    pub fn new(engine: &'e Engine<'e>, actor: Actor) -> Self {
        Self { engine, actor }
    }

    /// Run one view request within `session`
    pub fn render(&self, session: &Session<'_>, mut request: ViewRequest) -> EngineResult<ViewResult> {
        let old_input = session.take_flashed()?;

        if request.continue_search {
            if let Some(old) = &old_input {
                let (inputs, scope) = split_flashed(old.clone());
                request.inputs = inputs;
                request.scope = scope;
                request.do_search = true;
            }
        }

        let lists = ListManager::new(self.engine, self.actor);
        let resolved = lists.resolve(request.list_id)?;
        let mut warnings: Vec<String> = resolved.warning.into_iter().collect();

        let mut columns = resolved.columns;
        if let Some(requested) = request.columns.as_ref().filter(|c| !c.is_empty()) {
            let known = self.engine.registry.known_keys(requested);
            if known.is_empty() {
                warnings.push("None of the requested columns exist; keeping the current set".to_string());
            } else {
                columns = known;
            }
        }

        let eager = plan_eager_loads(&self.engine.registry, &columns, &self.engine.defaults.eager);
        tracing::debug!(eager = ?eager, "eager-load plan");

        let per_page =
            pagination::resolve_page_size(request.per_page, session, self.engine.defaults.page_size)?;
        let page = pagination::page_number(request.page);
        tracing::debug!(per_page, page, "page window");

        let mut query = self.actor.scoped_query();
        query.set_eager(eager.clone());

        let compiler = FilterCompiler::new(&self.engine.registry);
        let mut applied = Vec::new();
        if let Some(list) = &resolved.list {
            applied.extend(compiler.apply(&mut query, &list.filters));
        }
        if request.do_search {
            for key in compiler.apply(&mut query, &request.inputs) {
                if !applied.contains(&key) {
                    applied.push(key);
                }
            }
        }
        request.scope.apply(&mut query);

        if request.do_search || request.scope != OwnershipScope::All {
            let mut flashed = request.inputs.clone();
            match request.scope {
                OwnershipScope::Mine => {
                    flashed.insert(MINE_ONLY, "1");
                }
                OwnershipScope::NotMine => {
                    flashed.insert(NOT_MINE, "1");
                }
                OwnershipScope::All => {}
            }
            session.flash(&flashed)?;
        }

        let unpaged = query.without_pagination();
        let total = self.engine.store.count_voters(&unpaged)?;
        let mut mine_query = unpaged.clone();
        mine_query.where_mine();
        let mine = self.engine.store.count_voters(&mine_query)?;

        query.paginate(page, per_page);
        let voters = self.engine.store.fetch_voters(&query)?;

        let columns = self
            .engine
            .registry
            .resolve(&columns)
            .into_iter()
            .map(|c| ColumnMeta {
                key: c.key.to_string(),
                label: c.label.to_string(),
            })
            .collect();

        Ok(ViewResult {
            list: resolved.list,
            columns,
            voters,
            counts: Counts::split(total, mine),
            page,
            per_page,
            last_page: pagination::last_page(total, per_page),
            records: RecordWindow::for_page(page, per_page, total),
            eager,
            applied_filters: applied,
            old_input,
            warnings,
        })
    }

    /// One voter within the visibility scope, with all relations
    pub fn voter(&self, id: i64) -> EngineResult<Voter> {
        self.engine
            .store
            .find_voter(&self.actor.scoped_query(), id)?
            .ok_or_else(|| EngineError::not_found("voter", id))
    }
}
