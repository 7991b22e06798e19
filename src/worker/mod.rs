//! Out-of-process report worker
//!
//! Invoked through the launch directive recorded on each task. Owns every
//! status transition after `Pending`: it claims a task (`Processing`), rebuilds
//! the report query with the same filter compiler and eager-load planner the
//! view pipeline uses, renders, and records `Done` or `Failed`.

pub mod render;

use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::actor::Actor;
use crate::core::eager::plan_eager_loads;
use crate::core::engine::Engine;
use crate::core::error::{EngineError, EngineResult};
use crate::core::filter::FilterCompiler;
use crate::entities::{Relation, Report, ReportTask, ReportTypeCode, TaskStatus};

pub use render::{Cell, ReportDocument, ReportRenderer};

/// Outcome of one worker run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub done: Vec<i64>,
    pub failed: Vec<i64>,
    /// Tasks another worker claimed first
    pub skipped: Vec<i64>,
}

impl WorkerSummary {
    pub fn processed(&self) -> usize {
        self.done.len() + self.failed.len()
    }
}

pub struct ReportWorker<'e> {
    engine: &'e Engine<'e>,
    renderer: ReportRenderer,
    output_dir: PathBuf,
}

impl<'e> ReportWorker<'e> {
    pub fn new(engine: &'e Engine<'e>, output_dir: impl Into<PathBuf>) -> EngineResult<Self> {
        Ok(Self {
            engine,
            renderer: ReportRenderer::new()?,
            output_dir: output_dir.into(),
        })
    }

    /// Process every pending task of `actor`, oldest first
    pub fn run_pending(&self, actor: &Actor) -> EngineResult<WorkerSummary> {
        let store = self.engine.store;
        let mut summary = WorkerSummary::default();

        for task in store.pending_tasks(actor.user_id)? {
            if !store.transition_task(task.id, TaskStatus::Pending, TaskStatus::Processing)? {
                tracing::debug!(task_id = task.id, "task already claimed");
                summary.skipped.push(task.id);
                continue;
            }
            tracing::info!(task_id = task.id, report_id = task.report_id, "processing report task");

            match self.process(actor, &task) {
                Ok(path) => {
                    store.complete_task(task.id, &path.display().to_string())?;
                    tracing::info!(task_id = task.id, path = %path.display(), "report task done");
                    summary.done.push(task.id);
                }
                Err(e) => {
                    store.fail_task(task.id, &e.to_string())?;
                    tracing::warn!(task_id = task.id, error = %e, "report task failed");
                    summary.failed.push(task.id);
                }
            }
        }

        Ok(summary)
    }

    fn process(&self, actor: &Actor, task: &ReportTask) -> EngineResult<PathBuf> {
        let store = self.engine.store;
        let report = store
            .find_report(task.report_id)?
            .ok_or_else(|| EngineError::not_found("report", task.report_id))?;
        let report_type = store
            .report_type(report.report_type_id)?
            .ok_or_else(|| EngineError::not_found("report type", report.report_type_id))?;
        let code = ReportTypeCode::from_code(&report_type.code)
            .ok_or_else(|| EngineError::Schema(format!("unknown report type {}", report_type.code)))?;

        let stem = match task.template_id {
            Some(id) => store.template(id)?.map(|t| t.file_stem),
            None => store
                .templates_for_type(report_type.id)?
                .into_iter()
                .next()
                .map(|t| t.file_stem),
        }
        .unwrap_or_else(|| default_stem(code).to_string());

        let doc = self.document(actor, &report, task, code)?;
        let output = self.renderer.render(&doc, task.output_format, &stem)?;

        fs::create_dir_all(&self.output_dir)?;
        let path = output_path(&self.output_dir, task);
        fs::write(&path, output)?;
        Ok(path)
    }

    /// Rows for `report`, fetched without pagination
    pub fn document(
        &self,
        actor: &Actor,
        report: &Report,
        task: &ReportTask,
        code: ReportTypeCode,
    ) -> EngineResult<ReportDocument> {
        let registry = &self.engine.registry;
        let mut columns = registry.known_keys(&report.columns);
        if columns.is_empty() {
            columns = registry.known_keys(&self.engine.defaults.columns);
        }

        let eager = match code {
            ReportTypeCode::Single => Relation::all().to_vec(),
            ReportTypeCode::Collection => {
                plan_eager_loads(registry, &columns, &self.engine.defaults.eager)
            }
        };

        let mut query = actor.scoped_query();
        query.set_eager(eager);
        let applied = FilterCompiler::new(registry).apply(&mut query, &report.filters);
        tracing::debug!(report_id = report.id, filters = ?applied, "report query built");

        let voters = self.engine.store.fetch_voters(&query)?;
        let definitions = registry.resolve(&columns);

        Ok(ReportDocument {
            name: report.name.clone(),
            title: report.title.clone(),
            labels: definitions.iter().map(|c| c.label.to_string()).collect(),
            rows: voters
                .iter()
                .map(|v| {
                    definitions
                        .iter()
                        .map(|c| c.value(v).unwrap_or_default())
                        .collect()
                })
                .collect(),
            orientation: task.orientation,
            paper_size: task.paper_size,
            generated_at: Utc::now(),
        })
    }
}

fn default_stem(code: ReportTypeCode) -> &'static str {
    match code {
        ReportTypeCode::Single => "voter-card",
        ReportTypeCode::Collection => "voters-roster",
    }
}

fn output_path(dir: &Path, task: &ReportTask) -> PathBuf {
    dir.join(format!("report-{}.{}", task.id, task.output_format.extension()))
}
