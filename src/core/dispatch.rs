//! Report submission and task status tracking
//!
//! Submission validates the report, persists it together with a Pending
//! task, then hands a launch directive to a [`WorkerLauncher`] and returns
//! without waiting. Every later status change belongs to the worker.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::core::actor::Actor;
use crate::core::engine::Engine;
use crate::core::error::{EngineError, EngineResult};
use crate::core::filter::{FilterSet, OwnershipScope};
use crate::core::lists::ListManager;
use crate::entities::{Report, ReportFields, ReportTask, ReportTypeCode, TaskFields};

/// Worker subcommand a directive invokes
pub const WORKER_SUBCOMMAND: &str = "report-task";

/// What to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// One voter by id
    Single(i64),
    /// The current search or list
    Collection,
}

#[derive(Debug, Clone)]
pub struct PrintRequest {
    pub mode: PrintMode,
    pub list_id: Option<i64>,
    pub inputs: FilterSet,
    pub scope: OwnershipScope,
    /// Explicit columns; otherwise the list's or the default set
    pub columns: Option<Vec<String>>,
    pub name: String,
    pub title: String,
    pub task: TaskFields,
}

/// Opaque instruction for the worker launcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDirective {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchDirective {
    /// Directive that runs the worker for `actor`'s pending tasks
    pub fn for_actor(program: impl Into<String>, working_dir: impl Into<PathBuf>, actor: &Actor) -> Self {
        let mut args = vec![WORKER_SUBCOMMAND.to_string(), actor.user_id.to_string()];
        if let Some(account) = actor.account_id {
            args.push("--account".to_string());
            args.push(account.to_string());
        }
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
        }
    }
}

impl fmt::Display for LaunchDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cd {} && {}", self.working_dir.display(), self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes a directive detached; gives no synchronous result
pub trait WorkerLauncher {
    fn launch(&self, directive: &LaunchDirective) -> EngineResult<()>;
}

/// Spawns the directive as a child process and does not wait on it
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl WorkerLauncher for ProcessLauncher {
    fn launch(&self, directive: &LaunchDirective) -> EngineResult<()> {
        let child = Command::new(&directive.program)
            .args(&directive.args)
            .current_dir(&directive.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Launch(format!("{}: {}", directive.program, e)))?;
        tracing::debug!(pid = child.id(), "worker launched");
        Ok(())
    }
}

/// A persisted report and its task
#[derive(Debug, Clone)]
pub struct Submission {
    pub report: Report,
    pub task: ReportTask,
    /// Set when the task was recorded but the worker could not be started
    pub launch_error: Option<String>,
}

/// Machine-readable submission result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub success: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
}

impl SubmitOutcome {
    pub fn from_result(result: &EngineResult<Submission>) -> Self {
        match result {
            Ok(submission) => Self {
                success: true,
                errors: submission.launch_error.iter().cloned().collect(),
                task_id: Some(submission.task.id),
            },
            Err(EngineError::Validation(errors)) => Self {
                success: false,
                errors: errors.messages(),
                task_id: None,
            },
            Err(e) => Self {
                success: false,
                errors: vec![e.to_string()],
                task_id: None,
            },
        }
    }
}

pub struct Dispatcher<'e> {
    engine: &'e Engine<'e>,
    launcher: &'e dyn WorkerLauncher,
    program: String,
    working_dir: PathBuf,
}

impl<'e> Dispatcher<'e> {
    pub fn new(
        engine: &'e Engine<'e>,
        launcher: &'e dyn WorkerLauncher,
        program: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            launcher,
            program: program.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Report fields for a print request
    ///
    /// Single mode prints exactly `{id}` with the single-voter report type.
    /// Collection mode layers the request inputs, then the active list's
    /// filters (list keys win), then the ownership toggle as `mine`.
    pub fn report_fields(&self, actor: &Actor, request: &PrintRequest) -> EngineResult<ReportFields> {
        let lists = ListManager::new(self.engine, *actor);
        let resolved = lists.resolve(request.list_id)?;
        if let Some(warning) = &resolved.warning {
            tracing::warn!("{}", warning);
        }

        let columns = match request.columns.as_ref().filter(|c| !c.is_empty()) {
            Some(requested) => self.engine.registry.known_keys(requested),
            None => resolved.columns.clone(),
        };

        let (filters, code) = match request.mode {
            PrintMode::Single(id) => (
                FilterSet::new().with("id", id.to_string()),
                ReportTypeCode::Single,
            ),
            PrintMode::Collection => {
                let mut filters = request.inputs.without_blanks();
                if let Some(list) = &resolved.list {
                    filters.merge(&list.filters);
                }
                if let Some(mine) = request.scope.as_filter_value() {
                    filters.insert("mine", mine);
                }
                (filters, ReportTypeCode::Collection)
            }
        };

        let report_type = self
            .engine
            .store
            .report_type_by_code(code.code())?
            .ok_or_else(|| EngineError::Schema(format!("report type {} is not seeded", code)))?;

        Ok(ReportFields {
            name: request.name.clone(),
            title: request.title.clone(),
            columns,
            filters,
            report_type_id: report_type.id,
            user_id: actor.user_id,
        })
    }

    /// Build and submit a print request
    pub fn print(&self, actor: &Actor, request: &PrintRequest) -> EngineResult<Submission> {
        let fields = self.report_fields(actor, request)?;
        self.submit(actor, fields, request.task.clone())
    }

    /// Validate, persist Report + Pending task, then launch the worker
    pub fn submit(&self, actor: &Actor, mut fields: ReportFields, mut task: TaskFields) -> EngineResult<Submission> {
        fields.user_id = actor.user_id;
        self.engine.validator.validate_report(&fields)?;

        task.template_id = match task.template_id {
            Some(id) => {
                let template = self
                    .engine
                    .store
                    .template(id)?
                    .filter(|t| t.report_type_id == fields.report_type_id)
                    .ok_or_else(|| EngineError::not_found("template", id))?;
                Some(template.id)
            }
            None => self
                .engine
                .store
                .templates_for_type(fields.report_type_id)?
                .first()
                .map(|t| t.id),
        };

        let directive = LaunchDirective::for_actor(&self.program, &self.working_dir, actor);
        let (report, task) =
            self.engine
                .store
                .create_report_with_task(&fields, &task, &directive.to_string())?;
        tracing::info!(report_id = report.id, task_id = task.id, "report task queued");

        let launch_error = match self.launcher.launch(&directive) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(task_id = task.id, error = %e, "worker launch failed; task stays pending");
                Some(e.to_string())
            }
        };

        Ok(Submission {
            report,
            task,
            launch_error,
        })
    }

    /// A task owned by `actor`
    pub fn status(&self, actor: &Actor, task_id: i64) -> EngineResult<ReportTask> {
        self.engine
            .store
            .find_task(task_id, actor.user_id)?
            .ok_or_else(|| EngineError::not_found("report task", task_id))
    }

    pub fn tasks(&self, actor: &Actor, limit: usize) -> EngineResult<Vec<ReportTask>> {
        self.engine.store.tasks_for_owner(actor.user_id, limit)
    }

    /// Finished tasks not yet reported; each is reported once
    pub fn notifications(&self, actor: &Actor) -> EngineResult<Vec<ReportTask>> {
        let tasks = self.engine.store.unnotified_tasks(actor.user_id)?;
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        self.engine.store.mark_notified(&ids)?;
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::ViewDefaults;
    use crate::core::kv::MemoryKv;
    use crate::core::store::Store;
    use crate::entities::{ListFields, TaskStatus};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingLauncher {
        launched: RefCell<Vec<LaunchDirective>>,
        fail: bool,
    }

    impl WorkerLauncher for RecordingLauncher {
        fn launch(&self, directive: &LaunchDirective) -> EngineResult<()> {
            self.launched.borrow_mut().push(directive.clone());
            if self.fail {
                Err(EngineError::Launch("no such program".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn request(mode: PrintMode) -> PrintRequest {
        PrintRequest {
            mode,
            list_id: None,
            inputs: FilterSet::new(),
            scope: OwnershipScope::All,
            columns: None,
            name: "Print".to_string(),
            title: "Voters".to_string(),
            task: TaskFields::default(),
        }
    }

    #[test]
    fn test_single_mode_filters_are_exactly_id() {
        let store = Store::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let engine = Engine::new(&store, &kv, ViewDefaults::default()).unwrap();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&engine, &launcher, "votelist", "/tmp");
        let actor = Actor::new(3, None);

        let mut req = request(PrintMode::Single(42));
        req.inputs = FilterSet::new().with("gender", "F");
        req.scope = OwnershipScope::Mine;

        let submission = dispatcher.print(&actor, &req).unwrap();
        assert_eq!(submission.report.filters, FilterSet::new().with("id", "42"));
        let report_type = store.report_type(submission.report.report_type_id).unwrap().unwrap();
        assert_eq!(report_type.code, "VOTER");
        assert_eq!(submission.task.template_id, Some(1));
    }

    #[test]
    fn test_collection_mode_layers_list_and_scope() {
        let store = Store::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let engine = Engine::new(&store, &kv, ViewDefaults::default()).unwrap();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&engine, &launcher, "votelist", "/tmp");
        let actor = Actor::new(3, None);

        let list = ListManager::new(&engine, actor)
            .save(
                ListFields {
                    name: "Base".to_string(),
                    columns: vec!["voter_id".to_string()],
                    filters: FilterSet::new().with("gender", "M").with("party_id", "2"),
                    ..Default::default()
                },
                None,
                false,
            )
            .unwrap();

        let mut req = request(PrintMode::Collection);
        req.list_id = Some(list.id);
        req.inputs = FilterSet::new().with("gender", "F").with("age", "40").with("city", "");
        req.scope = OwnershipScope::NotMine;

        let fields = dispatcher.report_fields(&actor, &req).unwrap();
        assert_eq!(fields.filters.get("gender"), Some("M"));
        assert_eq!(fields.filters.get("age"), Some("40"));
        assert_eq!(fields.filters.get("party_id"), Some("2"));
        assert_eq!(fields.filters.get("mine"), Some("0"));
        assert_eq!(fields.filters.get("city"), None);
        assert_eq!(fields.columns, vec!["voter_id"]);
        assert_eq!(store.report_type(fields.report_type_id).unwrap().unwrap().code, "VOTERS");
    }

    #[test]
    fn test_submit_persists_pending_and_launches() {
        let store = Store::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let engine = Engine::new(&store, &kv, ViewDefaults::default()).unwrap();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&engine, &launcher, "votelist", "/srv/app");
        let actor = Actor::new(3, Some(9));

        let submission = dispatcher.print(&actor, &request(PrintMode::Collection)).unwrap();
        assert_eq!(submission.task.status, TaskStatus::Pending);
        assert_eq!(
            submission.task.command,
            "cd /srv/app && votelist report-task 3 --account 9"
        );
        assert!(submission.launch_error.is_none());

        let launched = launcher.launched.borrow();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].args, vec!["report-task", "3", "--account", "9"]);
    }

    #[test]
    fn test_empty_name_persists_nothing() {
        let store = Store::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let engine = Engine::new(&store, &kv, ViewDefaults::default()).unwrap();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&engine, &launcher, "votelist", "/tmp");

        let mut req = request(PrintMode::Collection);
        req.name = String::new();
        let result = dispatcher.print(&Actor::new(3, None), &req);

        let outcome = SubmitOutcome::from_result(&result);
        assert!(!outcome.success);
        assert!(outcome.errors.iter().any(|e| e.starts_with("name:")));
        assert_eq!(store.count_reports().unwrap(), 0);
        assert_eq!(store.count_tasks().unwrap(), 0);
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn test_launch_failure_keeps_pending_task() {
        let store = Store::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let engine = Engine::new(&store, &kv, ViewDefaults::default()).unwrap();
        let launcher = RecordingLauncher {
            fail: true,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(&engine, &launcher, "votelist", "/tmp");
        let actor = Actor::new(3, None);

        let result = dispatcher.print(&actor, &request(PrintMode::Collection));
        let outcome = SubmitOutcome::from_result(&result);
        assert!(outcome.success);
        assert_eq!(outcome.errors.len(), 1);

        let task = dispatcher.status(&actor, outcome.task_id.unwrap()).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_status_is_owner_scoped() {
        let store = Store::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let engine = Engine::new(&store, &kv, ViewDefaults::default()).unwrap();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&engine, &launcher, "votelist", "/tmp");

        let submission = dispatcher
            .print(&Actor::new(3, None), &request(PrintMode::Collection))
            .unwrap();
        assert!(matches!(
            dispatcher.status(&Actor::new(4, None), submission.task.id),
            Err(EngineError::NotFound { .. })
        ));
        assert_eq!(dispatcher.tasks(&Actor::new(3, None), 10).unwrap().len(), 1);
    }

    #[test]
    fn test_template_must_match_type() {
        let store = Store::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let engine = Engine::new(&store, &kv, ViewDefaults::default()).unwrap();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&engine, &launcher, "votelist", "/tmp");

        let mut req = request(PrintMode::Collection);
        req.task.template_id = Some(1);
        assert!(matches!(
            dispatcher.print(&Actor::new(3, None), &req),
            Err(EngineError::NotFound { what: "template", .. })
        ));
    }
}
