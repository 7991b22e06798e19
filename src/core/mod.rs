//! Core module - the view and report engine

pub mod actor;
pub mod config;
pub mod dispatch;
pub mod eager;
pub mod engine;
pub mod error;
pub mod filter;
pub mod kv;
pub mod lists;
pub mod pagination;
pub mod presets;
pub mod project;
pub mod query;
pub mod registry;
pub mod session;
pub mod store;
pub mod validation;
pub mod view;

pub use actor::Actor;
pub use config::Config;
pub use dispatch::{
    Dispatcher, LaunchDirective, PrintMode, PrintRequest, ProcessLauncher, SubmitOutcome,
    WorkerLauncher,
};
pub use engine::{Engine, ViewDefaults};
pub use error::{EngineError, EngineResult, FieldError, ValidationErrors};
pub use filter::{FilterCompiler, FilterSet, OwnershipScope};
pub use kv::{KeyValueStore, MemoryKv};
pub use lists::{ColumnsSaved, ListManager, ResolvedList};
pub use presets::Preset;
pub use project::{Project, ProjectError};
pub use query::VoterQuery;
pub use registry::{ColumnDefinition, ColumnRegistry};
pub use session::Session;
pub use store::Store;
pub use view::{ColumnMeta, ViewEngine, ViewRequest, ViewResult};
