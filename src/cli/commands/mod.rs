//! CLI command implementations

pub mod columns;
pub mod completions;
pub mod import;
pub mod init;
pub mod lists;
pub mod print;
pub mod report_task;
pub mod tasks;
pub mod templates;
pub mod voters;
