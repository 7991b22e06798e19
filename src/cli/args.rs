//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, import::ImportArgs, init::InitArgs, lists::ListsCommands,
    print::PrintArgs, report_task::ReportTaskArgs, tasks::TasksCommands,
    templates::TemplatesArgs, voters::VotersCommands,
};

#[derive(Parser)]
#[command(name = "votelist")]
#[command(author, version, about = "Voter list views and reports")]
#[command(long_about = "Browse a permission-scoped voter roll through configurable column and filter views, keep them as saved lists, and queue printable reports.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .votelist/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Acting user id (overrides config and VOTELIST_USER)
    #[arg(long, global = true)]
    pub user: Option<i64>,

    /// Account the voter source is scoped to
    #[arg(long, global = true)]
    pub account: Option<i64>,

    /// Session holding page size and flashed search input
    #[arg(long, global = true, default_value = "default")]
    pub session: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new votelist project
    Init(InitArgs),

    /// Import voters or lookup tables from CSV
    Import(ImportArgs),

    /// Browse voters through column and filter views
    #[command(subcommand)]
    Voters(VotersCommands),

    /// Saved list management
    #[command(subcommand)]
    Lists(ListsCommands),

    /// Queue a printable report of one voter or the current search
    Print(PrintArgs),

    /// Report task status and completion notices
    #[command(subcommand)]
    Tasks(TasksCommands),

    /// List templates registered for a report type
    Templates(TemplatesArgs),

    /// Show the column catalog
    Columns,

    /// Run pending report tasks for a user (invoked by the launcher)
    #[command(hide = true)]
    ReportTask(ReportTaskArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (pretty for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
