//! `votelist report-task` command - The worker the launch directive runs

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::workspace::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::actor::Actor;
use crate::worker::ReportWorker;

#[derive(clap::Args, Debug)]
pub struct ReportTaskArgs {
    /// User whose pending tasks to process
    pub user: i64,
}

pub fn run(args: ReportTaskArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(&GlobalOpts {
        user: Some(args.user),
        ..global.clone()
    })?;
    let actor = Actor::new(args.user, ws.actor.account_id);
    let engine = ws.engine()?;

    let worker = ReportWorker::new(&engine, ws.project.reports_dir())?;
    let summary = worker.run_pending(&actor)?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);
        }
        _ if global.quiet => {}
        _ => {
            println!(
                "{} done, {} failed",
                style(summary.done.len()).green(),
                style(summary.failed.len()).red()
            );
        }
    }
    Ok(())
}
