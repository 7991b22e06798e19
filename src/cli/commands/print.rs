//! `votelist print` command - Queue a report of one voter or the current search

use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{parse_filters, print_success, print_warning, split_columns};
use crate::cli::workspace::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dispatch::{Dispatcher, PrintMode, PrintRequest, ProcessLauncher, SubmitOutcome};
use crate::core::filter::OwnershipScope;
use crate::entities::{Orientation, PaperSize, ReportFormat, TaskFields};

#[derive(clap::Args, Debug)]
pub struct PrintArgs {
    /// Report name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Title printed on the report
    #[arg(long, short = 't')]
    pub title: String,

    /// Print this voter only
    #[arg(long, conflicts_with_all = ["list", "filters", "mine", "not_mine"])]
    pub voter: Option<i64>,

    /// Saved list whose filters apply
    #[arg(long, short = 'l')]
    pub list: Option<i64>,

    /// Search input as key=value (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Only voters flagged as mine
    #[arg(long, conflicts_with = "not_mine")]
    pub mine: bool,

    /// Only voters not flagged as mine
    #[arg(long)]
    pub not_mine: bool,

    /// Comma-separated column keys (default: the list's or your default columns)
    #[arg(long, short = 'c')]
    pub columns: Option<String>,

    #[arg(long, default_value = "portrait")]
    pub orientation: Orientation,

    #[arg(long, default_value = "letter")]
    pub paper: PaperSize,

    /// Rendered file format: csv, markdown or html
    #[arg(long, default_value = "csv")]
    pub output: ReportFormat,

    /// Template id (default: the first template of the report type)
    #[arg(long)]
    pub template: Option<i64>,
}

pub fn run(args: PrintArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;
    let launcher = ProcessLauncher;
    let dispatcher = Dispatcher::new(&engine, &launcher, ws.config.worker(), ws.project.root());

    let request = PrintRequest {
        mode: match args.voter {
            Some(id) => PrintMode::Single(id),
            None => PrintMode::Collection,
        },
        list_id: args.list,
        inputs: parse_filters(&args.filters)?,
        scope: OwnershipScope::from_flags(args.mine, args.not_mine),
        columns: args.columns.as_deref().map(split_columns),
        name: args.name,
        title: args.title,
        task: TaskFields {
            orientation: args.orientation,
            paper_size: args.paper,
            output_format: args.output,
            template_id: args.template,
        },
    };

    let result = dispatcher.print(&ws.actor, &request);
    let outcome = SubmitOutcome::from_result(&result);

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome).into_diagnostic()?);
            outcome_status(&outcome)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&outcome).into_diagnostic()?);
            outcome_status(&outcome)
        }
        OutputFormat::Id => {
            let submission = result?;
            println!("{}", submission.task.id);
            Ok(())
        }
        _ => match result {
            Ok(submission) => {
                if let Some(error) = &submission.launch_error {
                    print_warning(&format!(
                        "Could not start the report worker ({}); run `votelist report-task {}` to process it",
                        error, ws.actor.user_id
                    ));
                }
                if !global.quiet {
                    print_success(&format!(
                        "Your request has been queued as task {}",
                        style(submission.task.id).cyan()
                    ));
                    println!(
                        "   Check progress with {}",
                        style(format!("votelist tasks show {}", submission.task.id)).yellow()
                    );
                }
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
    }
}

/// Exit status for a machine-readable outcome already printed
fn outcome_status(outcome: &SubmitOutcome) -> Result<()> {
    if outcome.success {
        Ok(())
    } else {
        Err(miette!("{}", outcome.errors.join("; ")))
    }
}
