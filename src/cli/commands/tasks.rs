//! `votelist tasks` command - Report task status and completion notices

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::print_warning;
use crate::cli::table::{CellValue, TableFormatter};
use crate::cli::workspace::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dispatch::{Dispatcher, ProcessLauncher};
use crate::entities::{ReportTask, TaskStatus};

#[derive(Subcommand, Debug)]
pub enum TasksCommands {
    /// Your most recent report tasks
    List {
        /// Maximum number of tasks
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Status of one task
    Show {
        /// Task id
        id: i64,
    },

    /// Finished tasks not reported yet; each is reported once
    Notifications,
}

pub fn run(cmd: TasksCommands, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;
    let launcher = ProcessLauncher;
    let dispatcher = Dispatcher::new(&engine, &launcher, ws.config.worker(), ws.project.root());

    match cmd {
        TasksCommands::List { limit } => {
            let tasks = dispatcher.tasks(&ws.actor, limit)?;
            output_tasks(&tasks, global)
        }
        TasksCommands::Show { id } => match dispatcher.status(&ws.actor, id) {
            Ok(task) => output_task(&task, global),
            Err(e) if e.is_recoverable() => {
                print_warning(&e.to_string());
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        TasksCommands::Notifications => {
            let tasks = dispatcher.notifications(&ws.actor)?;
            if tasks.is_empty() && matches!(global.format, OutputFormat::Auto | OutputFormat::Tsv) {
                if !global.quiet {
                    println!("{}", style("No new notifications").dim());
                }
                return Ok(());
            }
            output_tasks(&tasks, global)
        }
    }
}

fn output_tasks(tasks: &[ReportTask], global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tasks).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&tasks).into_diagnostic()?);
        }
        format => {
            let headers = ["ID", "Report", "Status", "Format", "Created", "Completed", "Output"]
                .iter()
                .map(|h| h.to_string())
                .collect();
            let rows: Vec<Vec<CellValue>> = tasks
                .iter()
                .map(|t| {
                    vec![
                        CellValue::Id(t.id),
                        CellValue::Number(t.report_id),
                        CellValue::Status(t.status),
                        CellValue::text(t.output_format.to_string()),
                        CellValue::DateTime(t.created_at),
                        CellValue::optional_datetime(t.completed_at),
                        CellValue::text(t.output_path.clone().unwrap_or_default()),
                    ]
                })
                .collect();
            TableFormatter::new(headers, "task").output(&rows, format);
        }
    }
    Ok(())
}

fn output_task(task: &ReportTask, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(task).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(task).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", task.id),
        _ => {
            let status = match task.status {
                TaskStatus::Pending => style(task.status.to_string()).dim(),
                TaskStatus::Processing => style(task.status.to_string()).yellow(),
                TaskStatus::Done => style(task.status.to_string()).green(),
                TaskStatus::Failed => style(task.status.to_string()).red().bold(),
            };
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("Task").bold(), style(task.id).cyan());
            println!("{}: {}", style("Status").bold(), status);
            println!("{}", style("─".repeat(60)).dim());
            println!("{:<12} {}", style("Report").bold(), task.report_id);
            println!(
                "{:<12} {} / {} / {}",
                style("Output").bold(),
                task.output_format,
                task.paper_size,
                task.orientation
            );
            println!(
                "{:<12} {}",
                style("Created").bold(),
                task.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            if let Some(completed) = task.completed_at {
                println!(
                    "{:<12} {}",
                    style("Completed").bold(),
                    completed.format("%Y-%m-%d %H:%M:%S")
                );
            }
            if let Some(path) = &task.output_path {
                println!("{:<12} {}", style("File").bold(), path);
            }
            if let Some(error) = &task.error {
                println!("{:<12} {}", style("Error").bold(), style(error).red());
            }
        }
    }
    Ok(())
}
