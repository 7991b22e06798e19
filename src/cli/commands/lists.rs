//! `votelist lists` command - Saved list management

use clap::Subcommand;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{parse_filters, print_success, print_warning, split_columns};
use crate::cli::table::{CellValue, TableFormatter};
use crate::cli::workspace::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::lists::{ColumnsSaved, ListManager};
use crate::core::view::flashed_as_filters;
use crate::entities::ListFields;

#[derive(Subcommand, Debug)]
pub enum ListsCommands {
    /// List your saved lists
    List,

    /// Show one saved list
    Show {
        /// List id
        id: i64,
    },

    /// Create a list, or update one with --id
    Save(SaveArgs),

    /// Delete a saved list
    Delete {
        /// List id
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Change the columns of a list, or your default columns without --list
    Columns {
        /// Comma-separated column keys
        columns: String,

        /// List to update
        #[arg(long, short = 'l')]
        list: Option<i64>,
    },
}

#[derive(clap::Args, Debug)]
pub struct SaveArgs {
    /// List name
    #[arg(long, short = 'n')]
    pub name: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Comma-separated column keys (default: the list's or your default columns)
    #[arg(long, short = 'c')]
    pub columns: Option<String>,

    /// Filter as key=value (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Start from the search last run in this session
    #[arg(long)]
    pub from_search: bool,

    /// Existing list to update
    #[arg(long)]
    pub id: Option<i64>,

    /// Save as a new list even when --id is given
    #[arg(long)]
    pub as_new: bool,
}

pub fn run(cmd: ListsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ListsCommands::List => run_list(global),
        ListsCommands::Show { id } => run_show(id, global),
        ListsCommands::Save(args) => run_save(args, global),
        ListsCommands::Delete { id, yes } => run_delete(id, yes, global),
        ListsCommands::Columns { columns, list } => run_columns(&columns, list, global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;
    let summaries = ListManager::new(&engine, ws.actor).summaries()?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&summaries).into_diagnostic()?);
        }
        format => {
            let headers = ["ID", "Name", "Description", "Columns", "Filters"]
                .iter()
                .map(|h| h.to_string())
                .collect();
            let rows: Vec<Vec<CellValue>> = summaries
                .iter()
                .map(|s| {
                    vec![
                        CellValue::Id(s.id),
                        CellValue::text(s.name.clone()),
                        CellValue::text(s.description.clone().unwrap_or_default()),
                        CellValue::Number(s.column_count as i64),
                        CellValue::Number(s.filter_count as i64),
                    ]
                })
                .collect();
            TableFormatter::new(headers, "list").output(&rows, format);
        }
    }
    Ok(())
}

fn run_show(id: i64, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;
    let resolved = ListManager::new(&engine, ws.actor).resolve(Some(id))?;

    let Some(list) = resolved.list else {
        if let Some(warning) = &resolved.warning {
            print_warning(warning);
        }
        return Ok(());
    };

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&list).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&list).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", list.id),
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(list.id).cyan());
            println!("{}: {}", style("Name").bold(), style(&list.name).yellow());
            if let Some(description) = &list.description {
                println!("{}: {}", style("Description").bold(), description);
            }
            println!("{}", style("─".repeat(60)).dim());
            println!("{}", style("Columns").bold());
            for key in &resolved.columns {
                let label = engine.registry.get(key).map(|c| c.label).unwrap_or("");
                println!("  {:<22} {}", style(key).cyan(), style(label).dim());
            }
            if !list.filters.is_empty() {
                println!("{}", style("Filters").bold());
                for (key, value) in list.filters.iter() {
                    println!("  {:<22} {}", style(key).cyan(), value);
                }
            }
            println!();
            println!(
                "{}: {}",
                style("Created").dim(),
                list.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}

fn run_save(args: SaveArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;
    let lists = ListManager::new(&engine, ws.actor);

    let mut filters = if args.from_search {
        flashed_as_filters(ws.session().peek_flashed()?.unwrap_or_default())
    } else {
        Default::default()
    };
    filters.merge(&parse_filters(&args.filters)?);

    let columns = match args.columns.as_deref() {
        Some(raw) => split_columns(raw),
        None => lists.resolve(args.id.filter(|_| !args.as_new))?.columns,
    };

    let saved = lists.save(
        ListFields {
            name: args.name,
            description: args.description,
            columns,
            filters,
            user_id: ws.actor.user_id,
        },
        args.id,
        args.as_new,
    )?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&saved).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", saved.id),
        _ if global.quiet => {}
        _ => print_success(&format!(
            "Saved list {} ({})",
            style(&saved.name).yellow(),
            style(saved.id).cyan()
        )),
    }
    Ok(())
}

fn run_delete(id: i64, yes: bool, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;

    if !yes {
        if !Term::stdout().is_term() {
            return Err(miette!("Refusing to delete list {} without --yes", id));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete list {}?", id))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            return Ok(());
        }
    }

    let name = ListManager::new(&engine, ws.actor).delete(id)?;
    if !global.quiet {
        print_success(&format!("Deleted list {}", style(name).yellow()));
    }
    Ok(())
}

fn run_columns(raw: &str, list: Option<i64>, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;

    let columns = split_columns(raw);
    let known = engine.registry.known_keys(&columns);
    if known.is_empty() {
        return Err(miette!(
            help = "Run `votelist columns` to see the catalog",
            "None of the columns '{}' exist",
            raw
        ));
    }
    for unknown in columns.iter().filter(|c| !known.contains(c)) {
        print_warning(&format!("Ignoring unknown column '{}'", unknown));
    }

    let saved = ListManager::new(&engine, ws.actor).change_columns(list, &known)?;
    if !global.quiet {
        match saved {
            ColumnsSaved::List(id) => {
                print_success(&format!("Updated columns of list {}", style(id).cyan()))
            }
            ColumnsSaved::UserDefault => print_success("Saved your default columns"),
        }
    }
    Ok(())
}
