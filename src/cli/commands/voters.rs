//! `votelist voters` command - Browse voters through column/filter views

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{parse_filters, print_warning, split_columns, truncate_str};
use crate::cli::table::{CellValue, TableFormatter};
use crate::cli::workspace::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::engine::Engine;
use crate::core::filter::{FilterCompiler, FilterSet, OwnershipScope};
use crate::core::pagination::thousands;
use crate::core::presets::Preset;
use crate::core::view::{ViewEngine, ViewRequest, ViewResult};
use crate::entities::Voter;

/// Buildings listed by `voters buildings`
const TOP_BUILDINGS: usize = 10;

#[derive(Subcommand, Debug)]
pub enum VotersCommands {
    /// Show one page of voters
    List(ListArgs),

    /// Show a single voter with every relation
    View(ViewArgs),

    /// Buildings with the most voters
    Buildings(BuildingsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Saved list to apply
    #[arg(long, short = 'l')]
    pub list: Option<i64>,

    /// Columns for this request only (comma-separated keys)
    #[arg(long, short = 'c')]
    pub columns: Option<String>,

    /// Search input as key=value (repeatable); implies --search
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Apply the search inputs
    #[arg(long)]
    pub search: bool,

    /// Only voters flagged as mine
    #[arg(long, conflicts_with = "not_mine")]
    pub mine: bool,

    /// Only voters not flagged as mine
    #[arg(long)]
    pub not_mine: bool,

    /// Page size; remembered for the session
    #[arg(long, allow_negative_numbers = true)]
    pub per_page: Option<i64>,

    /// Page number (default 1)
    #[arg(long, short = 'p', allow_negative_numbers = true)]
    pub page: Option<i64>,

    /// Re-run the previous search of this session
    #[arg(long = "continue")]
    pub continue_search: bool,

    /// Canned view: prime:N, gender:X, age:FROM-TO, pollsite:ID
    #[arg(long)]
    pub preset: Option<Preset>,
}

#[derive(clap::Args, Debug)]
pub struct ViewArgs {
    /// Voter id
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct BuildingsArgs {
    /// Only voters in this primary (1-3), or any primary with 0
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub prime: Option<u8>,

    /// Only voters flagged as mine
    #[arg(long, conflicts_with = "not_mine")]
    pub mine: bool,

    /// Only voters not flagged as mine
    #[arg(long)]
    pub not_mine: bool,
}

pub fn run(cmd: VotersCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        VotersCommands::List(args) => run_list(args, global),
        VotersCommands::View(args) => run_view(args, global),
        VotersCommands::Buildings(args) => run_buildings(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;
    let session = ws.session();

    let inputs = parse_filters(&args.filters)?;
    let mut request = ViewRequest {
        list_id: args.list,
        columns: args.columns.as_deref().map(split_columns),
        do_search: args.search || !inputs.is_empty(),
        inputs,
        scope: OwnershipScope::from_flags(args.mine, args.not_mine),
        per_page: args.per_page,
        page: args.page,
        continue_search: args.continue_search,
    };
    if let Some(preset) = &args.preset {
        preset.apply(&mut request);
    }

    let result = ViewEngine::new(&engine, ws.actor).render(&session, request)?;
    for warning in &result.warnings {
        print_warning(warning);
    }

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&result).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for voter in &result.voters {
                println!("{}", voter.id);
            }
        }
        format => print_page(&engine, &result, format, global.quiet),
    }
    Ok(())
}

fn print_page(engine: &Engine<'_>, result: &ViewResult, format: OutputFormat, quiet: bool) {
    let headers = result.columns.iter().map(|c| c.label.clone()).collect();
    let rows: Vec<Vec<CellValue>> = result
        .voters
        .iter()
        .map(|v| result.row(engine, v).into_iter().map(CellValue::text).collect())
        .collect();

    TableFormatter::new(headers, "voter")
        .without_summary()
        .output(&rows, format);

    if quiet || matches!(format, OutputFormat::Csv | OutputFormat::Md) {
        return;
    }

    println!();
    if let Some(list) = &result.list {
        println!("{}: {}", style("List").bold(), style(&list.name).cyan());
    }
    match result.records_label() {
        Some(label) => println!("{}", label),
        None => println!("{}", style("No records").dim()),
    }
    println!(
        "{} {}  {} {}  {} {}",
        style("Total:").bold(),
        thousands(result.counts.total),
        style("Mine:").bold(),
        thousands(result.counts.mine),
        style("Not mine:").bold(),
        thousands(result.counts.not_mine),
    );
    println!(
        "{}",
        style(format!(
            "Page {} of {} ({} per page)",
            result.page, result.last_page, result.per_page
        ))
        .dim()
    );
}

fn run_view(args: ViewArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;

    let voter = match ViewEngine::new(&engine, ws.actor).voter(args.id) {
        Ok(voter) => voter,
        Err(e) if e.is_recoverable() => {
            print_warning(&e.to_string());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&voter).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&voter).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", voter.id),
        _ => print_voter(&engine, &voter),
    }
    Ok(())
}

fn print_voter(engine: &Engine<'_>, voter: &Voter) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("Voter").bold(),
        style(voter.fullname()).yellow()
    );
    println!("{}", style("─".repeat(60)).dim());
    for column in engine.registry.selectable() {
        if column.key == "photo" {
            continue;
        }
        let value = column.value(voter).unwrap_or_default();
        let value = if value.is_empty() {
            style("-".to_string()).dim()
        } else {
            style(truncate_str(&value, 60))
        };
        println!("{:<20} {}", style(column.label).bold(), value);
    }
}

fn run_buildings(args: BuildingsArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let engine = ws.engine()?;

    let mut query = ws.actor.scoped_query();
    if let Some(prime) = args.prime {
        let inputs = FilterSet::new().with("prime", prime.to_string());
        FilterCompiler::new(&engine.registry).apply(&mut query, &inputs);
    }
    OwnershipScope::from_flags(args.mine, args.not_mine).apply(&mut query);

    let buildings = ws.store.top_buildings(&query, TOP_BUILDINGS)?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&buildings).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&buildings).into_diagnostic()?);
        }
        format => {
            let rows: Vec<Vec<CellValue>> = buildings
                .iter()
                .map(|b| {
                    vec![
                        CellValue::text(b.address()),
                        CellValue::Number(i64::try_from(b.counted).unwrap_or(i64::MAX)),
                    ]
                })
                .collect();
            TableFormatter::new(vec!["Address".to_string(), "Voters".to_string()], "building")
                .output(&rows, format);
        }
    }
    Ok(())
}
