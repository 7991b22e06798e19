//! `votelist import` command - Load voters and lookup tables from CSV

use console::style;
use csv::ReaderBuilder;
use miette::{miette, IntoDiagnostic, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cli::helpers::{print_success, print_warning};
use crate::cli::workspace::Workspace;
use crate::cli::GlobalOpts;
use crate::entities::{RelatedRecord, Relation, Voter};

/// What a CSV file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTarget {
    Voters,
    Lookup(Relation),
}

impl FromStr for ImportTarget {
    type Err = String;

    /// `voters`, or a relation by name (`pollsite`) or table (`pollsites`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        if key == "voters" || key == "voter" {
            return Ok(ImportTarget::Voters);
        }
        key.parse::<Relation>()
            .ok()
            .or_else(|| Relation::from_table(&key))
            .map(ImportTarget::Lookup)
            .ok_or_else(|| {
                let names: Vec<&str> = Relation::all().iter().map(|r| r.table()).collect();
                format!("Unknown table '{}'. Use voters or one of: {}", s, names.join(", "))
            })
    }
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Table to load: voters, pollsites, assembly_districts, ...
    #[arg(value_parser = ImportTarget::from_str)]
    pub table: ImportTarget,

    /// CSV file with a header row
    pub file: PathBuf,

    /// Continue importing after bad rows (default: stop on first error)
    #[arg(long)]
    pub skip_errors: bool,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let file = File::open(&args.file)
        .map_err(|e| miette!("Cannot open {}: {}", args.file.display(), e))?;
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let tx = ws.store.connection().unchecked_transaction().into_diagnostic()?;
    let mut imported = 0usize;
    let mut skipped = 0usize;

    match args.table {
        ImportTarget::Voters => {
            for (line, record) in reader.deserialize::<Voter>().enumerate() {
                let outcome = record
                    .map_err(|e| e.to_string())
                    .and_then(|voter| ws.store.upsert_voter(&voter).map_err(|e| e.to_string()));
                tally(outcome, line, args.skip_errors, &mut imported, &mut skipped)?;
            }
        }
        ImportTarget::Lookup(relation) => {
            for (line, record) in reader.deserialize::<RelatedRecord>().enumerate() {
                let outcome = record.map_err(|e| e.to_string()).and_then(|row| {
                    ws.store
                        .upsert_related(relation, row.id, &row.name)
                        .map_err(|e| e.to_string())
                });
                tally(outcome, line, args.skip_errors, &mut imported, &mut skipped)?;
            }
        }
    }

    tx.commit().into_diagnostic()?;
    tracing::info!(imported, skipped, file = %args.file.display(), "import finished");

    if !global.quiet {
        print_success(&format!(
            "Imported {} row(s) into {}",
            style(imported).cyan(),
            style(table_name(args.table)).cyan()
        ));
        if skipped > 0 {
            print_warning(&format!("{} row(s) skipped", skipped));
        }
    }
    Ok(())
}

fn tally(
    outcome: std::result::Result<(), String>,
    line: usize,
    skip_errors: bool,
    imported: &mut usize,
    skipped: &mut usize,
) -> Result<()> {
    match outcome {
        Ok(()) => {
            *imported += 1;
            Ok(())
        }
        // header is line 1
        Err(e) if skip_errors => {
            print_warning(&format!("row {}: {}", line + 2, e));
            *skipped += 1;
            Ok(())
        }
        Err(e) => Err(miette!("row {}: {}", line + 2, e)),
    }
}

fn table_name(target: ImportTarget) -> &'static str {
    match target {
        ImportTarget::Voters => "voters",
        ImportTarget::Lookup(relation) => relation.table(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_target_names() {
        assert_eq!("voters".parse::<ImportTarget>().unwrap(), ImportTarget::Voters);
        assert_eq!(
            "pollsites".parse::<ImportTarget>().unwrap(),
            ImportTarget::Lookup(Relation::Pollsite)
        );
        assert_eq!(
            "party".parse::<ImportTarget>().unwrap(),
            ImportTarget::Lookup(Relation::Party)
        );
        assert!("precincts".parse::<ImportTarget>().is_err());
    }
}
