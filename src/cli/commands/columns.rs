//! `votelist columns` command - Show the column catalog

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::table::{CellValue, TableFormatter};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::registry::ColumnRegistry;

#[derive(Serialize)]
struct ColumnInfo {
    key: &'static str,
    label: &'static str,
    relationship: Option<&'static str>,
    selectable: bool,
    filterable: bool,
}

pub fn run(global: &GlobalOpts) -> Result<()> {
    let registry = ColumnRegistry::voters();
    let columns: Vec<ColumnInfo> = registry
        .all()
        .iter()
        .map(|c| ColumnInfo {
            key: c.key,
            label: c.label,
            relationship: c.relationship.map(|r| r.as_str()),
            selectable: c.selectable,
            filterable: c.is_filterable(),
        })
        .collect();

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&columns).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&columns).into_diagnostic()?);
        }
        format => {
            let headers = ["Key", "Label", "Relationship", "Selectable", "Filter"]
                .iter()
                .map(|h| h.to_string())
                .collect();
            let rows: Vec<Vec<CellValue>> = columns
                .iter()
                .map(|c| {
                    vec![
                        CellValue::text(c.key),
                        CellValue::text(c.label),
                        CellValue::text(c.relationship.unwrap_or_default()),
                        CellValue::Flag(c.selectable),
                        CellValue::Flag(c.filterable),
                    ]
                })
                .collect();
            TableFormatter::new(headers, "column").output(&rows, format);
        }
    }
    Ok(())
}
