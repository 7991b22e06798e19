//! `votelist templates` command - Templates registered for a report type

use miette::{miette, IntoDiagnostic, Result};

use crate::cli::table::{CellValue, TableFormatter};
use crate::cli::workspace::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::ReportTypeCode;

#[derive(clap::Args, Debug)]
pub struct TemplatesArgs {
    /// Report type code: VOTER (single voter) or VOTERS (collection)
    #[arg(default_value = "VOTERS")]
    pub report_type: String,
}

pub fn run(args: TemplatesArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;

    let code = args.report_type.trim().to_uppercase();
    let code = ReportTypeCode::from_code(&code)
        .ok_or_else(|| miette!("Unknown report type '{}'. Use VOTER or VOTERS", args.report_type))?;
    let report_type = ws
        .store
        .report_type_by_code(code.code())?
        .ok_or_else(|| miette!("Report type {} is not seeded; run `votelist init --force`", code))?;
    let templates = ws.store.templates_for_type(report_type.id)?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&templates).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&templates).into_diagnostic()?);
        }
        format => {
            let headers = ["ID", "Name", "Template"]
                .iter()
                .map(|h| h.to_string())
                .collect();
            let rows: Vec<Vec<CellValue>> = templates
                .iter()
                .map(|t| {
                    vec![
                        CellValue::Id(t.id),
                        CellValue::text(t.name.clone()),
                        CellValue::text(t.file_stem.clone()),
                    ]
                })
                .collect();
            TableFormatter::new(headers, "template").output(&rows, format);
        }
    }
    Ok(())
}
