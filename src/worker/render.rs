//! Report rendering: CSV through the csv crate, Markdown and HTML through
//! embedded tera templates

use chrono::{DateTime, Utc};
use rust_embed::Embed;
use serde::Serialize;
use tera::Tera;

use crate::core::error::{EngineError, EngineResult};
use crate::entities::{Orientation, PaperSize, ReportFormat};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// One labelled value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub label: String,
    pub value: String,
}

/// Everything a report template sees
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub name: String,
    pub title: String,
    pub labels: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub orientation: Orientation,
    pub paper_size: PaperSize,
    pub generated_at: DateTime<Utc>,
}

impl ReportDocument {
    /// Rows as label/value pairs, for card layouts
    pub fn records(&self) -> Vec<Vec<Cell>> {
        self.rows
            .iter()
            .map(|row| {
                self.labels
                    .iter()
                    .zip(row)
                    .map(|(label, value)| Cell {
                        label: label.clone(),
                        value: value.clone(),
                    })
                    .collect()
            })
            .collect()
    }
}

pub struct ReportRenderer {
    tera: Tera,
}

impl ReportRenderer {
    pub fn new() -> EngineResult<Self> {
        let mut tera = Tera::default();
        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| EngineError::Template(e.to_string()))?;
                }
            }
        }
        Ok(Self { tera })
    }

    /// Names of the embedded templates
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    pub fn render(&self, doc: &ReportDocument, format: ReportFormat, stem: &str) -> EngineResult<String> {
        match format {
            ReportFormat::Csv => render_csv(doc),
            ReportFormat::Markdown => {
                let escaped = ReportDocument {
                    rows: doc
                        .rows
                        .iter()
                        .map(|row| row.iter().map(|v| escape_markdown_cell(v)).collect())
                        .collect(),
                    ..doc.clone()
                };
                self.render_template(&escaped, &format!("{}.md.tera", stem))
            }
            ReportFormat::Html => self.render_template(doc, &format!("{}.html.tera", stem)),
        }
    }

    fn render_template(&self, doc: &ReportDocument, name: &str) -> EngineResult<String> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(EngineError::Template(format!("template '{}' is not embedded", name)));
        }

        let mut context = tera::Context::new();
        context.insert("name", &doc.name);
        context.insert("title", &doc.title);
        context.insert("labels", &doc.labels);
        context.insert("rows", &doc.rows);
        context.insert("records", &doc.records());
        context.insert("count", &doc.rows.len());
        context.insert("orientation", &doc.orientation.to_string());
        context.insert("paper_size", doc.paper_size.css_name());
        context.insert("generated", &doc.generated_at.format("%Y-%m-%d %H:%M UTC").to_string());

        self.tera
            .render(name, &context)
            .map_err(|e| EngineError::Template(e.to_string()))
    }
}

fn render_csv(doc: &ReportDocument) -> EngineResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| EngineError::Template(format!("CSV output: {}", e));

    writer.write_record(&doc.labels).map_err(csv_err)?;
    for row in &doc.rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| EngineError::Template(format!("CSV output: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| EngineError::Template(e.to_string()))
}

fn escape_markdown_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
