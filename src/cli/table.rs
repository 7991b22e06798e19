//! Table formatting for CLI list commands
//!
//! Columns are supplied at runtime, so one formatter serves voter views
//! (whose columns come from a saved list or the request), saved lists, and
//! report tasks.

use chrono::{DateTime, Local, Utc};
use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;
use crate::entities::TaskStatus;

/// Widest a TSV column may grow before truncating
const MAX_TSV_WIDTH: usize = 40;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Record id (cyan)
    Id(i64),
    Text(String),
    Number(i64),
    /// `Y`/`N` flag
    Flag(bool),
    /// Report task status with color coding
    Status(TaskStatus),
    DateTime(DateTime<Utc>),
    Empty,
}

impl CellValue {
    /// Text, or `Empty` when blank
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    pub fn optional_datetime(value: Option<DateTime<Utc>>) -> Self {
        value.map(CellValue::DateTime).unwrap_or(CellValue::Empty)
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width), width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Flag(flag) => {
                let styled = if *flag {
                    style("Y").green()
                } else {
                    style("N").dim()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Status(status) => {
                let s = status.to_string();
                let styled = match status {
                    TaskStatus::Pending => style(s).dim(),
                    TaskStatus::Processing => style(s).yellow(),
                    TaskStatus::Done => style(s).green(),
                    TaskStatus::Failed => style(s).red().bold(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                format!("{:<width$}", local.format("%Y-%m-%d %H:%M"), width = width)
            }
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Flag(flag) => if *flag { "Y" } else { "N" }.to_string(),
            CellValue::Status(status) => status.to_string(),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
            CellValue::Empty => String::new(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Empty => "-".to_string(),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d %H:%M").to_string()
            }
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    fn display_width(&self) -> usize {
        match self {
            CellValue::DateTime(_) => 16,
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Headers plus rows, printed in the selected output format
pub struct TableFormatter {
    headers: Vec<String>,
    entity_name: &'static str,
    show_summary: bool,
}

impl TableFormatter {
    pub fn new(headers: Vec<String>, entity_name: &'static str) -> Self {
        Self {
            headers,
            entity_name,
            show_summary: true,
        }
    }

    /// Skip the trailing "N found" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    pub fn output(&self, rows: &[Vec<CellValue>], format: OutputFormat) {
        match format {
            OutputFormat::Csv => self.output_csv(rows),
            OutputFormat::Md => self.output_md(rows),
            OutputFormat::Id => self.output_ids(rows),
            _ => self.output_tsv(rows),
        }
    }

    /// Dynamic widths: the larger of header and content, capped
    fn calculate_widths(&self, rows: &[Vec<CellValue>]) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                header.chars().count().max(content).min(MAX_TSV_WIDTH)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[Vec<CellValue>]) {
        let widths = self.calculate_widths(rows);

        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<width$}", style(h).bold(), width = *w))
            .collect();
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let parts: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| row.get(i).unwrap_or(&CellValue::Empty).format_tsv(*w))
                .collect();
            println!("{}", parts.join(" ").trim_end());
        }

        if self.show_summary {
            println!();
            println!("{} {}(s) found.", style(rows.len()).cyan(), self.entity_name);
        }
    }

    fn output_csv(&self, rows: &[Vec<CellValue>]) {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        let _ = writer.write_record(&self.headers);
        for row in rows {
            let _ = writer.write_record(row.iter().map(|c| c.raw()));
        }
        let _ = writer.flush();
    }

    fn output_md(&self, rows: &[Vec<CellValue>]) {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().cloned());
        for row in rows {
            builder.push_record(row.iter().map(|c| c.format_md()));
        }
        println!("{}", builder.build().with(Style::markdown()));
    }

    fn output_ids(&self, rows: &[Vec<CellValue>]) {
        for row in rows {
            if let Some(first) = row.first() {
                println!("{}", first.raw());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_cell_formats() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_tsv(20).contains("Hello World"));
        assert_eq!(cell.raw(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert_eq!(CellValue::text(""), CellValue::Empty);
        assert_eq!(CellValue::Empty.format_md(), "-");
        assert_eq!(CellValue::Empty.raw(), "");
    }

    #[test]
    fn test_md_escapes_pipes() {
        assert_eq!(CellValue::Text("a|b".to_string()).format_md(), "a\\|b");
    }

    #[test]
    fn test_flag_and_status_raw() {
        assert_eq!(CellValue::Flag(true).raw(), "Y");
        assert_eq!(CellValue::Status(TaskStatus::Failed).raw(), "failed");
    }

    #[test]
    fn test_widths_follow_content() {
        let formatter = TableFormatter::new(vec!["ID".to_string(), "Name".to_string()], "voter");
        let rows = vec![vec![CellValue::Id(12345), CellValue::text("Ada Lovelace")]];
        assert_eq!(formatter.calculate_widths(&rows), vec![5, 12]);
    }
}
