//! Report and report-task entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::filter::FilterSet;

/// Lifecycle of a report task
///
/// `Pending` is set on creation; every later transition belongs to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl TaskStatus {
    /// Two-letter code stored in the database
    pub fn code(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PN",
            TaskStatus::Processing => "PR",
            TaskStatus::Done => "DN",
            TaskStatus::Failed => "FL",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PN" => Some(TaskStatus::Pending),
            "PR" => Some(TaskStatus::Processing),
            "DN" => Some(TaskStatus::Done),
            "FL" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }

    /// Whether the worker may move a task from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Done)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Landscape => write!(f, "landscape"),
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portrait" | "p" => Ok(Orientation::Portrait),
            "landscape" | "l" => Ok(Orientation::Landscape),
            _ => Err(format!("Invalid orientation: {}. Use portrait or landscape", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    Letter,
    Legal,
    A4,
}

impl PaperSize {
    /// CSS `@page size` keyword
    pub fn css_name(&self) -> &'static str {
        match self {
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
            PaperSize::A4 => "A4",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSize::Letter => write!(f, "letter"),
            PaperSize::Legal => write!(f, "legal"),
            PaperSize::A4 => write!(f, "a4"),
        }
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "letter" => Ok(PaperSize::Letter),
            "legal" => Ok(PaperSize::Legal),
            "a4" => Ok(PaperSize::A4),
            _ => Err(format!("Invalid paper size: {}. Use letter, legal or a4", s)),
        }
    }
}

/// File format produced by the report worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Markdown,
    Html,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Markdown => "md",
            ReportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Csv => write!(f, "csv"),
            ReportFormat::Markdown => write!(f, "markdown"),
            ReportFormat::Html => write!(f, "html"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "md" | "markdown" => Ok(ReportFormat::Markdown),
            "html" => Ok(ReportFormat::Html),
            _ => Err(format!("Invalid output format: {}. Use csv, markdown or html", s)),
        }
    }
}

/// Report type codes the renderer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportTypeCode {
    /// One voter
    #[serde(rename = "VOTER")]
    Single,
    /// A filtered collection of voters
    #[serde(rename = "VOTERS")]
    Collection,
}

impl ReportTypeCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReportTypeCode::Single => "VOTER",
            ReportTypeCode::Collection => "VOTERS",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "VOTER" => Some(ReportTypeCode::Single),
            "VOTERS" => Some(ReportTypeCode::Collection),
            _ => None,
        }
    }
}

impl fmt::Display for ReportTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportType {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// A printable template registered for a report type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: i64,
    pub report_type_id: i64,
    pub name: String,
    /// Embedded template stem, e.g. `voters-roster` for `voters-roster.md.tera`
    pub file_stem: String,
}

/// The entity-set definition a task prints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub columns: Vec<String>,
    pub filters: FilterSet,
    pub report_type_id: i64,
    pub owner_user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields validated before a report is persisted
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportFields {
    pub name: String,
    pub title: String,
    pub columns: Vec<String>,
    pub filters: FilterSet,
    pub report_type_id: i64,
    pub user_id: i64,
}

/// Output options for the task attached to a report
#[derive(Debug, Clone, Default)]
pub struct TaskFields {
    pub orientation: Orientation,
    pub paper_size: PaperSize,
    pub output_format: ReportFormat,
    pub template_id: Option<i64>,
}

/// Durable record of one asynchronous report run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTask {
    pub id: i64,
    pub report_id: i64,
    pub status: TaskStatus,
    pub orientation: Orientation,
    pub paper_size: PaperSize,
    pub output_format: ReportFormat,
    pub owner_user_id: i64,
    #[serde(default)]
    pub template_id: Option<i64>,
    /// Launch directive bound to the owner, as handed to the worker launcher
    pub command: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notified_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_codes() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Processing,
            TaskStatus::Done,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(TaskStatus::from_code("XX"), None);
    }

    #[test]
    fn test_task_status_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Processing));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Done));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Done));
        assert!(!TaskStatus::Done.can_transition_to(TaskStatus::Processing));
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
    }

    #[test]
    fn test_output_options_parse() {
        assert_eq!("Landscape".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert_eq!("a4".parse::<PaperSize>().unwrap(), PaperSize::A4);
        assert_eq!("md".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert!("pdf".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_report_type_codes() {
        assert_eq!(ReportTypeCode::Single.code(), "VOTER");
        assert_eq!(ReportTypeCode::from_code("VOTERS"), Some(ReportTypeCode::Collection));
        assert_eq!(ReportTypeCode::from_code("NOPE"), None);
    }
}
