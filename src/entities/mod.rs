//! Entity type definitions
//!
//! - [`Voter`] - a voter row with its prefetched lookup relations
//! - [`SavedList`] - a named column + filter bundle owned by one user
//! - [`Report`] / [`ReportTask`] - a printable entity-set definition and the
//!   asynchronous run that renders it

pub mod report;
pub mod saved_list;
pub mod voter;

pub use report::{
    Orientation, PaperSize, Report, ReportFields, ReportFormat, ReportTask, ReportTemplate,
    ReportType, ReportTypeCode, TaskFields, TaskStatus,
};
pub use saved_list::{ListFields, ListSummary, SavedList};
pub use voter::{RelatedRecord, Relation, Voter};
