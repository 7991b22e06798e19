//! Engine error taxonomy
//!
//! Unknown column or filter keys never surface here: they are dropped where
//! they are looked up.

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// A single field-level validation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collected validation failures for one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// True when at least one message targets `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Messages flattened for the `{success, errors}` outcome
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

/// Errors raised by the view and report engine
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("The requested {what} ({id}) does not exist or you don't have permission to work with it")]
    #[diagnostic(
        code(votelist::not_found),
        help("Contact your system administrator for more information")
    )]
    NotFound { what: &'static str, id: i64 },

    #[error("Validation failed: {0}")]
    #[diagnostic(code(votelist::validation))]
    Validation(ValidationErrors),

    #[error("Database error: {0}")]
    #[diagnostic(code(votelist::database))]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(votelist::serialization))]
    Serialization(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    #[diagnostic(code(votelist::schema))]
    Schema(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(votelist::template))]
    Template(String),

    #[error("Worker launch failed: {0}")]
    #[diagnostic(code(votelist::launch))]
    Launch(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(votelist::io))]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn not_found(what: &'static str, id: i64) -> Self {
        EngineError::NotFound { what, id }
    }

    /// Not-found conditions are recoverable: callers fall back to a default view
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::NotFound { .. } | EngineError::Validation(_))
    }
}

impl From<ValidationErrors> for EngineError {
    fn from(errors: ValidationErrors) -> Self {
        EngineError::Validation(errors)
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display() {
        let errors = ValidationErrors::new(vec![
            FieldError::new("name", "is required"),
            FieldError::new("columns", "must not be empty"),
        ]);
        assert_eq!(errors.to_string(), "name: is required; columns: must not be empty");
        assert!(errors.has_field("name"));
        assert!(!errors.has_field("title"));
    }

    #[test]
    fn test_not_found_is_recoverable() {
        assert!(EngineError::not_found("list", 3).is_recoverable());
        assert!(!EngineError::Launch("boom".to_string()).is_recoverable());
    }
}
