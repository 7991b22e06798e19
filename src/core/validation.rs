//! Field validation for saved lists and reports
//!
//! Records are serialized to JSON and checked against schemas embedded from
//! `schemas/`. Each offending field yields one message.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use rust_embed::Embed;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::core::error::{EngineError, EngineResult, FieldError, ValidationErrors};
use crate::entities::{ListFields, ReportFields};

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

const SAVED_LIST_SCHEMA: &str = "saved_list.schema.json";
const REPORT_SCHEMA: &str = "report.schema.json";

/// Compiled record schemas
pub struct RecordValidator {
    saved_list: JsonValidator,
    report: JsonValidator,
}

impl RecordValidator {
    pub fn new() -> EngineResult<Self> {
        Ok(Self {
            saved_list: compile(SAVED_LIST_SCHEMA)?,
            report: compile(REPORT_SCHEMA)?,
        })
    }

    pub fn validate_list(&self, fields: &ListFields) -> EngineResult<()> {
        check(&self.saved_list, fields)
    }

    pub fn validate_report(&self, fields: &ReportFields) -> EngineResult<()> {
        check(&self.report, fields)
    }
}

fn compile(name: &str) -> EngineResult<JsonValidator> {
    let file = EmbeddedSchemas::get(name)
        .ok_or_else(|| EngineError::Schema(format!("missing embedded schema {}", name)))?;
    let schema: JsonValue = serde_json::from_slice(&file.data)?;
    validator_for(&schema).map_err(|e| EngineError::Schema(format!("{}: {}", name, e)))
}

fn check<T: Serialize>(validator: &JsonValidator, record: &T) -> EngineResult<()> {
    let value = serde_json::to_value(record)?;

    let mut errors: Vec<FieldError> = Vec::new();
    for error in validator.iter_errors(&value) {
        let field = field_name(&error);
        if errors.iter().any(|e| e.field == field) {
            continue;
        }
        errors.push(FieldError::new(field, describe(&error)));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors::new(errors).into())
    }
}

/// Top-level property an error points at
fn field_name(error: &JsonSchemaError) -> String {
    if let ValidationErrorKind::Required { property } = &error.kind {
        return property
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| property.to_string());
    }
    error
        .instance_path
        .as_str()
        .trim_start_matches('/')
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("record")
        .to_string()
}

fn describe(error: &JsonSchemaError) -> String {
    match &error.kind {
        ValidationErrorKind::Required { .. } => "is required".to_string(),
        ValidationErrorKind::MinLength { .. } | ValidationErrorKind::Pattern { .. } => {
            "is required".to_string()
        }
        ValidationErrorKind::MaxLength { limit } => {
            format!("must be at most {} characters", limit)
        }
        ValidationErrorKind::MinItems { .. } => "must include at least one entry".to_string(),
        ValidationErrorKind::Minimum { .. } => "must reference an existing record".to_string(),
        ValidationErrorKind::Type { kind } => format!("has the wrong type (expected {:?})", kind),
        _ => error.to_string(),
    }
}
