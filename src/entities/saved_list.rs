//! Saved list entity: a named, owner-scoped column + filter bundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::filter::FilterSet;

/// A saved voter list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedList {
    pub id: i64,
    pub owner_user_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered column keys
    pub columns: Vec<String>,
    pub filters: FilterSet,
    pub created_at: DateTime<Utc>,
}

/// Fields written on create/update
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListFields {
    pub name: String,
    pub description: Option<String>,
    pub columns: Vec<String>,
    pub filters: FilterSet,
    pub user_id: i64,
}

/// Entry of the cached "list of lists"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub column_count: usize,
    pub filter_count: usize,
}

impl From<&SavedList> for ListSummary {
    fn from(list: &SavedList) -> Self {
        Self {
            id: list.id,
            name: list.name.clone(),
            description: list.description.clone(),
            column_count: list.columns.len(),
            filter_count: list.filters.len(),
        }
    }
}
