//! Filter inputs and the filter compiler

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::query::VoterQuery;
use crate::core::registry::ColumnRegistry;

/// Whether a raw input value counts as "present"
///
/// Empty and whitespace-only strings are absent; `"0"` is present.
pub fn is_present_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Filter values keyed by column or filter-key
///
/// Values are kept as strings; predicates parse what they need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>", into = "BTreeMap<String, String>")]
pub struct FilterSet(BTreeMap<String, String>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Trimmed value when present
    pub fn active(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| is_present_value(v)).map(str::trim)
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: &FilterSet) -> &mut Self {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
        self
    }

    /// Drop keys the registry has no column for
    pub fn retain_known(&mut self, registry: &ColumnRegistry) -> &mut Self {
        self.0.retain(|key, _| registry.contains(key));
        self
    }

    /// Drop absent values
    pub fn without_blanks(&self) -> FilterSet {
        FilterSet(
            self.0
                .iter()
                .filter(|(_, v)| is_present_value(v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Parse a `key=value` command-line pair
    pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
        match raw.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(format!("Invalid filter '{}'. Use key=value", raw)),
        }
    }
}

impl From<BTreeMap<String, serde_json::Value>> for FilterSet {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let values = raw
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Bool(b) => if b { "1" } else { "0" }.to_string(),
                    other => other.to_string(),
                };
                Some((key, value))
            })
            .collect();
        FilterSet(values)
    }
}

impl From<FilterSet> for BTreeMap<String, String> {
    fn from(filters: FilterSet) -> Self {
        filters.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FilterSet(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Ownership toggle layered after the regular filter chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipScope {
    #[default]
    All,
    Mine,
    NotMine,
}

impl OwnershipScope {
    pub fn from_flags(mine: bool, not_mine: bool) -> Self {
        match (mine, not_mine) {
            (true, _) => OwnershipScope::Mine,
            (false, true) => OwnershipScope::NotMine,
            _ => OwnershipScope::All,
        }
    }

    pub fn apply(&self, query: &mut VoterQuery) {
        match self {
            OwnershipScope::All => {}
            OwnershipScope::Mine => {
                query.where_mine();
            }
            OwnershipScope::NotMine => {
                query.where_not_mine();
            }
        }
    }

    /// Value carried in a print payload's `mine` filter, if any
    pub fn as_filter_value(&self) -> Option<&'static str> {
        match self {
            OwnershipScope::All => None,
            OwnershipScope::Mine => Some("1"),
            OwnershipScope::NotMine => Some("0"),
        }
    }
}

/// Turns filter inputs into query conditions via the registry's predicates
pub struct FilterCompiler<'a> {
    registry: &'a ColumnRegistry,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(registry: &'a ColumnRegistry) -> Self {
        Self { registry }
    }

    /// Apply every filter-capable column whose input is present
    ///
    /// Walks the registry in its declared order; unknown input keys and
    /// columns without a predicate are skipped. Returns the keys applied.
    pub fn apply(&self, query: &mut VoterQuery, inputs: &FilterSet) -> Vec<&'static str> {
        let mut applied = Vec::new();
        for column in self.registry.all() {
            if !column.is_filterable() || !inputs.is_active(column.key) {
                continue;
            }
            column.apply_filter(query, inputs);
            applied.push(column.key);
        }
        if !applied.is_empty() {
            tracing::debug!(filters = ?applied, "applied filters");
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_present() {
        assert!(is_present_value("0"));
        assert!(is_present_value(" x "));
        assert!(!is_present_value(""));
        assert!(!is_present_value("   "));
    }

    #[test]
    fn test_merge_overrides_left() {
        let mut request = FilterSet::new().with("gender", "F").with("age", "40");
        let list = FilterSet::new().with("gender", "M");
        request.merge(&list);
        assert_eq!(request.get("gender"), Some("M"));
        assert_eq!(request.get("age"), Some("40"));
    }

    #[test]
    fn test_deserialize_coerces_scalars() {
        let filters: FilterSet =
            serde_json::from_str(r#"{"age": 40, "mine": true, "gender": "F", "party_id": null}"#)
                .unwrap();
        assert_eq!(filters.get("age"), Some("40"));
        assert_eq!(filters.get("mine"), Some("1"));
        assert_eq!(filters.get("gender"), Some("F"));
        assert_eq!(filters.get("party_id"), None);

        let json = serde_json::to_string(&filters).unwrap();
        assert_eq!(json, r#"{"age":"40","gender":"F","mine":"1"}"#);
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            FilterSet::parse_pair("gender=F").unwrap(),
            ("gender".to_string(), "F".to_string())
        );
        assert_eq!(
            FilterSet::parse_pair("fullname=a=b").unwrap(),
            ("fullname".to_string(), "a=b".to_string())
        );
        assert!(FilterSet::parse_pair("gender").is_err());
        assert!(FilterSet::parse_pair("=F").is_err());
    }

    #[test]
    fn test_without_blanks_keeps_zero() {
        let filters = FilterSet::new()
            .with("prime1", "0")
            .with("gender", "")
            .with("fullname", "  ");
        let cleaned = filters.without_blanks();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.get("prime1"), Some("0"));
    }

    #[test]
    fn test_compiler_applies_in_registry_order() {
        let registry = ColumnRegistry::voters();
        let compiler = FilterCompiler::new(&registry);
        let inputs = FilterSet::new()
            .with("pollsite_id", "3")
            .with("gender", "F")
            .with("not_a_column", "x")
            .with("photo", "yes");

        let mut query = VoterQuery::new();
        let applied = compiler.apply(&mut query, &inputs);

        assert_eq!(applied, vec!["gender", "pollsite_id"]);
        assert_eq!(query.condition_count(), 2);
    }

    #[test]
    fn test_compiler_applies_zero_valued_filter() {
        let registry = ColumnRegistry::voters();
        let compiler = FilterCompiler::new(&registry);
        let inputs = FilterSet::new().with("prime1", "0");

        let mut query = VoterQuery::new();
        let applied = compiler.apply(&mut query, &inputs);

        assert_eq!(applied, vec!["prime1"]);
        let (sql, _) = query.to_count_sql();
        assert!(sql.contains("COALESCE(prime1, 'N') != 'Y'"));
    }

    #[test]
    fn test_compiler_skips_blank_inputs() {
        let registry = ColumnRegistry::voters();
        let compiler = FilterCompiler::new(&registry);
        let inputs = FilterSet::new().with("gender", " ").with("fullname", "");

        let mut query = VoterQuery::new();
        assert!(compiler.apply(&mut query, &inputs).is_empty());
        assert_eq!(query.condition_count(), 0);
    }

    #[test]
    fn test_ownership_scope_from_flags() {
        assert_eq!(OwnershipScope::from_flags(true, false), OwnershipScope::Mine);
        assert_eq!(OwnershipScope::from_flags(false, true), OwnershipScope::NotMine);
        assert_eq!(OwnershipScope::from_flags(false, false), OwnershipScope::All);
        assert_eq!(OwnershipScope::NotMine.as_filter_value(), Some("0"));
    }
}
