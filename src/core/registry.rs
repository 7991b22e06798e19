//! Column registry: the static catalog of displayable voter fields
//!
//! Each column carries a label, an optional relationship to prefetch when
//! the column is shown, an optional filter predicate, and a value extractor
//! used by the table view and the report renderer.

use std::fmt;
use std::sync::Arc;

use crate::core::filter::FilterSet;
use crate::core::query::{int_or_text, VoterQuery};
use crate::entities::voter::yes_no;
use crate::entities::{Relation, Voter};

/// Applies one column's filter to a query, reading whatever inputs it needs
pub type Predicate = Arc<dyn Fn(&mut VoterQuery, &FilterSet) + Send + Sync>;

/// Renders a column's value for one voter
pub type Extractor = fn(&Voter) -> Option<String>;

#[derive(Clone)]
pub struct ColumnDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub relationship: Option<Relation>,
    /// Shown in column pickers; filter-only entries are not
    pub selectable: bool,
    value: Extractor,
    filter: Option<Predicate>,
}

impl ColumnDefinition {
    pub fn new(key: &'static str, label: &'static str, value: Extractor) -> Self {
        Self {
            key,
            label,
            relationship: None,
            selectable: true,
            value,
            filter: None,
        }
    }

    pub fn with_relationship(mut self, relation: Relation) -> Self {
        self.relationship = Some(relation);
        self
    }

    pub fn with_filter(
        mut self,
        filter: impl Fn(&mut VoterQuery, &FilterSet) + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn filter_only(mut self) -> Self {
        self.selectable = false;
        self
    }

    pub fn is_filterable(&self) -> bool {
        self.filter.is_some()
    }

    pub fn apply_filter(&self, query: &mut VoterQuery, inputs: &FilterSet) {
        if let Some(filter) = &self.filter {
            filter(query, inputs);
        }
    }

    pub fn value(&self, voter: &Voter) -> Option<String> {
        (self.value)(voter)
    }
}

impl fmt::Debug for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("relationship", &self.relationship)
            .field("selectable", &self.selectable)
            .field("filterable", &self.is_filterable())
            .finish()
    }
}

/// Ordered column catalog
///
/// Filter predicates are applied in declaration order.
#[derive(Debug, Clone)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDefinition>,
}

impl ColumnRegistry {
    /// Build a registry; later duplicates of a key are ignored
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        let mut unique: Vec<ColumnDefinition> = Vec::with_capacity(columns.len());
        for column in columns {
            if unique.iter().any(|c| c.key == column.key) {
                tracing::warn!(key = column.key, "duplicate column definition ignored");
                continue;
            }
            unique.push(column);
        }
        Self { columns: unique }
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn all(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Columns offered to users
    pub fn selectable(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.selectable)
    }

    /// Resolve selected keys to definitions, dropping unknown or filter-only keys
    pub fn resolve<S: AsRef<str>>(&self, keys: &[S]) -> Vec<&ColumnDefinition> {
        keys.iter()
            .filter_map(|key| {
                let key = key.as_ref();
                match self.get(key) {
                    Some(column) if column.selectable => Some(column),
                    _ => {
                        tracing::debug!(key, "skipping unknown column");
                        None
                    }
                }
            })
            .collect()
    }

    /// Keys from `keys` the registry can display, in their given order
    pub fn known_keys<S: AsRef<str>>(&self, keys: &[S]) -> Vec<String> {
        self.resolve(keys)
            .into_iter()
            .map(|c| c.key.to_string())
            .collect()
    }

    /// The voter column catalog
    pub fn voters() -> Self {
        Self::new(vec![
            ColumnDefinition::new("id", "ID", |v| Some(v.id.to_string()))
                .with_filter(eq_filter("id", "id")),
            ColumnDefinition::new("photo", "Photo", |v| v.photo.clone()),
            ColumnDefinition::new("voter_id", "Voter ID", |v| Some(v.voter_id.clone()))
                .with_filter(like_filter("voter_id", "voter_id")),
            ColumnDefinition::new("fullname", "Full Name", |v| Some(v.fullname()))
                .with_filter(like_filter("(first_name || ' ' || last_name)", "fullname")),
            ColumnDefinition::new("first_name", "First Name", |v| Some(v.first_name.clone()))
                .with_filter(like_filter("first_name", "first_name")),
            ColumnDefinition::new("last_name", "Last Name", |v| Some(v.last_name.clone()))
                .with_filter(like_filter("last_name", "last_name")),
            ColumnDefinition::new("gender", "Gender", |v| v.gender.clone())
                .with_filter(eq_filter("gender", "gender")),
            ColumnDefinition::new("age", "Age", |v| v.age.map(|a| a.to_string()))
                .with_filter(eq_filter("age", "age")),
            ColumnDefinition::new("age_range", "Age Range", |v| v.age.map(|a| a.to_string()))
                .with_filter(age_range_filter)
                .filter_only(),
            ColumnDefinition::new("phone_number", "Phone Number", |v| v.phone_number.clone())
                .with_filter(like_filter("phone_number", "phone_number")),
            ColumnDefinition::new("prime", "Prime", |v| Some(prime_level(v).to_string()))
                .with_filter(prime_filter)
                .filter_only(),
            ColumnDefinition::new("prime1", "Prime 1", |v| Some(yes_no::to_flag(v.prime1).into()))
                .with_filter(flag_filter("prime1", "prime1")),
            ColumnDefinition::new("prime2", "Prime 2", |v| Some(yes_no::to_flag(v.prime2).into()))
                .with_filter(flag_filter("prime2", "prime2")),
            ColumnDefinition::new("prime3", "Prime 3", |v| Some(yes_no::to_flag(v.prime3).into()))
                .with_filter(flag_filter("prime3", "prime3")),
            ColumnDefinition::new("mine", "Mine", |v| Some(yes_no::to_flag(v.mine).into()))
                .with_filter(flag_filter("mine", "mine")),
            ColumnDefinition::new("party_id", "Party", |v| v.related_name(Relation::Party))
                .with_relationship(Relation::Party)
                .with_filter(eq_filter("party_id", "party_id")),
            ColumnDefinition::new("ethnicity_id", "Ethnicity", |v| {
                v.related_name(Relation::Ethnicity)
            })
            .with_relationship(Relation::Ethnicity)
            .with_filter(eq_filter("ethnicity_id", "ethnicity_id")),
            ColumnDefinition::new("language_id", "Language", |v| {
                v.related_name(Relation::Language)
            })
            .with_relationship(Relation::Language)
            .with_filter(eq_filter("language_id", "language_id")),
            ColumnDefinition::new("pollsite_id", "Pollsite", |v| {
                v.related_name(Relation::Pollsite)
            })
            .with_relationship(Relation::Pollsite)
            .with_filter(eq_filter("pollsite_id", "pollsite_id")),
            ColumnDefinition::new("assemblydistrict_id", "Assembly District", |v| {
                v.related_name(Relation::AssemblyDistrict)
            })
            .with_relationship(Relation::AssemblyDistrict)
            .with_filter(eq_filter("assemblydistrict_id", "assemblydistrict_id")),
            ColumnDefinition::new("electiondistrict_id", "Election District", |v| {
                v.related_name(Relation::ElectionDistrict)
            })
            .with_relationship(Relation::ElectionDistrict)
            .with_filter(eq_filter("electiondistrict_id", "electiondistrict_id")),
            ColumnDefinition::new("address", "Address", |v| Some(v.address()))
                .with_filter(like_filter(
                    "(COALESCE(house_number, '') || ' ' || COALESCE(street_name, '') || ' ' || \
                     COALESCE(street_suffix, '') || ' ' || COALESCE(city, '') || ' ' || \
                     COALESCE(state, '') || ' ' || COALESCE(zip, ''))",
                    "address",
                )),
        ])
    }
}

/// Number of the last three primaries voted in
fn prime_level(voter: &Voter) -> usize {
    [voter.prime1, voter.prime2, voter.prime3]
        .iter()
        .filter(|p| **p)
        .count()
}

fn eq_filter(column: &'static str, input: &'static str) -> impl Fn(&mut VoterQuery, &FilterSet) {
    move |query, inputs| {
        if let Some(value) = inputs.active(input) {
            query.where_eq(column, int_or_text(value));
        }
    }
}

fn like_filter(expr: &'static str, input: &'static str) -> impl Fn(&mut VoterQuery, &FilterSet) {
    move |query, inputs| {
        if let Some(value) = inputs.active(input) {
            query.where_like(expr, value);
        }
    }
}

/// `0`/`N`/`no`/`false` select unset flags; anything else selects set flags
fn flag_filter(column: &'static str, input: &'static str) -> impl Fn(&mut VoterQuery, &FilterSet) {
    move |query, inputs| {
        if let Some(value) = inputs.active(input) {
            if is_falsy(value) {
                query.where_not_flag(column);
            } else {
                query.where_flag(column);
            }
        }
    }
}

fn is_falsy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "0" | "n" | "no" | "false"
    )
}

/// `prime=1..3` selects that primary; `prime=0` selects any primary
fn prime_filter(query: &mut VoterQuery, inputs: &FilterSet) {
    match inputs.active("prime") {
        Some("1") => {
            query.where_flag("prime1");
        }
        Some("2") => {
            query.where_flag("prime2");
        }
        Some("3") => {
            query.where_flag("prime3");
        }
        Some(_) => {
            query.where_raw("(prime1 = 'Y' OR prime2 = 'Y' OR prime3 = 'Y')", vec![]);
        }
        None => {}
    }
}

/// `age_range` gates `age_from`/`age_to`; either bound may be omitted
fn age_range_filter(query: &mut VoterQuery, inputs: &FilterSet) {
    let from = inputs.active("age_from").and_then(|v| v.parse::<i64>().ok());
    let to = inputs.active("age_to").and_then(|v| v.parse::<i64>().ok());
    match (from, to) {
        (Some(from), Some(to)) => {
            query.where_between("age", from.min(to), from.max(to));
        }
        (Some(from), None) => {
            query.where_raw("age >= ?", vec![from.into()]);
        }
        (None, Some(to)) => {
            query.where_raw("age <= ?", vec![to.into()]);
        }
        (None, None) => {}
    }
}
