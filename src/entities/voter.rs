//! Voter entity and the lookup relations it can prefetch

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Related lookup tables reachable from a voter row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Pollsite,
    AssemblyDistrict,
    ElectionDistrict,
    Ethnicity,
    Language,
    Party,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Pollsite => "pollsite",
            Relation::AssemblyDistrict => "assemblydistrict",
            Relation::ElectionDistrict => "electiondistrict",
            Relation::Ethnicity => "ethnicity",
            Relation::Language => "language",
            Relation::Party => "party",
        }
    }

    /// Lookup table holding `(id, name)` rows
    pub fn table(&self) -> &'static str {
        match self {
            Relation::Pollsite => "pollsites",
            Relation::AssemblyDistrict => "assembly_districts",
            Relation::ElectionDistrict => "election_districts",
            Relation::Ethnicity => "ethnicities",
            Relation::Language => "languages",
            Relation::Party => "parties",
        }
    }

    /// Foreign key column on the voters table
    pub fn foreign_key(&self) -> &'static str {
        match self {
            Relation::Pollsite => "pollsite_id",
            Relation::AssemblyDistrict => "assemblydistrict_id",
            Relation::ElectionDistrict => "electiondistrict_id",
            Relation::Ethnicity => "ethnicity_id",
            Relation::Language => "language_id",
            Relation::Party => "party_id",
        }
    }

    pub fn all() -> &'static [Relation] {
        &[
            Relation::Pollsite,
            Relation::AssemblyDistrict,
            Relation::ElectionDistrict,
            Relation::Ethnicity,
            Relation::Language,
            Relation::Party,
        ]
    }

    /// Resolve a lookup table name (as used by `import`)
    pub fn from_table(table: &str) -> Option<Relation> {
        Relation::all().iter().copied().find(|r| r.table() == table)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown relationship: {}", s))
    }
}

/// A prefetched lookup row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRecord {
    pub id: i64,
    pub name: String,
}

/// A voter row as seen through the visibility scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Voter {
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,

    pub voter_id: String,
    pub first_name: String,
    pub last_name: String,

    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,

    /// Voted in one/two/three of the last primaries
    #[serde(default, with = "yes_no")]
    pub prime1: bool,
    #[serde(default, with = "yes_no")]
    pub prime2: bool,
    #[serde(default, with = "yes_no")]
    pub prime3: bool,

    /// Flagged as belonging to the current operator's own roster
    #[serde(default, with = "yes_no")]
    pub mine: bool,

    #[serde(default)]
    pub pollsite_id: Option<i64>,
    #[serde(default)]
    pub assemblydistrict_id: Option<i64>,
    #[serde(default)]
    pub electiondistrict_id: Option<i64>,
    #[serde(default)]
    pub ethnicity_id: Option<i64>,
    #[serde(default)]
    pub language_id: Option<i64>,
    #[serde(default)]
    pub party_id: Option<i64>,

    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub street_suffix: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,

    /// Relations loaded by the eager-load plan
    #[serde(default, skip_deserializing, skip_serializing_if = "BTreeMap::is_empty")]
    pub related: BTreeMap<Relation, RelatedRecord>,
}

impl Voter {
    pub fn fullname(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn address(&self) -> String {
        [
            self.house_number.as_deref(),
            self.street_name.as_deref(),
            self.street_suffix.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.zip.as_deref(),
        ]
        .iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Foreign key value for a relation
    pub fn foreign_id(&self, relation: Relation) -> Option<i64> {
        match relation {
            Relation::Pollsite => self.pollsite_id,
            Relation::AssemblyDistrict => self.assemblydistrict_id,
            Relation::ElectionDistrict => self.electiondistrict_id,
            Relation::Ethnicity => self.ethnicity_id,
            Relation::Language => self.language_id,
            Relation::Party => self.party_id,
        }
    }

    /// Name of a loaded relation, falling back to the raw id
    pub fn related_name(&self, relation: Relation) -> Option<String> {
        match self.related.get(&relation) {
            Some(record) => Some(record.name.clone()),
            None => self.foreign_id(relation).map(|id| id.to_string()),
        }
    }
}

/// `Y`/`N` flag columns
pub(crate) mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Y" } else { "N" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(matches!(
            raw.as_deref().map(|s| s.trim().to_ascii_uppercase()).as_deref(),
            Some("Y") | Some("YES") | Some("1") | Some("TRUE")
        ))
    }

    pub fn to_flag(value: bool) -> &'static str {
        if value {
            "Y"
        } else {
            "N"
        }
    }
}
