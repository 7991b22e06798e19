//! Canned views: each fixes a column set and search inputs

use std::fmt;
use std::str::FromStr;

use crate::core::filter::FilterSet;
use crate::core::view::ViewRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preset {
    /// Voters in primary 1..=3, or any primary with 0
    Prime(u8),
    Gender(String),
    AgeRange { from: Option<i64>, to: Option<i64> },
    Pollsite(i64),
}

const BASE_COLUMNS: &[&str] = &["photo", "voter_id", "fullname", "gender", "age", "phone_number"];

impl Preset {
    pub fn columns(&self) -> Vec<String> {
        let extra: &[&str] = match self {
            Preset::Prime(_) => &["prime1", "prime2", "prime3", "pollsite_id"],
            Preset::Gender(_) | Preset::AgeRange { .. } => &["pollsite_id", "electiondistrict_id"],
            Preset::Pollsite(_) => &["pollsite_id", "assemblydistrict_id", "electiondistrict_id", "address"],
        };
        BASE_COLUMNS
            .iter()
            .chain(extra.iter())
            .map(|c| c.to_string())
            .collect()
    }

    pub fn inputs(&self) -> FilterSet {
        match self {
            Preset::Prime(level) => FilterSet::new().with("prime", level.to_string()),
            Preset::Gender(gender) => FilterSet::new().with("gender", gender.clone()),
            Preset::AgeRange { from, to } => {
                let mut inputs = FilterSet::new().with("age_range", "1");
                if let Some(from) = from {
                    inputs.insert("age_from", from.to_string());
                }
                if let Some(to) = to {
                    inputs.insert("age_to", to.to_string());
                }
                inputs
            }
            Preset::Pollsite(id) => FilterSet::new().with("pollsite_id", id.to_string()),
        }
    }

    /// Point `request` at this preset; it always searches
    pub fn apply(&self, request: &mut ViewRequest) {
        request.columns = Some(self.columns());
        request.inputs.merge(&self.inputs());
        request.do_search = true;
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Prime(level) => write!(f, "prime:{}", level),
            Preset::Gender(gender) => write!(f, "gender:{}", gender),
            Preset::AgeRange { from, to } => write!(
                f,
                "age:{}-{}",
                from.map(|n| n.to_string()).unwrap_or_default(),
                to.map(|n| n.to_string()).unwrap_or_default()
            ),
            Preset::Pollsite(id) => write!(f, "pollsite:{}", id),
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    /// `prime:N`, `gender:X`, `age:FROM-TO` (either side optional), `pollsite:ID`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid preset '{}'. Use kind:value, e.g. prime:1", s))?;
        let value = value.trim();
        match kind.trim().to_lowercase().as_str() {
            "prime" => match value.parse::<u8>() {
                Ok(level) if level <= 3 => Ok(Preset::Prime(level)),
                _ => Err(format!("Invalid prime level '{}'. Use 0-3", value)),
            },
            "gender" if !value.is_empty() => Ok(Preset::Gender(value.to_uppercase())),
            "age" => {
                let (from, to) = value.split_once('-').unwrap_or((value, ""));
                let parse = |v: &str| -> Result<Option<i64>, String> {
                    let v = v.trim();
                    if v.is_empty() {
                        Ok(None)
                    } else {
                        v.parse().map(Some).map_err(|_| format!("Invalid age '{}'", v))
                    }
                };
                let (from, to) = (parse(from)?, parse(to)?);
                if from.is_none() && to.is_none() {
                    return Err("Age preset needs at least one bound, e.g. age:18-30".to_string());
                }
                Ok(Preset::AgeRange { from, to })
            }
            "pollsite" => value
                .parse()
                .map(Preset::Pollsite)
                .map_err(|_| format!("Invalid pollsite id '{}'", value)),
            _ => Err(format!(
                "Unknown preset '{}'. Use prime, gender, age or pollsite",
                kind
            )),
        }
    }
}
