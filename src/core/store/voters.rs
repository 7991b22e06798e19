//! Voter source queries: pages, counts, relation prefetch and aggregation

use std::collections::{BTreeSet, HashMap};

use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use serde::Serialize;

use super::Store;
use crate::core::error::EngineResult;
use crate::core::query::{VoterQuery, BUILDING_COLUMNS};
use crate::entities::voter::yes_no;
use crate::entities::{RelatedRecord, Relation, Voter};

/// One building with the number of matching voters in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingCount {
    pub state: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub street_name: Option<String>,
    pub street_suffix: Option<String>,
    pub house_number: Option<String>,
    pub counted: usize,
}

impl BuildingCount {
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
}

fn flag(row: &Row<'_>, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, Option<String>>(idx)?.as_deref() == Some("Y"))
}

/// Map a row selected with `VOTER_COLUMNS`
fn voter_from_row(row: &Row<'_>) -> rusqlite::Result<Voter> {
    Ok(Voter {
        id: row.get(0)?,
        account_id: row.get(1)?,
        voter_id: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        gender: row.get(5)?,
        age: row.get(6)?,
        phone_number: row.get(7)?,
        photo: row.get(8)?,
        prime1: flag(row, 9)?,
        prime2: flag(row, 10)?,
        prime3: flag(row, 11)?,
        mine: flag(row, 12)?,
        pollsite_id: row.get(13)?,
        assemblydistrict_id: row.get(14)?,
        electiondistrict_id: row.get(15)?,
        ethnicity_id: row.get(16)?,
        language_id: row.get(17)?,
        party_id: row.get(18)?,
        house_number: row.get(19)?,
        street_name: row.get(20)?,
        street_suffix: row.get(21)?,
        city: row.get(22)?,
        state: row.get(23)?,
        zip: row.get(24)?,
        related: Default::default(),
    })
}

impl Store {
    /// Run a voter query and prefetch its eager-load set
    pub fn fetch_voters(&self, query: &VoterQuery) -> EngineResult<Vec<Voter>> {
        let (sql, params) = query.to_select_sql();
        let mut stmt = self.conn.prepare(&sql)?;
        let mut voters = stmt
            .query_map(params_from_iter(params.iter()), voter_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        self.load_relations(&mut voters, query.eager())?;
        Ok(voters)
    }

    /// Row count for the query's conditions, ignoring pagination
    pub fn count_voters(&self, query: &VoterQuery) -> EngineResult<usize> {
        let (sql, params) = query.to_count_sql();
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// One voter within the query's scope, with every relation loaded
    pub fn find_voter(&self, scope: &VoterQuery, id: i64) -> EngineResult<Option<Voter>> {
        let mut query = scope.without_pagination();
        query.where_eq("id", id).set_eager(Relation::all().to_vec());
        Ok(self.fetch_voters(&query)?.into_iter().next())
    }

    /// Prefetch relations with one `IN (...)` query per relation
    pub fn load_relations(&self, voters: &mut [Voter], relations: &[Relation]) -> EngineResult<()> {
        for relation in relations {
            let ids: BTreeSet<i64> = voters
                .iter()
                .filter_map(|v| v.foreign_id(*relation))
                .collect();
            if ids.is_empty() {
                continue;
            }

            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "SELECT id, name FROM {} WHERE id IN ({})",
                relation.table(),
                placeholders
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let records: HashMap<i64, RelatedRecord> = stmt
                .query_map(params_from_iter(ids.iter()), |row| {
                    Ok(RelatedRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .filter_map(|r| r.ok())
                .map(|r| (r.id, r))
                .collect();

            for voter in voters.iter_mut() {
                if let Some(record) = voter.foreign_id(*relation).and_then(|id| records.get(&id)) {
                    voter.related.insert(*relation, record.clone());
                }
            }
        }
        Ok(())
    }

    /// Buildings with the most matching voters
    pub fn top_buildings(&self, query: &VoterQuery, limit: usize) -> EngineResult<Vec<BuildingCount>> {
        let (sql, params) = query.to_group_count_sql(BUILDING_COLUMNS, limit);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok(BuildingCount {
                    state: row.get(0)?,
                    zip: row.get(1)?,
                    city: row.get(2)?,
                    street_name: row.get(3)?,
                    street_suffix: row.get(4)?,
                    house_number: row.get(5)?,
                    counted: usize::try_from(row.get::<_, i64>(6)?).unwrap_or(0),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Insert or replace a voter row
    pub fn upsert_voter(&self, voter: &Voter) -> EngineResult<()> {
        let values: Vec<Value> = vec![
            voter.id.into(),
            voter.account_id.into(),
            voter.voter_id.clone().into(),
            voter.first_name.clone().into(),
            voter.last_name.clone().into(),
            voter.gender.clone().into(),
            voter.age.into(),
            voter.phone_number.clone().into(),
            voter.photo.clone().into(),
            yes_no::to_flag(voter.prime1).to_string().into(),
            yes_no::to_flag(voter.prime2).to_string().into(),
            yes_no::to_flag(voter.prime3).to_string().into(),
            yes_no::to_flag(voter.mine).to_string().into(),
            voter.pollsite_id.into(),
            voter.assemblydistrict_id.into(),
            voter.electiondistrict_id.into(),
            voter.ethnicity_id.into(),
            voter.language_id.into(),
            voter.party_id.into(),
            voter.house_number.clone().into(),
            voter.street_name.clone().into(),
            voter.street_suffix.clone().into(),
            voter.city.clone().into(),
            voter.state.clone().into(),
            voter.zip.clone().into(),
        ];
        let placeholders = vec!["?"; values.len()].join(", ");
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO voters ({}) VALUES ({})",
                crate::core::query::VOTER_COLUMNS,
                placeholders
            ),
            params_from_iter(values.iter()),
        )?;
        Ok(())
    }

    /// Insert or replace a lookup row
    pub fn upsert_related(&self, relation: Relation, id: i64, name: &str) -> EngineResult<()> {
        self.conn.execute(
            &format!("INSERT OR REPLACE INTO {} (id, name) VALUES (?1, ?2)", relation.table()),
            params![id, name],
        )?;
        Ok(())
    }

    pub fn related_record(&self, relation: Relation, id: i64) -> EngineResult<Option<RelatedRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT id, name FROM {} WHERE id = ?1", relation.table()),
                params![id],
                |row| {
                    Ok(RelatedRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(id: i64, account: i64, mine: bool, pollsite: i64) -> Voter {
        Voter {
            id,
            account_id: Some(account),
            voter_id: format!("NY{:04}", id),
            first_name: format!("First{}", id),
            last_name: "Doe".to_string(),
            gender: Some(if id % 2 == 0 { "F" } else { "M" }.to_string()),
            age: Some(20 + id),
            mine,
            pollsite_id: Some(pollsite),
            house_number: Some(if id <= 3 { "10" } else { "22" }.to_string()),
            street_name: Some("Main".to_string()),
            city: Some("Bronx".to_string()),
            ..Default::default()
        }
    }

    fn seeded() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.upsert_related(Relation::Pollsite, 1, "PS 1").unwrap();
        store.upsert_related(Relation::Pollsite, 2, "PS 2").unwrap();
        for id in 1..=5 {
            store.upsert_voter(&voter(id, 1, id <= 2, 1 + id % 2)).unwrap();
        }
        store.upsert_voter(&voter(6, 2, true, 1)).unwrap();
        store
    }

    #[test]
    fn test_fetch_maps_rows_and_prefetches() {
        let store = seeded();
        let mut query = VoterQuery::with([Relation::Pollsite]);
        query.where_eq("account_id", 1).paginate(1, 2);

        let voters = store.fetch_voters(&query).unwrap();
        assert_eq!(voters.len(), 2);
        assert_eq!(voters[0].voter_id, "NY0001");
        assert!(voters[0].mine);
        assert_eq!(voters[0].related_name(Relation::Pollsite), Some("PS 2".to_string()));
        assert_eq!(voters[1].related_name(Relation::Pollsite), Some("PS 1".to_string()));
    }

    #[test]
    fn test_count_ignores_pagination() {
        let store = seeded();
        let mut query = VoterQuery::new();
        query.where_eq("account_id", 1).paginate(1, 2);
        assert_eq!(store.count_voters(&query).unwrap(), 5);
    }

    #[test]
    fn test_find_voter_respects_scope() {
        let store = seeded();
        let mut scope = VoterQuery::new();
        scope.where_eq("account_id", 1);

        assert!(store.find_voter(&scope, 3).unwrap().is_some());
        assert!(store.find_voter(&scope, 6).unwrap().is_none());
    }

    #[test]
    fn test_missing_lookup_row_falls_back_to_id() {
        let store = seeded();
        store.upsert_voter(&voter(7, 1, false, 99)).unwrap();
        let mut query = VoterQuery::with([Relation::Pollsite]);
        query.where_eq("id", 7);

        let voters = store.fetch_voters(&query).unwrap();
        assert_eq!(voters[0].related_name(Relation::Pollsite), Some("99".to_string()));
    }

    #[test]
    fn test_top_buildings_ordered_by_count() {
        let store = seeded();
        let mut query = VoterQuery::new();
        query.where_eq("account_id", 1);

        let buildings = store.top_buildings(&query, 10).unwrap();
        assert_eq!(buildings.len(), 2);
        assert_eq!(buildings[0].counted, 3);
        assert_eq!(buildings[0].address(), "10 Main Bronx");
        assert_eq!(buildings[1].counted, 2);
    }
}
