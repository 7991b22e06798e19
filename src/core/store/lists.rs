//! Saved-list persistence, always scoped to the owning user

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, parse_json_column, Store};
use crate::core::error::EngineResult;
use crate::entities::{ListFields, SavedList};

const LIST_COLUMNS: &str = "id, user_id, name, description, columns, filters, created_at";

fn list_from_row(row: &Row<'_>) -> rusqlite::Result<SavedList> {
    Ok(SavedList {
        id: row.get(0)?,
        owner_user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        columns: parse_json_column(&row.get::<_, String>(4)?),
        filters: parse_json_column(&row.get::<_, String>(5)?),
        created_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

impl Store {
    /// A list owned by `owner`; other users' lists read as absent
    pub fn find_list(&self, id: i64, owner: i64) -> EngineResult<Option<SavedList>> {
        let list = self
            .conn
            .query_row(
                &format!("SELECT {} FROM voter_lists WHERE id = ?1 AND user_id = ?2", LIST_COLUMNS),
                params![id, owner],
                list_from_row,
            )
            .optional()?;
        Ok(list)
    }

    pub fn lists_for_owner(&self, owner: i64) -> EngineResult<Vec<SavedList>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM voter_lists WHERE user_id = ?1 ORDER BY name COLLATE NOCASE, id",
            LIST_COLUMNS
        ))?;
        let lists = stmt
            .query_map(params![owner], list_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    pub fn insert_list(&self, fields: &ListFields) -> EngineResult<SavedList> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO voter_lists (user_id, name, description, columns, filters, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                fields.user_id,
                fields.name,
                fields.description,
                serde_json::to_string(&fields.columns)?,
                serde_json::to_string(&fields.filters)?,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find_list(id, fields.user_id)?
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    /// Overwrite a list in place; false when absent or not owned
    pub fn update_list(&self, id: i64, fields: &ListFields) -> EngineResult<bool> {
        let changed = self.conn.execute(
            "UPDATE voter_lists
             SET name = ?1, description = ?2, columns = ?3, filters = ?4, updated_at = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                fields.name,
                fields.description,
                serde_json::to_string(&fields.columns)?,
                serde_json::to_string(&fields.filters)?,
                Utc::now().to_rfc3339(),
                id,
                fields.user_id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn update_list_columns(&self, id: i64, owner: i64, columns: &[String]) -> EngineResult<bool> {
        let changed = self.conn.execute(
            "UPDATE voter_lists SET columns = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![serde_json::to_string(columns)?, Utc::now().to_rfc3339(), id, owner],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_list(&self, id: i64, owner: i64) -> EngineResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM voter_lists WHERE id = ?1 AND user_id = ?2",
            params![id, owner],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::FilterSet;

    fn fields(name: &str, owner: i64) -> ListFields {
        ListFields {
            name: name.to_string(),
            description: Some("desc".to_string()),
            columns: vec!["voter_id".to_string(), "age".to_string()],
            filters: FilterSet::new().with("gender", "F"),
            user_id: owner,
        }
    }

    #[test]
    fn test_insert_and_find_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let list = store.insert_list(&fields("Seniors", 1)).unwrap();

        let found = store.find_list(list.id, 1).unwrap().unwrap();
        assert_eq!(found, list);
        assert_eq!(found.columns, vec!["voter_id", "age"]);
        assert_eq!(found.filters.get("gender"), Some("F"));
    }

    #[test]
    fn test_other_owner_cannot_see_or_change() {
        let store = Store::open_in_memory().unwrap();
        let list = store.insert_list(&fields("Mine", 1)).unwrap();

        assert!(store.find_list(list.id, 2).unwrap().is_none());
        assert!(!store.update_list(list.id, &fields("Stolen", 2)).unwrap());
        assert!(!store.delete_list(list.id, 2).unwrap());
        assert_eq!(store.find_list(list.id, 1).unwrap().unwrap().name, "Mine");
    }

    #[test]
    fn test_lists_for_owner_sorted_by_name() {
        let store = Store::open_in_memory().unwrap();
        store.insert_list(&fields("beta", 1)).unwrap();
        store.insert_list(&fields("Alpha", 1)).unwrap();
        store.insert_list(&fields("gamma", 2)).unwrap();

        let names: Vec<_> = store
            .lists_for_owner(1)
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "beta"]);
    }

    #[test]
    fn test_update_columns_only() {
        let store = Store::open_in_memory().unwrap();
        let list = store.insert_list(&fields("Cols", 1)).unwrap();

        assert!(store
            .update_list_columns(list.id, 1, &["fullname".to_string()])
            .unwrap());
        let found = store.find_list(list.id, 1).unwrap().unwrap();
        assert_eq!(found.columns, vec!["fullname"]);
        assert_eq!(found.filters.get("gender"), Some("F"));
    }
}
