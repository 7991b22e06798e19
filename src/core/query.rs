//! Composable voter query
//!
//! Conditions are accumulated as an AND-conjunction of SQL fragments with
//! positional parameters, the same way the list commands build their WHERE
//! clause. Column names only ever come from the static column catalog.

use rusqlite::types::Value;

use crate::entities::Relation;

/// Columns selected for a voter row, in `voter_from_row` order
pub(crate) const VOTER_COLUMNS: &str = "id, account_id, voter_id, first_name, last_name, gender, age, \
     phone_number, photo, prime1, prime2, prime3, mine, pollsite_id, assemblydistrict_id, \
     electiondistrict_id, ethnicity_id, language_id, party_id, house_number, street_name, \
     street_suffix, city, state, zip";

/// Address columns a building is identified by
pub const BUILDING_COLUMNS: &[&str] = &[
    "state",
    "zip",
    "city",
    "street_name",
    "street_suffix",
    "house_number",
];

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    sql: String,
    params: Vec<Value>,
}

/// A voter query: scope + filter chain + eager-load set + pagination
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoterQuery {
    conditions: Vec<Condition>,
    eager: Vec<Relation>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl VoterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query that prefetches the given relations
    pub fn with(relations: impl IntoIterator<Item = Relation>) -> Self {
        Self {
            eager: relations.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn eager(&self) -> &[Relation] {
        &self.eager
    }

    /// Replace the eager-load set
    pub fn set_eager(&mut self, relations: Vec<Relation>) -> &mut Self {
        self.eager = relations;
        self
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    pub fn where_raw(&mut self, sql: impl Into<String>, params: Vec<Value>) -> &mut Self {
        self.conditions.push(Condition {
            sql: sql.into(),
            params,
        });
        self
    }

    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_raw(format!("{} = ?", column), vec![value.into()])
    }

    /// Case-insensitive substring match against a column or SQL expression
    pub fn where_like(&mut self, expr: &str, needle: &str) -> &mut Self {
        self.where_raw(
            format!("{} LIKE ?", expr),
            vec![Value::Text(format!("%{}%", needle))],
        )
    }

    pub fn where_between(&mut self, column: &str, from: i64, to: i64) -> &mut Self {
        self.where_raw(
            format!("{} BETWEEN ? AND ?", column),
            vec![Value::Integer(from), Value::Integer(to)],
        )
    }

    /// `Y`/`N` flag set
    pub fn where_flag(&mut self, column: &str) -> &mut Self {
        self.where_raw(format!("{} = 'Y'", column), vec![])
    }

    /// `Y`/`N` flag not set (NULL counts as not set)
    pub fn where_not_flag(&mut self, column: &str) -> &mut Self {
        self.where_raw(format!("COALESCE({}, 'N') != 'Y'", column), vec![])
    }

    /// Rows flagged as owned by the current actor
    pub fn where_mine(&mut self) -> &mut Self {
        self.where_flag("mine")
    }

    /// Complement of [`where_mine`](Self::where_mine)
    pub fn where_not_mine(&mut self) -> &mut Self {
        self.where_not_flag("mine")
    }

    /// Limit to one page; `page` is 1-based
    pub fn paginate(&mut self, page: u32, per_page: u32) -> &mut Self {
        let page = page.max(1) as usize;
        self.limit = Some(per_page as usize);
        self.offset = Some((page - 1) * per_page as usize);
        self
    }

    /// Same conditions with no limit/offset
    pub fn without_pagination(&self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut params = Vec::new();
        for condition in &self.conditions {
            sql.push_str(" AND ");
            sql.push_str(&condition.sql);
            params.extend(condition.params.iter().cloned());
        }
        (sql, params)
    }

    /// SELECT for one page of voter rows
    pub fn to_select_sql(&self) -> (String, Vec<Value>) {
        let (where_sql, params) = self.where_clause();
        let mut sql = format!("SELECT {} FROM voters{} ORDER BY id ASC", VOTER_COLUMNS, where_sql);
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }
        (sql, params)
    }

    /// COUNT over the filtered source, ignoring pagination
    pub fn to_count_sql(&self) -> (String, Vec<Value>) {
        let (where_sql, params) = self.where_clause();
        (format!("SELECT COUNT(*) FROM voters{}", where_sql), params)
    }

    /// GROUP BY + COUNT, largest groups first
    pub fn to_group_count_sql(&self, group_columns: &[&str], limit: usize) -> (String, Vec<Value>) {
        let (where_sql, params) = self.where_clause();
        let columns = group_columns.join(", ");
        (
            format!(
                "SELECT {cols}, COUNT(*) AS counted FROM voters{w} GROUP BY {cols} ORDER BY counted DESC LIMIT {limit}",
                cols = columns,
                w = where_sql,
                limit = limit
            ),
            params,
        )
    }
}

/// Bind a raw filter value, as an integer when it parses as one
pub fn int_or_text(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(n) => Value::Integer(n),
        Err(_) => Value::Text(trimmed.to_string()),
    }
}
