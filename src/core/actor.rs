//! The authenticated actor and its visibility scope

use serde::Serialize;

use crate::core::query::VoterQuery;

/// Who is acting, and which slice of the voter source they may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: i64,
    /// Row-level visibility scope; `None` sees every account
    pub account_id: Option<i64>,
}

impl Actor {
    pub fn new(user_id: i64, account_id: Option<i64>) -> Self {
        Self {
            user_id,
            account_id,
        }
    }

    /// Base voter source with the visibility scope already applied
    pub fn scoped_query(&self) -> VoterQuery {
        let mut query = VoterQuery::new();
        if let Some(account_id) = self.account_id {
            query.where_eq("account_id", account_id);
        }
        query
    }
}
