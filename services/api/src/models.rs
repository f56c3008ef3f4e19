//! API models for request and response payloads

use domain::models::SanitaryCategory;
use domain::sanitary::CategoryPlan;
use domain::store::Pagination;
use serde::{Deserialize, Serialize};

/// Query for `GET /users`
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub active_only: Option<bool>,
}

impl ListUsersQuery {
    pub fn page(&self) -> Pagination {
        Pagination::new(self.skip, self.limit)
    }

    pub fn active_only(&self) -> bool {
        self.active_only.unwrap_or(true)
    }
}

/// Query for `GET /users/search`
#[derive(Debug, Deserialize)]
pub struct SearchUsersQuery {
    pub q: String,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchUsersQuery {
    pub fn page(&self) -> Pagination {
        Pagination::new(self.skip, self.limit)
    }
}

/// Optional plan year, defaulting to the current one
#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

/// Query for `GET /alerts`
#[derive(Debug, Default, Deserialize)]
pub struct ListAlertsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ListAlertsQuery {
    pub fn page(&self) -> Pagination {
        Pagination::new(self.skip, self.limit)
    }
}

/// Response for `GET /alerts/unread/count`
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Response for bulk updates
#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

/// One category of the sanitary catalog in force for a year
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// Year of the catalog version that applies
    pub version_year: i32,
    pub resolution: String,
    pub category: SanitaryCategory,
    pub annual_cost: i64,
    pub total_activities: usize,
    #[serde(flatten)]
    pub plan: CategoryPlan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_users_query_defaults() {
        let query: ListUsersQuery = serde_json::from_str("{}").unwrap();
        assert!(query.active_only());
        assert_eq!(query.page(), Pagination::default());
    }

    #[test]
    fn test_list_alerts_query_defaults() {
        let query: ListAlertsQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.unread_only);
        assert_eq!(query.page(), Pagination::default());
    }
}
