use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::LifecycleStatus;

/// Club client (horse owner or rider)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Login account, when the client has one
    pub user_id: Option<Uuid>,
    pub status: LifecycleStatus,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
