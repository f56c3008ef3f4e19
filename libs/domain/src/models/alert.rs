//! Alert model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

string_enum! {
    pub enum AlertType {
        Vaccine => "vaccine",
        Shoeing => "shoeing",
        Payment => "payment",
        Event => "event",
        Birthday => "birthday",
        Contract => "contract",
        Stock => "stock",
        Task => "task",
        Maintenance => "maintenance",
        Veterinary => "veterinary",
        Other => "other",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum AlertPriority {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// Persisted alert
///
/// `user_id` is `None` for broadcast alerts, which no user listing returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub event_date: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub actions: Option<Value>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Alert creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    pub user_id: Option<Uuid>,
    pub alert_type: AlertType,
    #[serde(default)]
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub event_date: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub actions: Option<Value>,
    pub metadata: Option<Value>,
}

impl NewAlert {
    pub fn new(
        alert_type: AlertType,
        priority: AlertPriority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: None,
            alert_type,
            priority,
            title: title.into(),
            message: message.into(),
            event_date: None,
            expires_at: None,
            related_entity_type: None,
            related_entity_id: None,
            actions: None,
            metadata: None,
        }
    }

    pub fn related_to(mut self, entity_type: &str, id: Uuid) -> Self {
        self.related_entity_type = Some(entity_type.to_string());
        self.related_entity_id = Some(id);
        self
    }

    pub fn with_event_date(mut self, at: DateTime<Utc>) -> Self {
        self.event_date = Some(at);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Buttons the client renders under the alert
    pub fn with_actions(mut self, actions: Value) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Copy addressed to a single recipient
    pub fn for_user(&self, user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..self.clone()
        }
    }
}
