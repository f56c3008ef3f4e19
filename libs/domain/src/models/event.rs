use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    pub enum EventStatus {
        Scheduled => "scheduled",
        InProgress => "in_progress",
        Finished => "finished",
        Cancelled => "cancelled",
    }
}

string_enum! {
    pub enum RegistrationStatus {
        Confirmed => "confirmed",
        Waitlisted => "waitlisted",
        Cancelled => "cancelled",
    }
}

/// Club event (competition, clinic, outing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub status: EventStatus,
}

/// A client's registration to an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub client_id: Uuid,
    pub horse_id: Option<Uuid>,
    pub status: RegistrationStatus,
}
