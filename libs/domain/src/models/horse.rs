//! Horses and their health records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::LifecycleStatus;

string_enum! {
    /// Sanitary category, selects the plan a horse follows
    pub enum SanitaryCategory {
        A => "A",
        B => "B",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horse {
    pub id: Uuid,
    pub name: String,
    pub chip_number: Option<String>,
    pub sanitary_category: Option<SanitaryCategory>,
    pub status: LifecycleStatus,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A vaccine applied to (or scheduled for) a horse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaccinationRecord {
    pub id: Uuid,
    pub horse_id: Uuid,
    pub vaccine_type: String,
    pub date: NaiveDate,
    pub veterinarian: Option<String>,
    pub brand: Option<String>,
    pub next_due: Option<NaiveDate>,
    /// `false` for scheduled doses that have not been given yet
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DewormingRecord {
    pub id: Uuid,
    pub horse_id: Uuid,
    pub date: NaiveDate,
    pub brand: Option<String>,
    pub drugs: Option<String>,
    pub next_due: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoeingRecord {
    pub id: Uuid,
    pub horse_id: Uuid,
    pub date: NaiveDate,
    pub farrier: Option<String>,
    pub next_due: Option<NaiveDate>,
}
