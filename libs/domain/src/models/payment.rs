use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

impl PaymentStatus {
    /// Still owed by the client
    pub fn is_outstanding(self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Overdue)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub concept: String,
    pub amount: f64,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
    pub paid_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Whole days elapsed since the due date, zero when not yet due
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days().max(0)
    }
}
