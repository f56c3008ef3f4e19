//! Alert creation and fan-out, plus the producers that raise alerts from
//! payment events and the scheduled rules

pub mod dispatch;
pub mod payments;
pub mod rules;

pub use dispatch::{ADMIN_ROLES, AlertDispatcher};
pub use payments::PaymentAlerts;
pub use rules::{AlertRules, JobOutcome, RuleStore, payment_priority};
