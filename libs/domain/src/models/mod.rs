//! Domain entities

pub mod alert;
pub mod client;
pub mod event;
pub mod horse;
pub mod lifecycle;
pub mod payment;
pub mod user;

// Re-export for convenience
pub use alert::{Alert, AlertPriority, AlertType, NewAlert};
pub use client::Client;
pub use event::{Event, EventStatus, Registration, RegistrationStatus};
pub use horse::{DewormingRecord, Horse, SanitaryCategory, ShoeingRecord, VaccinationRecord};
pub use lifecycle::LifecycleStatus;
pub use payment::{Payment, PaymentStatus};
pub use user::{NewUser, Role, UpdateUser, User, UserInsert, UserPatch};
