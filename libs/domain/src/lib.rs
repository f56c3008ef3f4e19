//! Domain core for the Haras club backend
//!
//! This crate holds everything the services share: the entity models, the
//! granular permission model and its guard, user administration rules, the
//! sanitary plan catalog with its reconciliation engine, and alert dispatch
//! together with the rule jobs that feed it. Persistence goes through the
//! store traits in [`store`]; [`postgres::Database`] implements them on top
//! of `sqlx`.

#[macro_use]
mod macros;

pub mod alerts;
pub mod error;
pub mod guard;
pub mod models;
pub mod password;
pub mod permissions;
pub mod postgres;
pub mod sanitary;
pub mod store;
pub mod users;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use error::{DomainError, DomainResult};
