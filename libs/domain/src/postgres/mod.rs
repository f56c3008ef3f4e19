//! PostgreSQL implementation of the store traits
//!
//! Queries are plain `sqlx::query` calls mapped by hand from rows. Enums are
//! stored as text and permission sets as JSONB.

use std::str::FromStr;

use common::error::DatabaseError;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{DomainError, DomainResult};

mod alerts;
mod clients;
mod events;
mod horses;
mod payments;
mod users;

/// Database handle shared by every store implementation
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Read a text column into one of the string enums.
fn text_enum<T>(row: &PgRow, column: &str) -> DomainResult<T>
where
    T: FromStr<Err = DomainError>,
{
    let raw: String = row.try_get(column)?;
    decode_text_enum(column, &raw)
}

fn optional_text_enum<T>(row: &PgRow, column: &str) -> DomainResult<Option<T>>
where
    T: FromStr<Err = DomainError>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| decode_text_enum(column, &value)).transpose()
}

/// A stored value outside the enum is a broken row, not bad client input.
fn decode_text_enum<T>(column: &str, raw: &str) -> DomainResult<T>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(|_| {
        DomainError::Database(DatabaseError::Decode(format!(
            "unexpected value '{}' in column {}",
            raw, column
        )))
    })
}
