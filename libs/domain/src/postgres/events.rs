use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{Database, text_enum};
use crate::error::DomainResult;
use crate::models::{Event, Registration};
use crate::store::EventStore;

impl EventStore for Database {
    async fn events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Event>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, starts_at, ends_at, location, status
            FROM events
            WHERE status = 'scheduled' AND starts_at >= $1 AND starts_at < $2
            ORDER BY starts_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DomainResult<Event> {
                Ok(Event {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    starts_at: row.try_get("starts_at")?,
                    ends_at: row.try_get("ends_at")?,
                    location: row.try_get("location")?,
                    status: text_enum(row, "status")?,
                })
            })
            .collect()
    }

    async fn confirmed_registrations(&self, event_id: Uuid) -> DomainResult<Vec<Registration>> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_id, client_id, horse_id, status
            FROM event_registrations
            WHERE event_id = $1 AND status = 'confirmed'
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DomainResult<Registration> {
                Ok(Registration {
                    id: row.try_get("id")?,
                    event_id: row.try_get("event_id")?,
                    client_id: row.try_get("client_id")?,
                    horse_id: row.try_get("horse_id")?,
                    status: text_enum(row, "status")?,
                })
            })
            .collect()
    }
}
