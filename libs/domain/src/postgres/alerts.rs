use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row};
use tracing::info;
use uuid::Uuid;

use super::{Database, text_enum};
use crate::error::DomainResult;
use crate::models::{Alert, NewAlert};
use crate::store::{AlertStore, Pagination};

const ALERT_COLUMNS: &str = "id, user_id, alert_type, priority, title, message, read, event_date, \
     expires_at, related_entity_type, related_entity_id, actions, metadata, created_at, updated_at";

fn alert_from_row(row: &PgRow) -> DomainResult<Alert> {
    Ok(Alert {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        alert_type: text_enum(row, "alert_type")?,
        priority: text_enum(row, "priority")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        read: row.try_get("read")?,
        event_date: row.try_get("event_date")?,
        expires_at: row.try_get("expires_at")?,
        related_entity_type: row.try_get("related_entity_type")?,
        related_entity_id: row.try_get("related_entity_id")?,
        actions: row.try_get("actions")?,
        metadata: row.try_get("metadata")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn insert<'e, E>(executor: E, input: &NewAlert) -> DomainResult<Alert>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO alerts (user_id, alert_type, priority, title, message, read, event_date,
                            expires_at, related_entity_type, related_entity_id, actions, metadata)
        VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $8, $9, $10, $11)
        RETURNING {ALERT_COLUMNS}
        "#
    ))
    .bind(input.user_id)
    .bind(input.alert_type.as_str())
    .bind(input.priority.as_str())
    .bind(&input.title)
    .bind(&input.message)
    .bind(input.event_date)
    .bind(input.expires_at)
    .bind(&input.related_entity_type)
    .bind(input.related_entity_id)
    .bind(&input.actions)
    .bind(&input.metadata)
    .fetch_one(executor)
    .await?;

    alert_from_row(&row)
}

impl AlertStore for Database {
    async fn insert_alert(&self, input: NewAlert) -> DomainResult<Alert> {
        insert(&self.pool, &input).await
    }

    async fn insert_alerts(&self, inputs: Vec<NewAlert>) -> DomainResult<Vec<Alert>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in &inputs {
            created.push(insert(&mut *tx, input).await?);
        }
        tx.commit().await?;

        info!("Inserted {} alerts", created.len());
        Ok(created)
    }

    async fn find_alert(&self, id: Uuid) -> DomainResult<Option<Alert>> {
        let row = sqlx::query(&format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(alert_from_row).transpose()
    }

    async fn alerts_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: Pagination,
    ) -> DomainResult<Vec<Alert>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            FROM alerts
            WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(page.offset)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(alert_from_row).collect()
    }

    async fn count_unread(&self, user_id: Uuid) -> DomainResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM alerts WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("total")?)
    }

    async fn mark_alert_read(&self, id: Uuid) -> DomainResult<Option<Alert>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE alerts
            SET read = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(alert_from_row).transpose()
    }

    async fn mark_all_read(&self, user_id: Uuid) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE alerts SET read = TRUE, updated_at = NOW() WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_alert(&self, id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM alerts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
