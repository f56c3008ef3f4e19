use chrono::NaiveDate;
use sqlx::Row;
use tracing::info;

use super::{Database, text_enum};
use crate::error::DomainResult;
use crate::models::Payment;
use crate::store::PaymentStore;

impl PaymentStore for Database {
    async fn overdue_payments(&self, today: NaiveDate) -> DomainResult<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, concept, amount::FLOAT8 AS amount, status, due_date, paid_on, created_at
            FROM payments
            WHERE status IN ('pending', 'overdue') AND due_date < $1
            ORDER BY due_date
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DomainResult<Payment> {
                Ok(Payment {
                    id: row.try_get("id")?,
                    client_id: row.try_get("client_id")?,
                    concept: row.try_get("concept")?,
                    amount: row.try_get("amount")?,
                    status: text_enum(row, "status")?,
                    due_date: row.try_get("due_date")?,
                    paid_on: row.try_get("paid_on")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn mark_overdue(&self, today: NaiveDate) -> DomainResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'overdue', updated_at = NOW()
            WHERE status = 'pending' AND due_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        info!("Marked {} payments as overdue", result.rows_affected());
        Ok(result.rows_affected())
    }
}
