use sqlx::Row;
use uuid::Uuid;

use super::{Database, text_enum};
use crate::error::DomainResult;
use crate::models::Client;
use crate::store::ClientStore;

impl ClientStore for Database {
    async fn find_client(&self, id: Uuid) -> DomainResult<Option<Client>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, user_id, status
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Client {
                id: row.try_get("id")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                user_id: row.try_get("user_id")?,
                status: text_enum(&row, "status")?,
            })),
            None => Ok(None),
        }
    }
}
