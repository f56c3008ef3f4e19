use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::PgRow;
use tracing::info;
use uuid::Uuid;

use super::{Database, text_enum};
use crate::error::DomainResult;
use crate::models::{Role, User, UserInsert, UserPatch};
use crate::permissions::PermissionSet;
use crate::store::{Pagination, UserStore};

const USER_COLUMNS: &str =
    "id, email, password_hash, role, status, permissions, last_access, created_at, updated_at";

fn user_from_row(row: &PgRow) -> DomainResult<User> {
    let permissions: Option<Value> = row.try_get("permissions")?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: text_enum(row, "role")?,
        status: text_enum(row, "status")?,
        permissions: permissions
            .filter(|value| !value.is_null())
            .map(|value| PermissionSet::from_json_lenient(&value)),
        last_access: row.try_get("last_access")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn users_from_rows(rows: Vec<PgRow>) -> DomainResult<Vec<User>> {
    rows.iter().map(user_from_row).collect()
}

impl UserStore for Database {
    async fn find_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self, active_only: bool, page: Pagination) -> DomainResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE NOT $1 OR status = 'active'
            ORDER BY created_at
            OFFSET $2 LIMIT $3
            "#
        ))
        .bind(active_only)
        .bind(page.offset)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;

        users_from_rows(rows)
    }

    async fn search_users(&self, term: &str, page: Pagination) -> DomainResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE status = 'active' AND email ILIKE '%' || $1 || '%'
            ORDER BY email
            OFFSET $2 LIMIT $3
            "#
        ))
        .bind(term)
        .bind(page.offset)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;

        users_from_rows(rows)
    }

    async fn users_with_roles(&self, roles: &[Role], active_only: bool) -> DomainResult<Vec<User>> {
        let roles: Vec<&str> = roles.iter().map(|role| role.as_str()).collect();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE role = ANY($1) AND (NOT $2 OR status = 'active')
            ORDER BY created_at
            "#
        ))
        .bind(&roles)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        users_from_rows(rows)
    }

    async fn count_active_with_role(&self, role: Role) -> DomainResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM users WHERE role = $1 AND status = 'active'",
        )
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("total")?)
    }

    async fn insert_user(&self, input: UserInsert) -> DomainResult<User> {
        info!("Inserting user: {}", input.email);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (email, password_hash, role, status, permissions)
            VALUES ($1, $2, $3, 'active', $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.role.as_str())
        .bind(input.permissions.to_json())
        .fetch_one(&self.pool)
        .await?;

        user_from_row(&row)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> DomainResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                status = COALESCE($5, status),
                permissions = COALESCE($6, permissions),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.email)
        .bind(patch.password_hash)
        .bind(patch.role.map(|role| role.as_str()))
        .bind(patch.status.map(|status| status.as_str()))
        .bind(patch.permissions.map(|perms| perms.to_json()))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }
}
