//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::LifecycleStatus;
use crate::permissions::PermissionSet;

string_enum! {
    /// User role
    #[derive(Default)]
    pub enum Role {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Employee => "employee",
        #[default]
        Client => "client",
    }
}

impl Role {
    /// Admin and SuperAdmin manage users and receive admin alerts.
    pub fn is_admin_tier(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub status: LifecycleStatus,
    /// Stored permission set; `None` means default deny for non super admins
    pub permissions: Option<PermissionSet>,
    pub last_access: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// New user creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    /// Defaults to the role template when omitted
    pub permissions: Option<PermissionSet>,
}

/// User update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub permissions: Option<PermissionSet>,
}

impl UpdateUser {
    /// Whether the payload touches privileged fields
    pub fn touches_privileges(&self) -> bool {
        self.role.is_some() || self.permissions.is_some()
    }
}

/// Row to insert, with the password already hashed
#[derive(Debug, Clone)]
pub struct UserInsert {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub permissions: PermissionSet,
}

/// Column changes for an existing user
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub status: Option<LifecycleStatus>,
    pub permissions: Option<PermissionSet>,
}
