//! Request-time authorization checks built on the permission model

use tracing::warn;

use crate::error::{DomainError, DomainResult};
use crate::models::{Role, User};
use crate::permissions::{Action, SectionAction, has_permission, has_section_permission, modules};

/// Require `action` on `module`, returning the user on success.
pub fn require<'a>(user: &'a User, module: &str, action: Action) -> DomainResult<&'a User> {
    if has_permission(user, module, action) {
        return Ok(user);
    }

    warn!(user_id = %user.id, module, %action, "Permission denied");
    Err(DomainError::PermissionDenied {
        module: module.to_string(),
        action,
    })
}

/// Require `action` on a section of a horse record.
pub fn require_section<'a>(
    user: &'a User,
    section: &str,
    action: SectionAction,
) -> DomainResult<&'a User> {
    if has_section_permission(user, section, action) {
        return Ok(user);
    }

    warn!(user_id = %user.id, section, %action, "Section access denied");
    Err(DomainError::PermissionDenied {
        module: format!("{}.{}", modules::HORSES, section),
        action: match action {
            SectionAction::View => Action::View,
            SectionAction::Edit => Action::Edit,
        },
    })
}

pub fn require_admin_tier(user: &User) -> DomainResult<&User> {
    if user.is_active() && user.role.is_admin_tier() {
        return Ok(user);
    }

    warn!(user_id = %user.id, role = %user.role, "Admin role required");
    Err(DomainError::Forbidden(
        "administrator role required".to_string(),
    ))
}

pub fn require_super_admin(user: &User) -> DomainResult<&User> {
    if user.is_active() && user.role == Role::SuperAdmin {
        return Ok(user);
    }

    warn!(user_id = %user.id, role = %user.role, "Super admin role required");
    Err(DomainError::Forbidden(
        "super administrator role required".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LifecycleStatus;
    use crate::permissions::{default_permissions, sections};
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role, status: LifecycleStatus) -> User {
        User {
            id: Uuid::new_v4(),
            email: "staff@haras.test".to_string(),
            password_hash: String::new(),
            role,
            status,
            permissions: Some(default_permissions(role)),
            last_access: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_returns_user_when_allowed() {
        let employee = user(Role::Employee, LifecycleStatus::Active);
        let allowed = require(&employee, modules::HORSES, Action::Edit).unwrap();
        assert_eq!(allowed.id, employee.id);
    }

    #[test]
    fn test_require_reports_module_and_action() {
        let employee = user(Role::Employee, LifecycleStatus::Active);
        match require(&employee, modules::PAYMENTS, Action::Delete) {
            Err(DomainError::PermissionDenied { module, action }) => {
                assert_eq!(module, "payments");
                assert_eq!(action, Action::Delete);
            }
            other => panic!("unexpected result: {:?}", other.map(|u| u.id)),
        }
    }

    #[test]
    fn test_require_section() {
        let client = user(Role::Client, LifecycleStatus::Active);
        assert!(require_section(&client, sections::SANITARY_PLAN, SectionAction::View).is_ok());
        assert!(matches!(
            require_section(&client, sections::FEEDING, SectionAction::View),
            Err(DomainError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_role_gates() {
        let admin = user(Role::Admin, LifecycleStatus::Active);
        let root = user(Role::SuperAdmin, LifecycleStatus::Active);
        let retired_root = user(Role::SuperAdmin, LifecycleStatus::Inactive);
        let employee = user(Role::Employee, LifecycleStatus::Active);

        assert!(require_admin_tier(&admin).is_ok());
        assert!(require_admin_tier(&root).is_ok());
        assert!(require_admin_tier(&employee).is_err());
        assert!(require_admin_tier(&retired_root).is_err());

        assert!(require_super_admin(&root).is_ok());
        assert!(matches!(
            require_super_admin(&admin),
            Err(DomainError::Forbidden(_))
        ));
    }
}
