//! User administration
//!
//! Every operation takes the already authenticated actor. Mutations need an
//! admin-tier role plus the matching `users` permission, and only a super
//! administrator may modify another one. The service also protects the club
//! from losing its last active super administrator: the count is read from
//! the store right before the write, not taken from the actor's snapshot.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::guard::{require, require_admin_tier, require_super_admin};
use crate::models::{LifecycleStatus, NewUser, Role, UpdateUser, User, UserInsert, UserPatch};
use crate::password::hash_password;
use crate::permissions::{Action, PermissionSet, default_permissions, modules};
use crate::store::{Pagination, UserStore};
use crate::validation::{validate_email, validate_password};

pub struct UserAdministration<S> {
    store: S,
}

impl<S: UserStore> UserAdministration<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, actor: &User, input: NewUser) -> DomainResult<User> {
        require_admin_tier(actor)?;
        require(actor, modules::USERS, Action::Create)?;
        info!(actor = %actor.id, email = %input.email, role = %input.role, "Creating user");

        if input.role == Role::SuperAdmin && actor.role != Role::SuperAdmin {
            return Err(DomainError::Forbidden(
                "only a super administrator can create super administrators".to_string(),
            ));
        }

        validate_email(&input.email)?;
        validate_password(&input.password)?;
        self.ensure_email_available(&input.email).await?;

        let permissions = input
            .permissions
            .unwrap_or_else(|| default_permissions(input.role));

        self.store
            .insert_user(UserInsert {
                email: input.email,
                password_hash: hash_password(&input.password)?,
                role: input.role,
                permissions,
            })
            .await
    }

    /// Users may read their own record; admins may read anyone.
    pub async fn get_user(&self, actor: &User, id: Uuid) -> DomainResult<User> {
        let user = self.load(id).await?;
        if actor.id != id {
            require_admin_tier(actor)?;
        }
        Ok(user)
    }

    pub async fn list_users(
        &self,
        actor: &User,
        active_only: bool,
        page: Pagination,
    ) -> DomainResult<Vec<User>> {
        require_admin_tier(actor)?;
        self.store.list_users(active_only, page).await
    }

    pub async fn search_users(
        &self,
        actor: &User,
        term: &str,
        page: Pagination,
    ) -> DomainResult<Vec<User>> {
        require_admin_tier(actor)?;
        self.store.search_users(term.trim(), page).await
    }

    pub async fn list_by_role(&self, actor: &User, role: Role) -> DomainResult<Vec<User>> {
        require_admin_tier(actor)?;
        self.store.users_with_roles(&[role], true).await
    }

    pub async fn update_user(
        &self,
        actor: &User,
        id: Uuid,
        update: UpdateUser,
    ) -> DomainResult<User> {
        let target = self.load(id).await?;
        let is_self = actor.id == id;
        info!(actor = %actor.id, target = %id, "Updating user");

        if !is_self {
            require_admin_tier(actor)?;
            require(actor, modules::USERS, Action::Edit)?;
            if target.role == Role::SuperAdmin {
                require_super_admin(actor)?;
            }
        }

        if is_self {
            if !actor.role.is_admin_tier() && update.touches_privileges() {
                return Err(DomainError::Forbidden(
                    "cannot modify your own role or permissions".to_string(),
                ));
            }
            if update.role.is_some_and(|role| role != target.role) {
                return Err(DomainError::Forbidden(
                    "cannot change your own role".to_string(),
                ));
            }
            if update.active == Some(false) {
                return Err(DomainError::Forbidden(
                    "cannot deactivate your own account".to_string(),
                ));
            }
        }

        if update.role == Some(Role::SuperAdmin)
            && target.role != Role::SuperAdmin
            && actor.role != Role::SuperAdmin
        {
            return Err(DomainError::Forbidden(
                "only a super administrator can grant the super administrator role".to_string(),
            ));
        }

        let demotes = update.role.is_some_and(|role| role != Role::SuperAdmin);
        let deactivates = update.active == Some(false);
        if target.role == Role::SuperAdmin && target.is_active() && (demotes || deactivates) {
            self.ensure_not_last_super_admin().await?;
        }

        let mut patch = UserPatch {
            role: update.role,
            permissions: update.permissions,
            ..UserPatch::default()
        };

        if let Some(email) = update.email {
            validate_email(&email)?;
            if !email.eq_ignore_ascii_case(&target.email) {
                self.ensure_email_available(&email).await?;
            }
            patch.email = Some(email);
        }

        if let Some(password) = update.password {
            validate_password(&password)?;
            patch.password_hash = Some(hash_password(&password)?);
        }

        if let Some(active) = update.active {
            let next = if active {
                LifecycleStatus::Active
            } else {
                LifecycleStatus::Inactive
            };
            patch.status = Some(target.status.transition_to(next)?);
        }

        self.apply(id, patch).await
    }

    /// Soft delete: the account moves to `inactive`.
    pub async fn delete_user(&self, actor: &User, id: Uuid) -> DomainResult<User> {
        require_admin_tier(actor)?;
        require(actor, modules::USERS, Action::Delete)?;

        if actor.id == id {
            return Err(DomainError::Validation(
                "cannot delete your own account".to_string(),
            ));
        }

        let target = self.load(id).await?;
        if target.role == Role::SuperAdmin {
            require_super_admin(actor)?;
            if target.is_active() {
                self.ensure_not_last_super_admin().await?;
            }
        }

        info!(actor = %actor.id, target = %id, "Deactivating user");
        let status = target.status.transition_to(LifecycleStatus::Inactive)?;
        self.apply(
            id,
            UserPatch {
                status: Some(status),
                ..UserPatch::default()
            },
        )
        .await
    }

    pub async fn update_permissions(
        &self,
        actor: &User,
        id: Uuid,
        permissions: PermissionSet,
    ) -> DomainResult<User> {
        require_admin_tier(actor)?;
        require(actor, modules::USERS, Action::Edit)?;
        self.load(id).await?;

        info!(actor = %actor.id, target = %id, "Updating permissions");
        self.apply(
            id,
            UserPatch {
                permissions: Some(permissions),
                ..UserPatch::default()
            },
        )
        .await
    }

    /// Re-apply the default template of the user's current role.
    pub async fn reset_permissions(&self, actor: &User, id: Uuid) -> DomainResult<User> {
        require_admin_tier(actor)?;
        require(actor, modules::USERS, Action::Edit)?;
        let target = self.load(id).await?;

        info!(actor = %actor.id, target = %id, role = %target.role, "Resetting permissions");
        self.apply(
            id,
            UserPatch {
                permissions: Some(default_permissions(target.role)),
                ..UserPatch::default()
            },
        )
        .await
    }

    async fn ensure_not_last_super_admin(&self) -> DomainResult<()> {
        let active = self.store.count_active_with_role(Role::SuperAdmin).await?;
        if active <= 1 {
            warn!("Refusing to remove the last active super administrator");
            return Err(DomainError::Conflict(
                "cannot remove the last active super administrator".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_email_available(&self, email: &str) -> DomainResult<()> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(DomainError::Validation(
                "email is already registered".to_string(),
            ));
        }
        Ok(())
    }

    async fn load(&self, id: Uuid) -> DomainResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", id))
    }

    async fn apply(&self, id: Uuid, patch: UserPatch) -> DomainResult<User> {
        self.store
            .update_user(id, patch)
            .await?
            .ok_or_else(|| DomainError::not_found("user", id))
    }
}
