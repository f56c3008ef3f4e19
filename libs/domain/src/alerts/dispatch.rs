//! Alert delivery and per-recipient read state
//!
//! Alerts are addressed to one user. Admin notifications are fanned out as
//! one row per active administrator so each copy is read independently.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::guard::require;
use crate::models::{Alert, NewAlert, Role, User};
use crate::permissions::{Action, modules};
use crate::store::{AlertStore, Pagination, UserStore};

/// Roles that receive administrative alerts
pub const ADMIN_ROLES: &[Role] = &[Role::SuperAdmin, Role::Admin];

/// Creates alerts and tracks their read state per recipient
#[derive(Clone)]
pub struct AlertDispatcher<S> {
    store: S,
}

impl<S: AlertStore + UserStore> AlertDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: NewAlert) -> DomainResult<Alert> {
        info!(alert_type = %input.alert_type, user_id = ?input.user_id, "Creating alert");
        self.store.insert_alert(input).await
    }

    /// Alert created on behalf of a user through the API
    pub async fn publish(&self, actor: &User, input: NewAlert) -> DomainResult<Alert> {
        require(actor, modules::ALERTS, Action::Create)?;
        self.create(input).await
    }

    /// One copy of `template` per active admin, addressed to that admin.
    ///
    /// Any recipient set on the template is ignored.
    pub async fn fan_out_to_admins(&self, template: &NewAlert) -> DomainResult<Vec<Alert>> {
        let admins = self.store.users_with_roles(ADMIN_ROLES, true).await?;
        if admins.is_empty() {
            warn!(alert_type = %template.alert_type, "No active administrators to notify");
            return Ok(Vec::new());
        }

        let rows = admins
            .iter()
            .map(|admin| template.for_user(admin.id))
            .collect();
        let created = self.store.insert_alerts(rows).await?;
        info!(
            alert_type = %template.alert_type,
            recipients = created.len(),
            "Fanned out alert to administrators"
        );
        Ok(created)
    }

    pub async fn list_for_user(
        &self,
        actor: &User,
        unread_only: bool,
        page: Pagination,
    ) -> DomainResult<Vec<Alert>> {
        self.store.alerts_for_user(actor.id, unread_only, page).await
    }

    pub async fn count_unread(&self, actor: &User) -> DomainResult<i64> {
        self.store.count_unread(actor.id).await
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> DomainResult<Alert> {
        let alert = self.load(id).await?;
        ensure_can_access(actor, &alert)?;
        Ok(alert)
    }

    pub async fn mark_read(&self, actor: &User, id: Uuid) -> DomainResult<Alert> {
        let alert = self.load(id).await?;
        ensure_can_access(actor, &alert)?;
        self.store
            .mark_alert_read(id)
            .await?
            .ok_or_else(|| DomainError::not_found("alert", id))
    }

    pub async fn mark_all_read(&self, actor: &User) -> DomainResult<u64> {
        let count = self.store.mark_all_read(actor.id).await?;
        info!(user_id = %actor.id, count, "Marked alerts as read");
        Ok(count)
    }

    pub async fn delete(&self, actor: &User, id: Uuid) -> DomainResult<()> {
        let alert = self.load(id).await?;
        ensure_can_access(actor, &alert)?;
        if !self.store.delete_alert(id).await? {
            return Err(DomainError::not_found("alert", id));
        }
        info!(alert_id = %id, user_id = %actor.id, "Deleted alert");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> DomainResult<Alert> {
        self.store
            .find_alert(id)
            .await?
            .ok_or_else(|| DomainError::not_found("alert", id))
    }
}

/// Owners and administrators may act on an alert.
fn ensure_can_access(actor: &User, alert: &Alert) -> DomainResult<()> {
    let owns = alert.user_id == Some(actor.id);
    if owns || (actor.is_active() && actor.role.is_admin_tier()) {
        return Ok(());
    }
    Err(DomainError::Forbidden(
        "alert belongs to another user".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::{AlertPriority, AlertType, LifecycleStatus};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn template() -> NewAlert {
        NewAlert::new(
            AlertType::Stock,
            AlertPriority::Low,
            "Feed stock low",
            "Only two bales of alfalfa left",
        )
    }

    #[tokio::test]
    async fn test_fan_out_one_alert_per_active_admin() {
        let store = Arc::new(MemoryStore::new());
        let root = store.add_user("root@haras.test", Role::SuperAdmin, LifecycleStatus::Active);
        let a1 = store.add_user("a1@haras.test", Role::Admin, LifecycleStatus::Active);
        let a2 = store.add_user("a2@haras.test", Role::Admin, LifecycleStatus::Active);
        store.add_user("gone@haras.test", Role::Admin, LifecycleStatus::Inactive);
        store.add_user("staff@haras.test", Role::Employee, LifecycleStatus::Active);
        let dispatcher = AlertDispatcher::new(store.clone());

        let mut input = template();
        input.user_id = Some(Uuid::new_v4());
        let created = dispatcher.fan_out_to_admins(&input).await.unwrap();

        assert_eq!(created.len(), 3);
        let recipients: HashSet<Uuid> = created.iter().filter_map(|a| a.user_id).collect();
        let expected: HashSet<Uuid> = [root.id, a1.id, a2.id].into_iter().collect();
        assert_eq!(recipients, expected);
        assert!(created.iter().all(|a| a.title == "Feed stock low" && !a.read));
    }

    #[tokio::test]
    async fn test_fan_out_without_admins_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.add_user("staff@haras.test", Role::Employee, LifecycleStatus::Active);
        let dispatcher = AlertDispatcher::new(store.clone());

        assert!(dispatcher.fan_out_to_admins(&template()).await.unwrap().is_empty());
        assert!(store.all_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_read_tracking_per_recipient() {
        let store = Arc::new(MemoryStore::new());
        let a1 = store.add_user("a1@haras.test", Role::Admin, LifecycleStatus::Active);
        let a2 = store.add_user("a2@haras.test", Role::Admin, LifecycleStatus::Active);
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher.fan_out_to_admins(&template()).await.unwrap();
        let second = dispatcher.fan_out_to_admins(&template()).await.unwrap();

        let newest = dispatcher
            .list_for_user(&a1, false, Pagination::default())
            .await
            .unwrap();
        assert_eq!(newest.len(), 2);
        let a1_second = second.iter().find(|a| a.user_id == Some(a1.id)).unwrap();
        assert_eq!(newest[0].id, a1_second.id);

        dispatcher.mark_read(&a1, a1_second.id).await.unwrap();
        assert_eq!(dispatcher.count_unread(&a1).await.unwrap(), 1);
        assert_eq!(dispatcher.count_unread(&a2).await.unwrap(), 2);

        assert_eq!(dispatcher.mark_all_read(&a2).await.unwrap(), 2);
        assert_eq!(dispatcher.count_unread(&a2).await.unwrap(), 0);
        assert!(
            dispatcher
                .list_for_user(&a2, true, Pagination::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_can_touch_an_alert() {
        let store = Arc::new(MemoryStore::new());
        let admin = store.add_user("admin@haras.test", Role::Admin, LifecycleStatus::Active);
        let rider = store.add_user("rider@haras.test", Role::Client, LifecycleStatus::Active);
        let other = store.add_user("other@haras.test", Role::Client, LifecycleStatus::Active);
        let dispatcher = AlertDispatcher::new(store.clone());

        let alert = dispatcher.create(template().for_user(rider.id)).await.unwrap();

        assert!(matches!(
            dispatcher.get(&other, alert.id).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            dispatcher.mark_read(&other, alert.id).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            dispatcher.delete(&other, alert.id).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(!dispatcher.get(&rider, alert.id).await.unwrap().read);
        assert!(dispatcher.get(&admin, alert.id).await.is_ok());

        dispatcher.delete(&rider, alert.id).await.unwrap();
        assert!(matches!(
            dispatcher.get(&rider, alert.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_publish_requires_alert_create_permission() {
        let store = Arc::new(MemoryStore::new());
        let employee = store.add_user("staff@haras.test", Role::Employee, LifecycleStatus::Active);
        let admin = store.add_user("admin@haras.test", Role::Admin, LifecycleStatus::Active);
        let dispatcher = AlertDispatcher::new(store.clone());

        assert!(matches!(
            dispatcher.publish(&employee, template()).await,
            Err(DomainError::PermissionDenied { .. })
        ));
        assert!(dispatcher.publish(&admin, template()).await.is_ok());
    }
}
