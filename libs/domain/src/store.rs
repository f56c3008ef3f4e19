//! Storage abstraction
//!
//! The domain services are generic over these traits. The PostgreSQL
//! implementation lives in [`crate::postgres`].

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::{
    Alert, Client, DewormingRecord, Event, Horse, NewAlert, Payment, Registration, Role,
    ShoeingRecord, User, UserInsert, UserPatch, VaccinationRecord,
};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

/// Offset pagination for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Build from optional `skip`/`limit` query values, clamping both.
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            offset: skip.unwrap_or(0).max(0),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

pub trait UserStore: Send + Sync {
    fn find_user(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<User>>> + Send;
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = DomainResult<Option<User>>> + Send;
    fn list_users(
        &self,
        active_only: bool,
        page: Pagination,
    ) -> impl Future<Output = DomainResult<Vec<User>>> + Send;
    /// Active users whose email contains `term`, case-insensitive
    fn search_users(
        &self,
        term: &str,
        page: Pagination,
    ) -> impl Future<Output = DomainResult<Vec<User>>> + Send;
    fn users_with_roles(
        &self,
        roles: &[Role],
        active_only: bool,
    ) -> impl Future<Output = DomainResult<Vec<User>>> + Send;
    fn count_active_with_role(&self, role: Role)
    -> impl Future<Output = DomainResult<i64>> + Send;
    fn insert_user(&self, input: UserInsert) -> impl Future<Output = DomainResult<User>> + Send;
    fn update_user(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> impl Future<Output = DomainResult<Option<User>>> + Send;
}

pub trait HorseStore: Send + Sync {
    fn find_horse(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<Horse>>> + Send;
    /// Vaccination records of one horse dated within `[from, to]`, oldest first
    fn vaccinations_between(
        &self,
        horse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<VaccinationRecord>>> + Send;
    fn dewormings_between(
        &self,
        horse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<DewormingRecord>>> + Send;
    /// Vaccinations whose next dose falls within `[from, to]`
    fn vaccinations_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<VaccinationRecord>>> + Send;
    fn shoeings_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<ShoeingRecord>>> + Send;
}

pub trait ClientStore: Send + Sync {
    fn find_client(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<Client>>> + Send;
}

pub trait PaymentStore: Send + Sync {
    /// Outstanding payments due strictly before `today`
    fn overdue_payments(
        &self,
        today: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<Payment>>> + Send;
    /// Move pending payments due before `today` to overdue, returning the count
    fn mark_overdue(&self, today: NaiveDate) -> impl Future<Output = DomainResult<u64>> + Send;
}

pub trait EventStore: Send + Sync {
    /// Scheduled events starting within `[from, to)`
    fn events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = DomainResult<Vec<Event>>> + Send;
    fn confirmed_registrations(
        &self,
        event_id: Uuid,
    ) -> impl Future<Output = DomainResult<Vec<Registration>>> + Send;
}

pub trait AlertStore: Send + Sync {
    fn insert_alert(&self, input: NewAlert) -> impl Future<Output = DomainResult<Alert>> + Send;
    /// Insert all rows atomically
    fn insert_alerts(
        &self,
        inputs: Vec<NewAlert>,
    ) -> impl Future<Output = DomainResult<Vec<Alert>>> + Send;
    fn find_alert(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<Alert>>> + Send;
    /// Alerts addressed to `user_id`, newest first
    fn alerts_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: Pagination,
    ) -> impl Future<Output = DomainResult<Vec<Alert>>> + Send;
    fn count_unread(&self, user_id: Uuid) -> impl Future<Output = DomainResult<i64>> + Send;
    fn mark_alert_read(
        &self,
        id: Uuid,
    ) -> impl Future<Output = DomainResult<Option<Alert>>> + Send;
    fn mark_all_read(&self, user_id: Uuid) -> impl Future<Output = DomainResult<u64>> + Send;
    fn delete_alert(&self, id: Uuid) -> impl Future<Output = DomainResult<bool>> + Send;
}

// Shared stores: the scheduler and the HTTP state hand out `Arc`s.

impl<T: UserStore> UserStore for Arc<T> {
    fn find_user(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<User>>> + Send {
        (**self).find_user(id)
    }
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = DomainResult<Option<User>>> + Send {
        (**self).find_user_by_email(email)
    }
    fn list_users(
        &self,
        active_only: bool,
        page: Pagination,
    ) -> impl Future<Output = DomainResult<Vec<User>>> + Send {
        (**self).list_users(active_only, page)
    }
    fn search_users(
        &self,
        term: &str,
        page: Pagination,
    ) -> impl Future<Output = DomainResult<Vec<User>>> + Send {
        (**self).search_users(term, page)
    }
    fn users_with_roles(
        &self,
        roles: &[Role],
        active_only: bool,
    ) -> impl Future<Output = DomainResult<Vec<User>>> + Send {
        (**self).users_with_roles(roles, active_only)
    }
    fn count_active_with_role(&self, role: Role) -> impl Future<Output = DomainResult<i64>> + Send {
        (**self).count_active_with_role(role)
    }
    fn insert_user(&self, input: UserInsert) -> impl Future<Output = DomainResult<User>> + Send {
        (**self).insert_user(input)
    }
    fn update_user(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> impl Future<Output = DomainResult<Option<User>>> + Send {
        (**self).update_user(id, patch)
    }
}

impl<T: HorseStore> HorseStore for Arc<T> {
    fn find_horse(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<Horse>>> + Send {
        (**self).find_horse(id)
    }
    fn vaccinations_between(
        &self,
        horse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<VaccinationRecord>>> + Send {
        (**self).vaccinations_between(horse_id, from, to)
    }
    fn dewormings_between(
        &self,
        horse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<DewormingRecord>>> + Send {
        (**self).dewormings_between(horse_id, from, to)
    }
    fn vaccinations_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<VaccinationRecord>>> + Send {
        (**self).vaccinations_due_between(from, to)
    }
    fn shoeings_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<ShoeingRecord>>> + Send {
        (**self).shoeings_due_between(from, to)
    }
}

impl<T: ClientStore> ClientStore for Arc<T> {
    fn find_client(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<Client>>> + Send {
        (**self).find_client(id)
    }
}

impl<T: PaymentStore> PaymentStore for Arc<T> {
    fn overdue_payments(
        &self,
        today: NaiveDate,
    ) -> impl Future<Output = DomainResult<Vec<Payment>>> + Send {
        (**self).overdue_payments(today)
    }
    fn mark_overdue(&self, today: NaiveDate) -> impl Future<Output = DomainResult<u64>> + Send {
        (**self).mark_overdue(today)
    }
}

impl<T: EventStore> EventStore for Arc<T> {
    fn events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = DomainResult<Vec<Event>>> + Send {
        (**self).events_starting_between(from, to)
    }
    fn confirmed_registrations(
        &self,
        event_id: Uuid,
    ) -> impl Future<Output = DomainResult<Vec<Registration>>> + Send {
        (**self).confirmed_registrations(event_id)
    }
}

impl<T: AlertStore> AlertStore for Arc<T> {
    fn insert_alert(&self, input: NewAlert) -> impl Future<Output = DomainResult<Alert>> + Send {
        (**self).insert_alert(input)
    }
    fn insert_alerts(
        &self,
        inputs: Vec<NewAlert>,
    ) -> impl Future<Output = DomainResult<Vec<Alert>>> + Send {
        (**self).insert_alerts(inputs)
    }
    fn find_alert(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<Alert>>> + Send {
        (**self).find_alert(id)
    }
    fn alerts_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: Pagination,
    ) -> impl Future<Output = DomainResult<Vec<Alert>>> + Send {
        (**self).alerts_for_user(user_id, unread_only, page)
    }
    fn count_unread(&self, user_id: Uuid) -> impl Future<Output = DomainResult<i64>> + Send {
        (**self).count_unread(user_id)
    }
    fn mark_alert_read(&self, id: Uuid) -> impl Future<Output = DomainResult<Option<Alert>>> + Send {
        (**self).mark_alert_read(id)
    }
    fn mark_all_read(&self, user_id: Uuid) -> impl Future<Output = DomainResult<u64>> + Send {
        (**self).mark_all_read(user_id)
    }
    fn delete_alert(&self, id: Uuid) -> impl Future<Output = DomainResult<bool>> + Send {
        (**self).delete_alert(id)
    }
}
