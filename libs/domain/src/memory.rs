//! In-memory store for unit tests, here and in dependent crates (`testing` feature)

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::{
    Alert, Client, DewormingRecord, Event, EventStatus, Horse, LifecycleStatus, NewAlert, Payment,
    PaymentStatus, Registration, RegistrationStatus, Role, ShoeingRecord, User, UserInsert,
    UserPatch, VaccinationRecord,
};
use crate::permissions::{Action, PermissionSet, default_permissions};
use crate::store::{
    AlertStore, ClientStore, EventStore, HorseStore, Pagination, PaymentStore, UserStore,
};

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<User>>,
    pub horses: Mutex<Vec<Horse>>,
    pub vaccinations: Mutex<Vec<VaccinationRecord>>,
    pub dewormings: Mutex<Vec<DewormingRecord>>,
    pub shoeings: Mutex<Vec<ShoeingRecord>>,
    pub clients: Mutex<Vec<Client>>,
    pub payments: Mutex<Vec<Payment>>,
    pub events: Mutex<Vec<Event>>,
    pub registrations: Mutex<Vec<Registration>>,
    pub alerts: Mutex<Vec<Alert>>,
}

fn page<T: Clone>(items: Vec<T>, page: Pagination) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, email: &str, role: Role, status: LifecycleStatus) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: String::new(),
            role,
            status,
            permissions: Some(default_permissions(role)),
            last_access: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    /// Allow `action` on `module` for a stored user and return the updated record.
    pub fn grant(&self, user_id: Uuid, module: &str, action: Action) -> User {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .expect("grant on unknown user");
        user.permissions
            .get_or_insert_with(PermissionSet::default)
            .set(module, action, true);
        user.clone()
    }

    pub fn add_horse(&self, name: &str, category: Option<crate::models::SanitaryCategory>) -> Horse {
        let now = Utc::now();
        let horse = Horse {
            id: Uuid::new_v4(),
            name: name.to_string(),
            chip_number: None,
            sanitary_category: category,
            status: LifecycleStatus::Active,
            owner_id: None,
            created_at: now,
            updated_at: now,
        };
        self.horses.lock().unwrap().push(horse.clone());
        horse
    }

    pub fn add_vaccination(&self, horse_id: Uuid, vaccine_type: &str, date: NaiveDate) {
        self.add_vaccination_due(horse_id, vaccine_type, date, None);
    }

    pub fn add_vaccination_due(
        &self,
        horse_id: Uuid,
        vaccine_type: &str,
        date: NaiveDate,
        next_due: Option<NaiveDate>,
    ) {
        self.vaccinations.lock().unwrap().push(VaccinationRecord {
            id: Uuid::new_v4(),
            horse_id,
            vaccine_type: vaccine_type.to_string(),
            date,
            veterinarian: None,
            brand: None,
            next_due,
            applied: true,
        });
    }

    pub fn add_deworming(&self, horse_id: Uuid, date: NaiveDate) {
        self.dewormings.lock().unwrap().push(DewormingRecord {
            id: Uuid::new_v4(),
            horse_id,
            date,
            brand: Some("Ivermectina".to_string()),
            drugs: None,
            next_due: None,
        });
    }

    pub fn add_shoeing(&self, horse_id: Uuid, date: NaiveDate, next_due: Option<NaiveDate>) {
        self.shoeings.lock().unwrap().push(ShoeingRecord {
            id: Uuid::new_v4(),
            horse_id,
            date,
            farrier: None,
            next_due,
        });
    }

    pub fn add_client(&self, first_name: &str, last_name: &str, user_id: Option<Uuid>) -> Client {
        let client = Client {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            user_id,
            status: LifecycleStatus::Active,
        };
        self.clients.lock().unwrap().push(client.clone());
        client
    }

    pub fn add_payment(
        &self,
        client_id: Uuid,
        amount: f64,
        status: PaymentStatus,
        due_date: NaiveDate,
    ) -> Payment {
        let payment = Payment {
            id: Uuid::new_v4(),
            client_id,
            concept: "Pensión mensual".to_string(),
            amount,
            status,
            due_date,
            paid_on: None,
            created_at: Utc::now(),
        };
        self.payments.lock().unwrap().push(payment.clone());
        payment
    }

    pub fn add_event(&self, title: &str, starts_at: DateTime<Utc>) -> Event {
        let event = Event {
            id: Uuid::new_v4(),
            title: title.to_string(),
            starts_at,
            ends_at: None,
            location: None,
            status: EventStatus::Scheduled,
        };
        self.events.lock().unwrap().push(event.clone());
        event
    }

    pub fn add_registration(&self, event_id: Uuid, client_id: Uuid, status: RegistrationStatus) {
        self.registrations.lock().unwrap().push(Registration {
            id: Uuid::new_v4(),
            event_id,
            client_id,
            horse_id: None,
            status,
        });
    }

    pub fn all_alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, active_only: bool, pagination: Pagination) -> DomainResult<Vec<User>> {
        let users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| !active_only || u.is_active())
            .cloned()
            .collect();
        Ok(page(users, pagination))
    }

    async fn search_users(&self, term: &str, pagination: Pagination) -> DomainResult<Vec<User>> {
        let term = term.to_lowercase();
        let users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_active() && u.email.to_lowercase().contains(&term))
            .cloned()
            .collect();
        Ok(page(users, pagination))
    }

    async fn users_with_roles(&self, roles: &[Role], active_only: bool) -> DomainResult<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| roles.contains(&u.role) && (!active_only || u.is_active()))
            .cloned()
            .collect())
    }

    async fn count_active_with_role(&self, role: Role) -> DomainResult<i64> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.role == role && u.is_active())
            .count() as i64)
    }

    async fn insert_user(&self, input: UserInsert) -> DomainResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            password_hash: input.password_hash,
            role: input.role,
            status: LifecycleStatus::Active,
            permissions: Some(input.permissions),
            last_access: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> DomainResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(status) = patch.status {
            user.status = status;
        }
        if let Some(permissions) = patch.permissions {
            user.permissions = Some(permissions);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

impl HorseStore for MemoryStore {
    async fn find_horse(&self, id: Uuid) -> DomainResult<Option<Horse>> {
        Ok(self.horses.lock().unwrap().iter().find(|h| h.id == id).cloned())
    }

    async fn vaccinations_between(
        &self,
        horse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<VaccinationRecord>> {
        let mut records: Vec<VaccinationRecord> = self
            .vaccinations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.horse_id == horse_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn dewormings_between(
        &self,
        horse_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<DewormingRecord>> {
        let mut records: Vec<DewormingRecord> = self
            .dewormings
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.horse_id == horse_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn vaccinations_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<VaccinationRecord>> {
        Ok(self
            .vaccinations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.next_due.is_some_and(|due| due >= from && due <= to))
            .cloned()
            .collect())
    }

    async fn shoeings_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<ShoeingRecord>> {
        Ok(self
            .shoeings
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.next_due.is_some_and(|due| due >= from && due <= to))
            .cloned()
            .collect())
    }
}

impl ClientStore for MemoryStore {
    async fn find_client(&self, id: Uuid) -> DomainResult<Option<Client>> {
        Ok(self.clients.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }
}

impl PaymentStore for MemoryStore {
    async fn overdue_payments(&self, today: NaiveDate) -> DomainResult<Vec<Payment>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.status.is_outstanding() && p.due_date < today)
            .cloned()
            .collect())
    }

    async fn mark_overdue(&self, today: NaiveDate) -> DomainResult<u64> {
        let mut count = 0;
        for payment in self.payments.lock().unwrap().iter_mut() {
            if payment.status == PaymentStatus::Pending && payment.due_date < today {
                payment.status = PaymentStatus::Overdue;
                count += 1;
            }
        }
        Ok(count)
    }
}

impl EventStore for MemoryStore {
    async fn events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Event>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.status == EventStatus::Scheduled && e.starts_at >= from && e.starts_at < to
            })
            .cloned()
            .collect())
    }

    async fn confirmed_registrations(&self, event_id: Uuid) -> DomainResult<Vec<Registration>> {
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Confirmed)
            .cloned()
            .collect())
    }
}

impl AlertStore for MemoryStore {
    async fn insert_alert(&self, input: NewAlert) -> DomainResult<Alert> {
        let now = Utc::now();
        let alert = Alert {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            alert_type: input.alert_type,
            priority: input.priority,
            title: input.title,
            message: input.message,
            read: false,
            event_date: input.event_date,
            expires_at: input.expires_at,
            related_entity_type: input.related_entity_type,
            related_entity_id: input.related_entity_id,
            actions: input.actions,
            metadata: input.metadata,
            created_at: now,
            updated_at: now,
        };
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(alert)
    }

    async fn insert_alerts(&self, inputs: Vec<NewAlert>) -> DomainResult<Vec<Alert>> {
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            created.push(self.insert_alert(input).await?);
        }
        Ok(created)
    }

    async fn find_alert(&self, id: Uuid) -> DomainResult<Option<Alert>> {
        Ok(self.alerts.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn alerts_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> DomainResult<Vec<Alert>> {
        // Insertion order is creation order; newest first means reversed.
        let alerts: Vec<Alert> = self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|a| a.user_id == Some(user_id) && (!unread_only || !a.read))
            .cloned()
            .collect();
        Ok(page(alerts, pagination))
    }

    async fn count_unread(&self, user_id: Uuid) -> DomainResult<i64> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == Some(user_id) && !a.read)
            .count() as i64)
    }

    async fn mark_alert_read(&self, id: Uuid) -> DomainResult<Option<Alert>> {
        let mut alerts = self.alerts.lock().unwrap();
        Ok(alerts.iter_mut().find(|a| a.id == id).map(|alert| {
            alert.read = true;
            alert.updated_at = Utc::now();
            alert.clone()
        }))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> DomainResult<u64> {
        let mut count = 0;
        for alert in self.alerts.lock().unwrap().iter_mut() {
            if alert.user_id == Some(user_id) && !alert.read {
                alert.read = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_alert(&self, id: Uuid) -> DomainResult<bool> {
        let mut alerts = self.alerts.lock().unwrap();
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        Ok(alerts.len() != before)
    }
}
