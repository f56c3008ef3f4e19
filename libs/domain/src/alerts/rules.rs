//! Scheduled alert rules
//!
//! Each rule lists the records it cares about, then processes them one by
//! one. A failing record is logged and counted; it never aborts the run.
//! Runs are not deduplicated: running a rule twice on the same day creates
//! the same alerts twice.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use super::dispatch::AlertDispatcher;
use crate::error::{DomainError, DomainResult};
use crate::models::{
    AlertPriority, AlertType, Client, Event, Horse, NewAlert, Payment, Registration,
    ShoeingRecord, VaccinationRecord,
};
use crate::store::{AlertStore, ClientStore, EventStore, HorseStore, PaymentStore, UserStore};

/// Days ahead scanned for vaccine doses
pub const VACCINE_LOOKAHEAD_DAYS: i64 = 7;
/// Days ahead scanned for farrier visits
pub const SHOEING_LOOKAHEAD_DAYS: i64 = 3;

/// Aggregate result of one rule run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    /// Items handled successfully
    pub processed: usize,
    pub failed: usize,
    pub alerts_created: usize,
}

impl JobOutcome {
    fn record(&mut self, result: DomainResult<usize>, job: &str, item: &dyn std::fmt::Display) {
        match result {
            Ok(created) => {
                self.processed += 1;
                self.alerts_created += created;
            }
            Err(e) => {
                error!(job, item = %item, error = %e, "Failed to process item");
                self.failed += 1;
            }
        }
    }
}

/// Priority of an overdue payment reminder
pub fn payment_priority(days_overdue: i64) -> AlertPriority {
    if days_overdue > 30 {
        AlertPriority::Critical
    } else if days_overdue > 15 {
        AlertPriority::High
    } else {
        AlertPriority::Medium
    }
}

pub(super) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub trait RuleStore:
    HorseStore + ClientStore + PaymentStore + EventStore + AlertStore + UserStore + Clone
{
}

impl<T> RuleStore for T where
    T: HorseStore + ClientStore + PaymentStore + EventStore + AlertStore + UserStore + Clone
{
}

/// The daily alert rules, one entry point per rule
#[derive(Clone)]
pub struct AlertRules<S> {
    store: S,
    dispatcher: AlertDispatcher<S>,
}

impl<S: RuleStore> AlertRules<S> {
    pub fn new(store: S) -> Self {
        Self {
            dispatcher: AlertDispatcher::new(store.clone()),
            store,
        }
    }

    /// Vaccine doses due within the next week, fanned out to admins.
    pub async fn vaccinations_due(&self, today: NaiveDate) -> DomainResult<JobOutcome> {
        let until = today + Duration::days(VACCINE_LOOKAHEAD_DAYS);
        let records = self.store.vaccinations_due_between(today, until).await?;
        info!(count = records.len(), %today, "Checking upcoming vaccinations");

        let mut outcome = JobOutcome::default();
        for record in &records {
            let result = self.vaccination_alert(record).await;
            outcome.record(result, "vaccinations_due", &record.id);
        }
        Ok(outcome)
    }

    async fn vaccination_alert(&self, record: &VaccinationRecord) -> DomainResult<usize> {
        let horse = self.active_horse(record.horse_id).await?;
        let Some(horse) = horse else { return Ok(0) };
        let Some(due) = record.next_due else { return Ok(0) };

        let template = NewAlert::new(
            AlertType::Vaccine,
            AlertPriority::High,
            format!("Vaccine due soon - {}", horse.name),
            format!(
                "Vaccine '{}' for {} is due on {}",
                record.vaccine_type, horse.name, due
            ),
        )
        .with_event_date(start_of_day(due))
        .related_to("horse", horse.id)
        .with_metadata(json!({ "record_id": record.id }));

        Ok(self.dispatcher.fan_out_to_admins(&template).await?.len())
    }

    /// Farrier visits due within the next three days, fanned out to admins.
    pub async fn shoeing_due(&self, today: NaiveDate) -> DomainResult<JobOutcome> {
        let until = today + Duration::days(SHOEING_LOOKAHEAD_DAYS);
        let records = self.store.shoeings_due_between(today, until).await?;
        info!(count = records.len(), %today, "Checking upcoming shoeing");

        let mut outcome = JobOutcome::default();
        for record in &records {
            let result = self.shoeing_alert(record).await;
            outcome.record(result, "shoeing_due", &record.id);
        }
        Ok(outcome)
    }

    async fn shoeing_alert(&self, record: &ShoeingRecord) -> DomainResult<usize> {
        let horse = self.active_horse(record.horse_id).await?;
        let Some(horse) = horse else { return Ok(0) };
        let Some(due) = record.next_due else { return Ok(0) };

        let template = NewAlert::new(
            AlertType::Shoeing,
            AlertPriority::Medium,
            format!("Shoeing due - {}", horse.name),
            format!("{} is due at the farrier on {}", horse.name, due),
        )
        .with_event_date(start_of_day(due))
        .related_to("horse", horse.id)
        .with_metadata(json!({ "record_id": record.id }));

        Ok(self.dispatcher.fan_out_to_admins(&template).await?.len())
    }

    /// Outstanding payments past their due date, escalating with age.
    pub async fn overdue_payments(&self, today: NaiveDate) -> DomainResult<JobOutcome> {
        let payments = self.store.overdue_payments(today).await?;
        info!(count = payments.len(), %today, "Checking overdue payments");

        let mut outcome = JobOutcome::default();
        for payment in &payments {
            let result = self.payment_alert(payment, today).await;
            outcome.record(result, "overdue_payments", &payment.id);
        }
        Ok(outcome)
    }

    async fn payment_alert(&self, payment: &Payment, today: NaiveDate) -> DomainResult<usize> {
        let client = self.client(payment.client_id).await?;
        let days = payment.days_overdue(today);

        let template = NewAlert::new(
            AlertType::Payment,
            payment_priority(days),
            format!("Overdue payment - {}", client.full_name()),
            format!(
                "Payment for '{}' of ${:.2} is {} days overdue",
                payment.concept, payment.amount, days
            ),
        )
        .with_event_date(start_of_day(payment.due_date))
        .related_to("payment", payment.id)
        .with_metadata(json!({ "client_id": client.id, "days_overdue": days }));

        Ok(self.dispatcher.fan_out_to_admins(&template).await?.len())
    }

    /// Reminders for confirmed registrants of events starting 24 to 48 hours
    /// from `now`. Only clients with a login account are notified.
    pub async fn event_reminders(&self, now: DateTime<Utc>) -> DomainResult<JobOutcome> {
        let from = now + Duration::hours(24);
        let to = now + Duration::hours(48);
        let events = self.store.events_starting_between(from, to).await?;
        info!(count = events.len(), %from, %to, "Sending event reminders");

        let mut outcome = JobOutcome::default();
        for event in &events {
            let registrations = match self.store.confirmed_registrations(event.id).await {
                Ok(registrations) => registrations,
                Err(e) => {
                    outcome.record(Err(e), "event_reminders", &event.id);
                    continue;
                }
            };

            for registration in &registrations {
                let result = self.event_alert(event, registration).await;
                outcome.record(result, "event_reminders", &registration.id);
            }
        }
        Ok(outcome)
    }

    async fn event_alert(&self, event: &Event, registration: &Registration) -> DomainResult<usize> {
        let client = self.client(registration.client_id).await?;
        let Some(user_id) = client.user_id else {
            return Ok(0);
        };

        let input = NewAlert::new(
            AlertType::Event,
            AlertPriority::Medium,
            format!("Reminder: {}", event.title),
            format!(
                "You have an event tomorrow at {}. Location: {}",
                event.starts_at.format("%H:%M"),
                event.location.as_deref().unwrap_or("to be announced")
            ),
        )
        .with_event_date(event.starts_at)
        .related_to("event", event.id)
        .for_user(user_id);

        self.dispatcher.create(input).await?;
        Ok(1)
    }

    /// Move pending payments past their due date to overdue.
    pub async fn sweep_overdue_payments(&self, today: NaiveDate) -> DomainResult<u64> {
        let updated = self.store.mark_overdue(today).await?;
        info!(updated, %today, "Marked pending payments as overdue");
        Ok(updated)
    }

    async fn active_horse(&self, id: uuid::Uuid) -> DomainResult<Option<Horse>> {
        let horse = self
            .store
            .find_horse(id)
            .await?
            .ok_or_else(|| DomainError::not_found("horse", id))?;
        Ok(horse.status.is_active().then_some(horse))
    }

    async fn client(&self, id: uuid::Uuid) -> DomainResult<Client> {
        self.store
            .find_client(id)
            .await?
            .ok_or_else(|| DomainError::not_found("client", id))
    }
}
