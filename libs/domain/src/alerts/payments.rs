//! Alerts raised as payments are registered and settled
//!
//! Administrators get one copy each; the client is notified too when the
//! client record is linked to a login account.

use serde_json::{Value, json};
use tracing::info;

use super::dispatch::AlertDispatcher;
use super::rules::start_of_day;
use crate::error::DomainResult;
use crate::models::{AlertPriority, AlertType, Client, NewAlert, Payment, PaymentStatus};
use crate::store::{AlertStore, ClientStore, UserStore};

fn view_payments(label: &str) -> Value {
    json!([{ "type": "view_detail", "label": label, "url": "/payments" }])
}

#[derive(Clone)]
pub struct PaymentAlerts<S> {
    store: S,
    dispatcher: AlertDispatcher<S>,
}

impl<S: ClientStore + AlertStore + UserStore + Clone> PaymentAlerts<S> {
    pub fn new(store: S) -> Self {
        Self {
            dispatcher: AlertDispatcher::new(store.clone()),
            store,
        }
    }

    /// A new pending payment: medium priority for admins, high for the
    /// client. Payments created in any other status raise nothing.
    pub async fn payment_created(&self, payment: &Payment) -> DomainResult<usize> {
        if payment.status != PaymentStatus::Pending {
            return Ok(0);
        }

        let client = self.store.find_client(payment.client_id).await?;
        let name = client_name(client.as_ref());
        let due = payment.due_date.format("%d/%m/%Y");

        let admin_alert = NewAlert::new(
            AlertType::Payment,
            AlertPriority::Medium,
            format!("New pending payment: {}", name),
            format!(
                "A pending payment of ${:.2} was created for {}. Concept: {}. Due on {}.",
                payment.amount, name, payment.concept, due
            ),
        )
        .related_to("payment", payment.id)
        .with_event_date(start_of_day(payment.due_date))
        .with_actions(view_payments("View payment"))
        .with_metadata(json!({
            "payment_id": payment.id,
            "client_name": name,
            "amount": payment.amount,
            "concept": payment.concept,
        }));
        let mut created = self.dispatcher.fan_out_to_admins(&admin_alert).await?.len();

        if let Some(user_id) = client.and_then(|c| c.user_id) {
            let notice = NewAlert::new(
                AlertType::Payment,
                AlertPriority::High,
                "New pending payment",
                format!(
                    "You have a pending payment of ${:.2}. Concept: {}. Due on {}.",
                    payment.amount, payment.concept, due
                ),
            )
            .related_to("payment", payment.id)
            .with_event_date(start_of_day(payment.due_date))
            .with_actions(view_payments("View payments"))
            .with_metadata(json!({
                "payment_id": payment.id,
                "amount": payment.amount,
                "concept": payment.concept,
            }))
            .for_user(user_id);
            self.dispatcher.create(notice).await?;
            created += 1;
        }

        info!(payment_id = %payment.id, alerts = created, "Raised new payment alerts");
        Ok(created)
    }

    /// A payment was recorded as paid: low priority for admins, medium for
    /// the client.
    pub async fn payment_received(&self, payment: &Payment) -> DomainResult<usize> {
        if payment.status != PaymentStatus::Paid {
            return Ok(0);
        }

        let client = self.store.find_client(payment.client_id).await?;
        let name = client_name(client.as_ref());

        let admin_alert = NewAlert::new(
            AlertType::Payment,
            AlertPriority::Low,
            format!("Payment received: {}", name),
            format!(
                "{} paid ${:.2}. Concept: {}.",
                name, payment.amount, payment.concept
            ),
        )
        .related_to("payment", payment.id)
        .with_actions(view_payments("View payment"))
        .with_metadata(json!({
            "payment_id": payment.id,
            "client_name": name,
            "amount": payment.amount,
            "concept": payment.concept,
            "paid_on": payment.paid_on,
        }));
        let mut created = self.dispatcher.fan_out_to_admins(&admin_alert).await?.len();

        if let Some(user_id) = client.and_then(|c| c.user_id) {
            let notice = NewAlert::new(
                AlertType::Payment,
                AlertPriority::Medium,
                "Payment registered",
                format!(
                    "Your payment of ${:.2} was registered. Concept: {}. Thank you!",
                    payment.amount, payment.concept
                ),
            )
            .related_to("payment", payment.id)
            .with_actions(view_payments("View payments"))
            .with_metadata(json!({
                "payment_id": payment.id,
                "amount": payment.amount,
                "concept": payment.concept,
            }))
            .for_user(user_id);
            self.dispatcher.create(notice).await?;
            created += 1;
        }

        info!(payment_id = %payment.id, alerts = created, "Raised payment received alerts");
        Ok(created)
    }
}

fn client_name(client: Option<&Client>) -> String {
    client
        .map(Client::full_name)
        .unwrap_or_else(|| "A client".to_string())
}
