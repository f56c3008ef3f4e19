//! Cron schedules for the alert jobs
//!
//! Six-field cron expressions (seconds first), evaluated in UTC. Each one can
//! be overridden through a `HARAS_`-prefixed environment variable.

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// `HARAS_VACCINATION_SCHEDULE`
    pub vaccination_schedule: String,
    /// `HARAS_SHOEING_SCHEDULE`
    pub shoeing_schedule: String,
    /// `HARAS_PAYMENT_SCHEDULE`
    pub payment_schedule: String,
    /// `HARAS_EVENT_SCHEDULE`
    pub event_schedule: String,
    /// `HARAS_PAYMENT_STATUS_SCHEDULE`
    pub payment_status_schedule: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("vaccination_schedule", "0 0 8 * * *")?
            .set_default("shoeing_schedule", "0 0 8 * * *")?
            .set_default("payment_schedule", "0 0 9 * * *")?
            .set_default("event_schedule", "0 0 10 * * *")?
            .set_default("payment_status_schedule", "0 30 9 * * *")?
            .add_source(config::Environment::with_prefix("HARAS"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
