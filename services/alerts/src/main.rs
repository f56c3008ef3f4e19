use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

mod scheduler;
mod settings;

use common::database::{DatabaseConfig, init_pool};
use domain::alerts::AlertRules;
use domain::postgres::Database;

use crate::{scheduler::AlertScheduler, settings::Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .init();

    info!("Starting alert scheduler service");

    let settings = Settings::from_env()?;

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    let database = Database::new(pool);

    let alert_scheduler = AlertScheduler::new(AlertRules::new(database), settings);
    let mut scheduler = alert_scheduler.start().await?;

    info!("Alert scheduler service started successfully");

    // Keep the service running
    tokio::signal::ctrl_c().await?;
    info!("Shutting down alert scheduler service");
    scheduler.shutdown().await?;

    Ok(())
}
