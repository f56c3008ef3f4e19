use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

mod error;
mod middleware;
mod models;
mod routes;
mod settings;
mod state;

use common::database::{DatabaseConfig, init_pool};
use domain::postgres::Database;
use tokio::net::TcpListener;

use crate::{middleware::JwtVerifier, settings::Settings, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .init();

    info!("Starting API service");

    let settings = Settings::from_env()?;
    let jwt = JwtVerifier::from_pem(&settings.public_key_pem()?)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let app_state = AppState::new(Database::new(pool), jwt);

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    info!("API service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
