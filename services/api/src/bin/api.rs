//! services/api/src/bin/api.rs

use std::sync::Arc;

use api_lib::{
    adapters::{DbAdapter, InMemoryAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(
        granularity = config.slot_granularity_minutes,
        rule = ?config.conflict_rule,
        "Configuration loaded. Starting server..."
    );

    // --- 2. Pick the Store: Postgres when configured, otherwise in memory ---
    let app_state = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            AppState::new(
                config.clone(),
                db_adapter.clone(),
                db_adapter.clone(),
                db_adapter,
            )?
        }
        None => {
            warn!("DATABASE_URL is not set; bookings are kept in memory and lost on restart");
            let store = Arc::new(InMemoryAdapter::new());
            store.insert_example_salon()?;
            AppState::new(config.clone(), store.clone(), store.clone(), store)?
        }
    };

    // --- 3. Create the Web Router ---
    let app = build_router(Arc::new(app_state))?;

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
