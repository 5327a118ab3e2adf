use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use matchday_engine::config::settings::get_config;
use matchday_engine::services::{CronTaskRegistry, HttpMatchProvider};
use matchday_engine::telemetry::{get_subscriber, init_subscriber};
use matchday_engine::{build_engine, EngineParts};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = match get_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read the config: {}", e);
            std::process::exit(1);
        }
    };

    let subscriber = get_subscriber(
        config.application.name.clone(),
        config.application.log_level.clone(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let timezone = match config.application.timezone() {
        Ok(timezone) => timezone,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // Only try to establish connection when actually used
    let connection_pool = match PgPoolOptions::new()
        .max_connections(16)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy(config.database.connection_string().expose_secret())
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Failed to create Postgres connection pool: {}", e);
            std::process::exit(1);
        }
    };

    let provider = match HttpMatchProvider::new(&config.provider) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            tracing::error!("❌ Failed to build the match provider client: {}", e);
            std::process::exit(1);
        }
    };

    let registry = match CronTaskRegistry::new().await {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!("❌ Failed to create the job scheduler: {}", e);
            std::process::exit(1);
        }
    };

    let engine = build_engine(
        &config,
        timezone,
        EngineParts::with_postgres(connection_pool, provider, registry),
    );

    if let Err(e) = engine.scheduler.start().await {
        tracing::error!("❌ Failed to start scheduler: {}", e);
        std::process::exit(1);
    }
    tracing::info!("✅ Scheduler service started successfully");

    // Today may already be a matchday
    if let Err(e) = engine.scheduler.probe_matches_today().await {
        tracing::warn!("⚠️ Startup probe failed, waiting for the next scheduled one: {}", e);
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    if let Err(e) = engine.scheduler.stop().await {
        tracing::error!("❌ Failed to stop scheduler cleanly: {}", e);
    }

    Ok(())
}
