//! Visual DM Engine - world simulation daemon
//!
//! Loads configuration and simulation data, restores or generates the
//! world, then runs the world tick on a fixed interval until Ctrl-C.

use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visual_dm_engine::infrastructure::config::AppConfig;
use visual_dm_engine::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visual_dm_engine=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Visual DM Engine");

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Database: {}", config.database_url);
    tracing::info!("  Data directory: {}", config.data_dir.display());
    tracing::info!("  Tick interval: {}s", config.tick_interval_secs);

    // Initialize application state
    let tick_interval = Duration::from_secs(config.tick_interval_secs.max(1));
    let state = AppState::new(config).await?;
    state.bootstrap(Utc::now()).await?;
    tracing::info!("Application state initialized");

    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick of an interval fires immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = state.world_tick.tick(Utc::now()).await {
                    tracing::error!("World tick failed: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    tracing::info!(ticks = state.world_tick.ticks(), "Visual DM Engine stopped");
    Ok(())
}
