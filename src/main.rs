//! spark-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use spark_gateway::api;
use spark_gateway::app_state::AppState;
use spark_gateway::config::GatewayConfig;
use spark_gateway::domain::EventBus;
use spark_gateway::persistence::{self, EventSink, PostgresEventLog};

/// How often the event-log cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    init_tracing(config.json_logs);
    tracing::info!(addr = %config.listen_addr, "starting spark-gateway");

    let event_bus = EventBus::new(config.event_bus_capacity);
    let app_state = AppState::from_config(&config, event_bus.clone())?;

    if config.persistence_enabled {
        let log = PostgresEventLog::connect(&config).await?;
        let sink: Arc<dyn EventSink> = Arc::new(log.clone());
        persistence::spawn_event_recorder(&event_bus, sink);
        persistence::spawn_cleanup(log, config.cleanup_after_days, CLEANUP_INTERVAL);
        tracing::info!("event log enabled");
    }

    spawn_submission_sweeper(&app_state, config.policy.submission_retention);

    let app = api::build_app(app_state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Drops finalized submissions once they are older than `retention`.
fn spawn_submission_sweeper(state: &AppState, retention: Duration) {
    let gate = Arc::clone(&state.moderation_gate);
    let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::hours(1));
    let every = Duration::from_secs(60);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let cutoff = chrono::Utc::now()
                .checked_sub_signed(retention)
                .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
            let pruned = gate.prune_finalized(cutoff).await;
            if pruned > 0 {
                tracing::debug!(pruned, "finalized submissions pruned");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
