//! POS Service - opens the local store, brings it up to date and reports
//! its state.

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pos_core::DateRange;
use pos_service::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pos_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting POS Service");

    // Load configuration from file and environment
    let config = AppConfig::from_env();

    tracing::info!(
        data_dir = %config.data_dir,
        fast_quota_bytes = config.fast_quota_bytes,
        broadcast_capacity = config.broadcast_capacity,
        seed_defaults = config.seed_defaults,
        backup_path = ?config.backup_path,
        "Service configuration loaded"
    );

    let state = AppState::start(config).await?;

    let estimate = state.store.estimate().await;
    tracing::info!(
        fast_usage_bytes = estimate.fast_usage_bytes,
        fast_quota_bytes = estimate.fast_quota_bytes,
        durable_bytes = ?estimate.durable_bytes,
        keys = state.store.keys().len(),
        "Storage estimate"
    );

    let today = Utc::now().date_naive();
    let summary = state.sales_report(&DateRange::days(Some(today), Some(today)));
    tracing::info!(
        date = %today,
        sales = summary.total,
        transactions = summary.count,
        "Today's sales"
    );

    if let Some(path) = &state.config.backup_path {
        let keys = state.store.export_backup(path).await?;
        tracing::info!(path = %path, keys, "Backup written");
    }

    state.store.flush().await;
    tracing::info!("Durable writes flushed, shutting down");
    Ok(())
}
