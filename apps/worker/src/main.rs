//! Vigil audit daemon: owns the audit pipeline and its retention sweep.

#![forbid(unsafe_code)]

mod worker_config;

use std::sync::Arc;

use tracing::{info, warn};
use vigil_application::{LogEventOptions, RetentionSweep};
use vigil_core::{AppError, AppResult};
use vigil_domain::StatisticsTimeframe;
use vigil_infrastructure::{InMemoryCounterSink, build_audit_logger};

use crate::worker_config::{init_tracing, load_audit_config};

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = load_audit_config()?;
    let counters = Arc::new(InMemoryCounterSink::new());
    let logger = build_audit_logger(&config, counters.clone())?;

    logger.system().startup(LogEventOptions::new()).await;
    let sweep = RetentionSweep::spawn(logger.clone());

    info!(
        backend = logger.backend_name(),
        retention_days = config.retention.retention_days,
        cleanup_interval_secs = config.retention.cleanup_interval.as_secs(),
        "vigil-worker started"
    );

    let signal = tokio::signal::ctrl_c().await.map_err(|error| {
        AppError::Internal(format!("failed to listen for shutdown signal: {error}"))
    });
    if let Err(error) = &signal {
        warn!(error = %error, "shutting down without a signal");
    }

    logger.system().shutdown(LogEventOptions::new()).await;
    sweep.stop().await;

    let statistics = logger.get_statistics(StatisticsTimeframe::Day).await;
    info!(
        events_last_day = statistics.total_events,
        counters = counters.snapshot().len(),
        "vigil-worker stopped"
    );

    signal
}
