//! Entry point for one `roomwatch-collector` run.
//!
//! Meant to be started by an external scheduler (cron, systemd timer,
//! Kubernetes CronJob) every few minutes. Each invocation:
//! - Loads configuration from environment variables or `.env`
//! - Initializes structured logging/tracing
//! - Connects to PostgreSQL and ensures the schema exists
//! - Runs exactly one collection cycle over all provisioned sensors
//!
//! # Exit codes
//! - `0` once the cycle has run, even if individual sensors failed
//! - non-zero if configuration is missing/invalid or the database cannot be
//!   reached, before any sensor is processed
//!
//! # Environment Variables
//! See [`roomwatch_collector::load_from_env`] for the job configuration, plus:
//! - `COLLECTOR_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `COLLECTOR_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{env, io::IsTerminal, sync::Arc};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use roomwatch_collector::{
    create_schema, load_from_env, Collector, HttpDeviceSource, PgStore, WebhookNotifier,
};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = load_from_env().context("Missing or invalid configuration")?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    tracing::info!("Successfully connected to database");

    create_schema(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let devices = HttpDeviceSource::new(&cfg.api_url, &cfg.api_token, cfg.http_timeout)
        .context("Failed to build device API client")?;
    let notifier = WebhookNotifier::new(&cfg.notify_url, cfg.http_timeout)
        .context("Failed to build notification client")?;

    let collector = Collector::new(
        cfg.sensors.clone(),
        Arc::new(devices),
        store.clone(),
        store,
        Arc::new(notifier),
    )
    .with_default_band(cfg.default_band)
    .with_concurrency(cfg.sensor_concurrency);

    let report = collector.run_cycle().await;

    tracing::info!(
        sensors = report.sensors,
        read_failures = report.read_failures,
        stored = report.stored,
        store_failures = report.store_failures,
        raised = report.raised,
        cleared = report.cleared,
        notify_failures = report.notify_failures,
        "Cycle complete"
    );

    pool.close().await;
    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `COLLECTOR_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, else `COLLECTOR_LOG_LEVEL`
fn init_tracing() {
    // ---
    let span_events = match env::var("COLLECTOR_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("COLLECTOR_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
