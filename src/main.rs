//! druid-tasks-exporter
//!
//! Prometheus exporter for Druid task counts per type and status.
//!
//! # Usage
//!
//! ```bash
//! # Point at a router or broker
//! druid-tasks-exporter --druid-uri http://druid-router:8888/druid/v2/sql/
//!
//! # Group on the coarse task status instead of runner_status
//! druid-tasks-exporter --status-column status
//!
//! # Print the merged configuration and exit
//! druid-tasks-exporter --config ./druid_exporter.toml --check-config
//! ```
//!
//! # Environment Variables
//!
//! - `DTE_CONFIG`: Path to a TOML config file
//! - `DTE_LISTEN_ADDRESS`, `DTE_DRUID_URI`, `DTE_STATUS_COLUMN`: field overrides
//! - `RUST_LOG`: Logging filter (wins over `logging.level`)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use druid_tasks_exporter::config::{ConfigOverrides, ExporterConfig, LoggingConfig};
use druid_tasks_exporter::{create_app, ExporterState, LabelUniverse, TaskCollector};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "druid-tasks-exporter")]
#[command(about = "Prometheus exporter for Druid task counts per type and status")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (otherwise $DTE_CONFIG, then ./druid_exporter.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// The address to listen on for HTTP requests (e.g. ":8080")
    #[arg(long, env = "DTE_LISTEN_ADDRESS")]
    listen_address: Option<String>,

    /// The URI to reach Druid's router or broker SQL API
    #[arg(long, env = "DTE_DRUID_URI")]
    druid_uri: Option<String>,

    /// sys.tasks column to group by and use as the status label
    #[arg(long, env = "DTE_STATUS_COLUMN")]
    status_column: Option<String>,

    /// Only emit combinations the query returned; no zero backfill
    #[arg(long)]
    no_zero_fill: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Validate and print the merged configuration, then exit
    #[arg(long)]
    check_config: bool,
}

impl CliArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen_address: self.listen_address.clone(),
            druid_uri: self.druid_uri.clone(),
            status_column: self.status_column.clone(),
            zero_fill: self.no_zero_fill.then_some(false),
            log_json: self.log_json.then_some(true),
        }
    }
}

// ============================================================================
// Startup
// ============================================================================

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn init_logging(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&logging.level))
        .with_target(false);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Config file layer, then CLI/env overrides, then validation.
fn load_config(args: &CliArgs) -> Result<ExporterConfig> {
    let mut config = match &args.config {
        Some(path) => ExporterConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ExporterConfig::load(),
    };
    config.apply_overrides(args.overrides());
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
    token.cancel();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Config loading logs (unknown keys, fallbacks) go through a temporary
    // subscriber until the configured one can be installed.
    let config = {
        let bootstrap = tracing_subscriber::fmt()
            .with_env_filter(env_filter("info"))
            .with_target(false)
            .finish();
        let _guard = tracing::subscriber::set_default(bootstrap);
        load_config(&args)?
    };

    if args.check_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(&config.logging);

    let collector =
        TaskCollector::from_config(&config).context("Failed to build Druid HTTP client")?;

    info!(
        druid_uri = %config.druid.uri,
        status_column = %config.metric.status_column,
        metric = %config.metric.name,
        zero_fill_pairs = collector.universe().map_or(0, LabelUniverse::len),
        "Druid tasks exporter configured"
    );

    let app = create_app(ExporterState::new(collector));

    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {bind_address}"))?;

    info!("The server is listening on {}", config.server.listen_address);

    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await
        .context("HTTP server error")?;

    info!("Graceful shutdown complete");
    Ok(())
}
