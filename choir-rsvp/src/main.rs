//! choir-rsvp - choir attendance service
//!
//! Serves the per-event attendance view and accepts member RSVPs, backed by
//! the members and responses sheets of one Google spreadsheet.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use choir_common::config::{ConfigLayer, ServiceConfig};
use choir_rsvp::{build_router, AppState};

/// Command-line overrides; each beats the matching environment variable
#[derive(Debug, Parser)]
#[command(name = "choir-rsvp", version, about = "Choir attendance and RSVP service")]
struct Cli {
    /// TOML config file (default: <config dir>/choir/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Google spreadsheet id
    #[arg(long)]
    spreadsheet_id: Option<String>,

    /// Members sheet range
    #[arg(long)]
    members_range: Option<String>,

    /// Responses sheet range
    #[arg(long)]
    responses_range: Option<String>,

    /// Listen address
    #[arg(long)]
    bind: Option<String>,

    /// Maximum Sheets requests in flight
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Delay before each Sheets request, in milliseconds
    #[arg(long)]
    delay_between_requests_ms: Option<u64>,

    /// Attempt budget for transient Sheets failures
    #[arg(long)]
    max_retries: Option<u32>,

    /// Default log level (RUST_LOG overrides)
    #[arg(long, env = "CHOIR_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            spreadsheet_id: self.spreadsheet_id.clone(),
            members_range: self.members_range.clone(),
            responses_range: self.responses_range.clone(),
            bind: self.bind.clone(),
            max_concurrent: self.max_concurrent,
            delay_between_requests_ms: self.delay_between_requests_ms,
            max_retries: self.max_retries,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    // Log build identification immediately after tracing init
    info!("Starting choir-rsvp v{}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::resolve(cli.overrides(), cli.config.as_deref())
        .context("Failed to load configuration")?;
    info!(
        spreadsheet_id = %config.spreadsheet_id,
        credentials = ?config.credentials,
        max_concurrent = config.max_concurrent,
        delay_ms = config.delay_between_requests.as_millis() as u64,
        max_retries = config.max_retries,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config).context("Failed to create Sheets client")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("choir-rsvp listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
