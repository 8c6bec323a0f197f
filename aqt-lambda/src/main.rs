//! aqt-lambda - Audio Query Tagging host
//!
//! Serves the tagging pipeline over HTTP:
//! - POST /invoke: request event in, response envelope out
//! - GET /health: liveness and diagnostics

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use aqt_common::config::{resolve_config, ConfigSource};
use aqt_common::media_types::SYSTEM_MIME_TYPES_PATH;
use aqt_common::MediaTypeRegistry;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aqt_lambda::classifier::CommandClassifier;
use aqt_lambda::staging::TempFileStore;
use aqt_lambda::{AppState, RequestPipeline};

/// Command-line arguments for aqt-lambda
#[derive(Parser, Debug)]
#[command(name = "aqt-lambda")]
#[command(about = "Audio query tagging service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "AQT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "AQT_PORT")]
    port: Option<u16>,

    /// Staging directory for decoded payloads (overrides config)
    #[arg(long, env = "AQT_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Classification engine executable (overrides config)
    #[arg(long, env = "AQT_CLASSIFIER")]
    classifier: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolved = resolve_config(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    let mut config = resolved.config;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting aqt-lambda v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &resolved.source {
        ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => {
            info!("Configuration loaded from {}", path.display())
        }
        ConfigSource::Defaults => warn!("No config file found, using compiled defaults"),
        ConfigSource::Degraded { path, reason } => warn!(
            "Ignoring config file {}: {}; using compiled defaults",
            path.display(),
            reason
        ),
    }

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = args.staging_dir {
        config.staging_dir = Some(dir);
    }
    if let Some(command) = args.classifier {
        config.classifier.command = command;
    }

    // Media type registry: built once, read-only from here on
    let mut builder = MediaTypeRegistry::builder();
    match std::fs::read_to_string(SYSTEM_MIME_TYPES_PATH) {
        Ok(table) => builder = builder.merge_mime_types(&table),
        Err(e) => info!("System mime table {} not loaded: {}", SYSTEM_MIME_TYPES_PATH, e),
    }
    let registry = builder
        .with_builtin_types()
        .with_entries(&config.media_types)
        .context("Invalid [media_types] entry in configuration")?
        .build();
    info!("Media type registry: {} content types", registry.len());

    let store = TempFileStore::new(config.staging_dir());
    info!("Staging directory: {}", store.dir().display());

    let classifier = CommandClassifier::from_config(&config.classifier);
    match classifier.locate() {
        Some(path) => info!("Classification engine: {}", path.display()),
        None => warn!(
            "Classification engine '{}' not found; invocations will fail until it is installed",
            classifier.command()
        ),
    }

    let pipeline = RequestPipeline::new(Arc::new(registry), store, Arc::new(classifier));
    let app = aqt_lambda::build_router(AppState::new(pipeline));

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Invoke endpoint: POST http://{}/invoke", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("aqt-lambda stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
