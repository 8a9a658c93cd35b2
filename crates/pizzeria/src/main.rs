//! Pizzeria - pizza-delivery order service

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{AlgorithmSetting, Config};
use pizzeria_api::{AppState, create_router};
use pizzeria_auth::TokenCodec;
use pizzeria_db::Database;

/// Pizzeria - pizza-delivery order service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "PIZZERIA_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PIZZERIA_PORT")]
    port: Option<u16>,

    /// Database connection URL
    #[arg(long, env = "DB_URI")]
    database_url: Option<String>,

    /// Token signing secret
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Token signing algorithm(s), comma separated
    #[arg(long, env = "ALGORITHM")]
    algorithm: Option<String>,

    /// Access token lifetime in minutes
    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES")]
    access_token_expire_minutes: Option<i64>,

    /// Refresh token lifetime in minutes
    #[arg(long, env = "REFRESH_TOKEN_EXPIRE_MINUTES")]
    refresh_token_expire_minutes: Option<i64>,
}

impl Args {
    /// Command line and environment values win over the config file
    fn apply_to(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        if let Some(secret) = &self.secret_key {
            config.auth.secret_key = secret.clone();
        }
        if let Some(algorithm) = &self.algorithm {
            config.auth.algorithm = AlgorithmSetting::from_list(algorithm);
        }
        if let Some(minutes) = self.access_token_expire_minutes {
            config.auth.access_token_expire_minutes = minutes;
        }
        if let Some(minutes) = self.refresh_token_expire_minutes {
            config.auth.refresh_token_expire_minutes = minutes;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    args.apply_to(&mut config);

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Pizzeria v{}", env!("CARGO_PKG_VERSION"));

    // Token settings are checked before anything else is started
    let token_settings = config.token_settings()?;
    let tokens = Arc::new(TokenCodec::new(&token_settings).context("Invalid token settings")?);

    // Initialize database
    if config.database.url.is_none() {
        if let Some(parent) = Path::new(&config.database.path).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let db = Database::new(&config.database.connection_url()).await?;

    // Install metrics recorder
    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install metrics recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    // Create application state
    let state = AppState::new(db, tokens);

    // Create router
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
