mod action;
mod config;
mod error;
mod gateway;
mod report;
mod server;
mod upstream;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::gateway::Gateway;
use crate::report::TracingReporter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,keyrelay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  GitHub API: {}", config.github.api_url);
    info!("  Telegram API: {}", config.telegram.api_url);
    info!("  Gemini model: {}", config.gemini.model);
    if config.access_code().is_none() {
        warn!("ACCESS_CODE is not set; every proxy request will be refused");
    }
    for (name, missing) in [
        ("GITHUB_TOKEN", config.github.token.is_empty()),
        ("TELEGRAM_TOKEN", config.telegram.bot_token.is_empty()),
        ("GEMINI_API_KEY", config.gemini.api_key.is_empty()),
    ] {
        if missing {
            warn!("{} is not set; its upstream will reject relayed calls", name);
        }
    }

    let gateway = Arc::new(Gateway::new(&config, Arc::new(TracingReporter)));
    let app = server::router(gateway, config.server.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.listen))?;

    info!(
        "Proxy listening on http://{}{}",
        config.server.listen,
        server::PROXY_PATH
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
