//! # Mediascout Server
//!
//! Finds movies without cover art in the configured media directories and
//! writes the TMDB poster the operator picks next to each file as
//! `{stem}.jpg`, the layout minidlna expects.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediascout_config::{ConfigArgs, ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use mediascout_server::{AppState, create_app};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "mediascout-server")]
#[command(about = "Find movies without covers and fetch them from TMDB")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ConfigLoad { config, warnings } =
        ConfigLoader::with_options(ConfigLoaderOptions {
            config_path: cli.config.config.clone(),
            env_file: cli.config.env_file.clone(),
            overrides: cli.config.overrides(),
        })
        .load()
        .context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!("using configuration from {}", path.display());
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!("{} ({})", warning.message, hint),
            None => warn!("{}", warning.message),
        }
    }
    if let Some(url) = &config.minidlna.url {
        info!("Reporting minidlna status from {}", url);
    }
    if config.minidlna.webhook_url.is_some() {
        info!("minidlna rescans enabled through the Portainer webhook");
    }
    info!(
        "Watching {} directories for extensions [{}]",
        config.media.directories.len(),
        config.media.extensions.join(", ")
    );

    let shutdown = CancellationToken::new();
    let state = AppState::from_config(&config)
        .context("failed to initialise services")?
        .with_shutdown(shutdown.clone());
    let app = create_app(state);

    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("Mediascout listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, finishing in-flight writes");
    shutdown.cancel();
}
