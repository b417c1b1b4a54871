use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use idhub_auth::RemoteJwtClient;
use idhub_server::{AppState, Cli, IdhubConfig, build_router};
use idhub_store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = IdhubConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply(&mut config);
    config.logging.init().context("initializing logging")?;

    let addr = config.socket_addr()?;
    let store = SqliteStore::open(&config.database.path)
        .with_context(|| format!("opening ledger {}", config.database.path.display()))?;
    let jwt = RemoteJwtClient::new(config.api.clone()).context("building JWT client")?;

    let state = AppState::new(&config, Arc::new(store), Arc::new(jwt));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, version = idhub_server::VERSION, "IDHub server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("IDHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
