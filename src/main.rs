#![doc = include_str!("../README.md")]

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
};

use anyhow::Context;
use phonepe_gateway::{
    config::Config,
    gateway::mask,
    orders::{InMemoryOrderStore, OrderStore, SqliteOrderStore},
    state::AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .init();

    match dotenvy::dotenv() {
        Ok(p) => tracing::info!(path = %p.display(), "Loaded environment variables from .env file"),
        Err(e) => tracing::warn!("Failed to load environment variables from .env: {e}"),
    };

    let config = Config::from_env()
        .inspect_err(|e| tracing::error!("Invalid configuration: {e}"))
        .context("configuration")?;
    tracing::info!(
        merchant_id = %mask::prefix(&config.merchant_id, 5),
        salt_key = "SET",
        salt_index = config.salt.index(),
        callback_url = %config.callback_url(),
        "Loaded configuration"
    );

    let orders: Arc<dyn OrderStore> = match &config.database_url {
        Some(url) => Arc::new(
            SqliteOrderStore::connect(url)
                .await
                .context("order database is not available")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL is not defined, order records are kept in memory");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    let port = config.port;
    let state = AppState::new(Arc::new(config), orders).context("payment processor client")?;
    let app = phonepe_gateway::app(state);

    let listener = tokio::net::TcpListener::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("bind port {port}"))?;

    tracing::info!("Serving on port {port}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
