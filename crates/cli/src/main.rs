use anyhow::Result;
use clap::Parser;
use runny::{AppState, Config, RunnyServer};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Config::parse();

    let shutdown = CancellationToken::new();
    let state = AppState::from_config(&config, shutdown)?;
    let server = RunnyServer::from_config(&config, state).start().await?;

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    server.stop().await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
