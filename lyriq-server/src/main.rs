//! lyriq server binary.
//!
//! Serves synced lyrics from the provider as LRC, SRT, or raw JSON over a
//! small HTTP API. Requires the `SP_DC` session cookie in the environment.

mod api;
mod config;

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> lyriq_core::Result<()> {
    let state = AppState::new(&config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
