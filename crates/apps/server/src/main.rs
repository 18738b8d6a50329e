use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod source;

use config::{Args, ServerConfig};
use routes::AppState;
use source::RepositorySource;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), String> {
    let cfg = ServerConfig::from_env(args)?;
    let source = RepositorySource::new(&cfg.upstream)?;
    let state = AppState {
        source: Arc::new(source),
    };

    let listener = tokio::net::TcpListener::bind(cfg.addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", cfg.addr))?;
    info!(
        upstream = %cfg.upstream.base_url,
        "protein server listening on http://{}",
        cfg.addr
    );
    axum::serve(listener, routes::router(state))
        .await
        .map_err(|e| format!("server error: {e}"))
}
