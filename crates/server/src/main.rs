//! STORM API Server
//!
//! Axum server exposing the wiki article pipeline: one-shot generation,
//! plaintext article streaming, and the full artifact stream over SSE.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use storm_core::engine::StormEngine;
use storm_core::{AppConfig, PipelineAdapter};

mod api;

/// Application state, shared by every handler.
struct AppState {
    config: Arc<AppConfig>,
    adapter: PipelineAdapter,
}

type SharedState = Arc<AppState>;

#[derive(Parser, Clone)]
#[command(author, version, about = "STORM - Wiki Article Generation API")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the API server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
}

fn app(state: SharedState) -> axum::Router {
    api::router().with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let port = match args.command {
        Some(CliCommand::Serve { port }) => port,
        None => 8000,
    };

    let config = Arc::new(AppConfig::from_env());
    let engine = Arc::new(StormEngine::new(Arc::clone(&config)));
    let state = Arc::new(AppState {
        adapter: PipelineAdapter::new(engine),
        config,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("STORM API listening on http://{addr}");
    tracing::info!("OpenAPI document at http://{addr}/api/v1/openapi.json");

    axum::serve(listener, app(state)).await?;
    Ok(())
}
