mod config;
mod db;
mod decision;
mod errors;
mod index;
mod ingest;
mod llm_client;
mod models;
mod routes;
mod state;
mod synthesis;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogFormat};
use crate::db::open_index;
use crate::decision::engine::PromptDecisionEngine;
use crate::ingest::initialize_index;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::synthesis::LlmPromptSynthesizer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparseable values)
    let config = Config::from_env()?;

    init_tracing(&config);

    info!("Starting attribute prompt API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize similarity index
    let index = open_index(config.database_url.as_deref()).await?;
    info!("Similarity index initialized (backend: {})", index.backend_name());

    // Load CSV exports when the index is empty
    initialize_index(index.as_ref(), &config.data_dir).await?;

    // Initialize synthesis backend
    if !config.azure.is_complete() {
        warn!(
            "AZURE_OPENAI_API_KEY or AZURE_OPENAI_ENDPOINT not set. \
             Prompt synthesis will fail until both are provided."
        );
    }
    let llm = LlmClient::new(&config.azure)?;
    info!("LLM client initialized (deployment: {})", llm.deployment());
    let synthesizer = Arc::new(LlmPromptSynthesizer::new(llm));

    // Build app state
    let state = AppState {
        index: index.clone(),
        engine: PromptDecisionEngine::new(index, synthesizer),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down application...");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},tower_http=info",
            env!("CARGO_CRATE_NAME"),
            &config.rust_log
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_file(true)
                    .with_line_number(true)
                    .with_current_span(true),
            )
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
