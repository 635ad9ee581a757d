mod config;
mod errors;
mod export;
mod few_shot;
mod generation;
mod llm_client;
mod models;
mod routes;
mod session;
mod source;
mod state;
mod triage;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::ReviewSession;
use crate::source::directory::DirectoryExport;
use crate::source::keboola::KeboolaExport;
use crate::source::TableExport;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting review responder v{}", env!("CARGO_PKG_VERSION"));

    let source = build_source(&config)?;

    // Initialize LLM client
    let mut llm = LlmClient::new(config.openai_api_key.clone(), config.completion_timeout)
        .context("Failed to build completion client")?;
    if let Some(endpoint) = &config.openai_endpoint {
        llm = llm.with_endpoint(endpoint.clone());
    }
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // First load happens at startup, as the selection screen expects reviews.
    let platform = config.source_platform;
    let mut session = ReviewSession::new(platform, config.table_for(platform));
    match session.load(source.as_ref()).await {
        Ok(count) => info!("Initial load: {count} {platform} reviews"),
        Err(e) => warn!("Initial load failed: {e}"),
    }

    let state = AppState {
        session: Arc::new(Mutex::new(session)),
        llm: Arc::new(llm),
        source,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Local CSV directory when DATA_DIR is set, Keboola Storage API otherwise.
fn build_source(config: &Config) -> Result<Arc<dyn TableExport>> {
    if let Some(dir) = &config.data_dir {
        info!("Reading review tables from {dir}");
        return Ok(Arc::new(DirectoryExport::new(dir)));
    }

    let (Some(url), Some(token)) = (&config.kbc_url, &config.kbc_token) else {
        anyhow::bail!("KBC_URL and KBC_TOKEN are required when DATA_DIR is not set");
    };

    let mut export = KeboolaExport::new(url.clone(), token.clone(), config.export_timeout)
        .context("Failed to build Keboola client")?;
    if let Some(limit) = config.export_row_limit {
        export = export.with_row_limit(limit);
    }
    info!("Keboola Storage client initialized ({url})");
    Ok(Arc::new(export))
}
