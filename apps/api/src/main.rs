mod analysis;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod upload;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::service::{CvAnalyzer, LlmCvAnalyzer};
use crate::config::Config;
use crate::llm_client::{LlmClient, LlmConfig};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvmatch v{}", env!("CARGO_PKG_VERSION"));

    let analyzer = build_analyzer(&config)?;

    let state = AppState {
        config: config.clone(),
        analyzer,
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

/// The server still starts without an API key; the analyze route reports it per request.
fn build_analyzer(config: &Config) -> Result<Option<Arc<dyn CvAnalyzer>>> {
    let Some(llm_config) = LlmConfig::from_app_config(config) else {
        warn!("GOOGLE_API_KEY is not set; CV analysis is disabled");
        return Ok(None);
    };

    let llm = LlmClient::new(llm_config)?;
    info!("LLM client initialized (model: {})", llm.model());

    Ok(Some(Arc::new(LlmCvAnalyzer::new(
        llm,
        config.report_language.clone(),
    ))))
}
