mod applications;
mod config;
mod db;
mod errors;
mod importer;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applications::store::ApplicationStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::importer::fetcher::HttpPageFetcher;
use crate::importer::pipeline::Importer;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobTrack API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite store
    let db = create_pool(&config.database_url).await?;
    let store = ApplicationStore::new(db);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize page fetcher
    let fetcher = HttpPageFetcher::new(config.fetch_timeout, config.max_page_chars)?;
    info!(
        "Page fetcher initialized (timeout: {:?}, budget: {} chars)",
        config.fetch_timeout, config.max_page_chars
    );

    let importer = Importer::new(Arc::new(fetcher), Arc::new(llm), store.clone());

    // Build app state
    let state = AppState {
        store,
        importer: Arc::new(importer),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
