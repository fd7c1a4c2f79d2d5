//! Doc Service API - DOCX placeholder extraction and filling
//!
//! Provides REST endpoints for:
//! - Placeholder extraction from uploaded DOCX files
//! - Highlighted HTML previews
//! - LLM-generated form schemas (with deterministic fallback)
//! - Writing answer values back into the document

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod error;
mod handlers;
mod models;
mod state;

use state::{AppState, Config};

/// Large enough for a base64-encoded document at the 5 MiB cap plus JSON overhead.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Env vars from a retired Vertex AI integration; they confuse the AI Studio
/// client libraries when both are set.
const DEPRECATED_ENV_VARS: &[&str] = &[
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GOOGLE_CLOUD_PROJECT",
    "GOOGLE_API_KEY",
    "GOOGLE_GENAI_MODEL",
    "GOOGLE_GENAI_USE_VERTEXAI",
];

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Document endpoints
        .route("/parse", post(handlers::parse))
        .route("/to_html", post(handlers::to_html))
        .route("/render", post(handlers::render))
        // Schema generation
        .route("/schema", post(handlers::schema))
        // Dev-only smoke test
        .route("/dev/ai-studio-ping", get(handlers::ai_studio_ping))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    for var in DEPRECATED_ENV_VARS {
        std::env::remove_var(var);
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docfill_api=info".parse()?)
                .add_directive("docfill_llm=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = Config::from_env();
    info!("AI Studio model: {}", config.model);
    if config.api_key.is_none() {
        warn!("AI_STUDIO_API_KEY not configured; /schema endpoint will return 500 until set.");
    }

    let state = Arc::new(AppState::new(config));

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting doc-service API on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
