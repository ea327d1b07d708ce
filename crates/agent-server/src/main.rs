//! school-agent HTTP Server
//!
//! Axum-based server exposing the conversational assistant plus direct
//! tool routes for weather, calendar and homework lookups.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{Orchestrator, OrchestratorConfig, ToolRegistry};
use agent_runtime::{Embedder, JsonMemoryStore, OllamaClient, VectorKb};
use school_tools::{CalendarTool, HomeworkTool, WeatherTool};

use crate::config::Settings;
use crate::handlers::{ask, health_check, homework, index, kb_add, schedule, weather};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let settings = Settings::from_env();

    // Initialize the LLM backend
    let backend = Arc::new(OllamaClient::from_config(settings.ollama.clone()));

    // Verify Ollama connection
    if backend.health_check().await {
        tracing::info!(model = %settings.ollama.model, "✓ Connected to Ollama");
    } else {
        tracing::warn!("⚠ Ollama not available - agent will degrade to canned replies");
        tracing::warn!("  Make sure Ollama is running: ollama serve");
    }

    // Initialize memory and knowledge base
    let memory = Arc::new(JsonMemoryStore::new(&settings.memory_path));
    let kb = Arc::new(VectorKb::new(
        backend.clone() as Arc<dyn Embedder>,
        &settings.kb_index_path,
    ));
    tracing::info!(documents = kb.len(), "Knowledge base loaded");

    // Initialize tools
    let mut tools = ToolRegistry::new();
    tools.register(WeatherTool::new(settings.weather.clone()));
    tools.register(CalendarTool::new(settings.calendar.clone()));
    tools.register(HomeworkTool::new(settings.sheets.clone()));

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }
    let tools = Arc::new(tools);

    // Build the orchestrator
    let orchestrator = Arc::new(Orchestrator::new(
        backend.clone(),
        tools.clone(),
        memory,
        kb.clone(),
        OrchestratorConfig::default(),
    ));

    // Build application state
    let state = AppState {
        orchestrator,
        tools,
        kb,
        backend,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/ask", post(ask))
        .route("/api/weather", get(weather))
        .route("/api/schedule", get(schedule))
        .route("/api/homework", get(homework))
        .route("/api/kb/add", post(kb_add))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 school-agent server running on http://{}", settings.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       - Health check");
    tracing::info!("  POST /api/ask      - Ask the assistant");
    tracing::info!("  GET  /api/weather  - Current weather");
    tracing::info!("  GET  /api/schedule - Upcoming events");
    tracing::info!("  GET  /api/homework - Homework for today");
    tracing::info!("  POST /api/kb/add   - Index KB documents");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
