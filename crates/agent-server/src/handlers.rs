//! HTTP Handlers
//!
//! Thin translation layer between HTTP and the orchestrator / tool
//! registry. No agent logic lives here.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use agent_core::Dispatch;
use agent_runtime::Document;

use crate::state::AppState;

/// GET / - route listing
pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "school-agent",
        "routes": {
            "GET /health": "backend connectivity check",
            "POST /api/ask": "ask the assistant { user_id, question }",
            "GET /api/weather?city=": "current weather report",
            "GET /api/schedule": "upcoming calendar events",
            "GET /api/homework": "homework for today",
            "POST /api/kb/add": "index documents { documents: [{id, title, text}] }",
        },
    }))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let ollama_connected = state.backend.health_check().await;
    Json(json!({
        "status": "ok",
        "ollama_connected": ollama_connected,
        "tools": state.tools.names(),
        "kb_documents": state.kb.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub user_id: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// POST /api/ask
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    if req.question.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "question must not be empty".into()));
    }

    let answer = state
        .orchestrator
        .handle_question(&req.user_id, &req.question)
        .await;

    Ok(Json(AskResponse { answer }))
}

/// Dispatch one named tool directly, outside the orchestration loop
async fn run_tool(state: &AppState, name: &str, arguments: Map<String, Value>) -> String {
    match state.tools.dispatch(name, &arguments).await {
        Dispatch::Output(text) | Dispatch::Failed(text) => text,
        Dispatch::NoOp => "Tool is not available.".to_string(),
    }
}

/// GET /api/weather?city=
pub async fn weather(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut arguments = Map::new();
    if let Some(city) = params.get("city") {
        arguments.insert("city".into(), Value::String(city.clone()));
    }
    let report = run_tool(&state, "get_weather", arguments).await;
    Json(json!({ "report": report }))
}

/// GET /api/schedule
pub async fn schedule(State(state): State<AppState>) -> Json<Value> {
    let events = run_tool(&state, "get_upcoming_events", Map::new()).await;
    Json(json!({ "events": events }))
}

/// GET /api/homework
pub async fn homework(State(state): State<AppState>) -> Json<Value> {
    let homework = run_tool(&state, "get_homework_for_today", Map::new()).await;
    Json(json!({ "homework": homework }))
}

#[derive(Debug, Deserialize)]
pub struct KbAddRequest {
    pub documents: Vec<Document>,
}

/// POST /api/kb/add
pub async fn kb_add(
    State(state): State<AppState>,
    Json(req): Json<KbAddRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if req.documents.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "documents must not be empty".into()));
    }

    state
        .kb
        .add_documents(&req.documents)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(json!({ "indexed": req.documents.len(), "total": state.kb.len() })))
}
