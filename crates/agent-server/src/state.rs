//! Shared Application State

use std::sync::Arc;

use agent_core::{Orchestrator, ToolRegistry};
use agent_runtime::{OllamaClient, VectorKb};

/// Shared state handed to every axum handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub tools: Arc<ToolRegistry>,
    pub kb: Arc<VectorKb>,
    pub backend: Arc<OllamaClient>,
}
