//! # agent-runtime
//!
//! Concrete providers behind the agent-core seams:
//!
//! - **Ollama**: the generation backend (`/api/generate`) and the embedder
//!   (`/api/embeddings`)
//! - **JsonMemoryStore**: file-backed per-user conversation history
//! - **VectorKb**: JSON-persisted brute-force vector retrieval

pub mod kb;
pub mod memory;
pub mod ollama;

pub use kb::{Document, Embedder, VectorKb};
pub use memory::JsonMemoryStore;
pub use ollama::{OllamaClient, OllamaConfig};

// Re-export core types for convenience
pub use agent_core::{
    AgentError, KnowledgeProvider, LlmClient, MemoryProvider, Orchestrator, Result, Tool,
    ToolRegistry,
};
