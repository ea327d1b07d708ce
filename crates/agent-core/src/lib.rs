//! # agent-core
//!
//! Tool-call orchestration for a question-answering assistant: the model
//! decides per question whether to answer directly or invoke one external
//! information tool, and the orchestrator guarantees a terminal answer
//! either way.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Orchestrator                             │
//! │  ┌──────────┐  ┌─────────┐  ┌────────────┐  ┌────────────┐   │
//! │  │ LlmClient│──│ Parser  │──│ ToolRegistry│  │ Memory/KB  │  │
//! │  │ (phase 1)│  │         │  │ (dispatch)  │  │ providers  │  │
//! │  └──────────┘  └─────────┘  └────────────┘  └────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phase 1 attaches the tool catalog and parses the (possibly malformed)
//! decision; phase 2 finalizes with the tool result in context and no
//! catalog. All failures degrade to fixed texts before reaching the caller.

pub mod error;
pub mod kb;
pub mod llm;
pub mod memory;
pub mod orchestrator;
pub mod parser;
pub mod tool;

pub use error::{AgentError, Result};
pub use kb::{KbHit, KnowledgeProvider};
pub use llm::{LlmClient, TransportFailure};
pub use memory::{MemoryProvider, Role, StoredMessage};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use parser::{ModelReply, ToolCallRequest};
pub use tool::{Dispatch, ParameterSchema, Tool, ToolRegistry, ToolSchema};
