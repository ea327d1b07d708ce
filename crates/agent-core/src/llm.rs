//! Language Model Client
//!
//! Defines the contract every generation backend implements, plus the prompt
//! assembly shared by all of them. A phase-1 call attaches the tool catalog;
//! a phase-2 call sends the bare prompt. The context block is always bounded
//! to the most recent [`MAX_CONTEXT_LINES`] lines.

use async_trait::async_trait;
use thiserror::Error;

use crate::tool::ToolSchema;

/// Maximum number of context lines ever sent to the generation backend.
pub const MAX_CONTEXT_LINES: usize = 20;

/// A transport-level failure from the generation backend.
///
/// Signaled, never thrown past the client boundary: the orchestrator
/// degrades these to fixed user-facing texts.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TransportFailure {
    /// The single wall-clock timeout elapsed
    #[error("request to LLM timed out")]
    Timeout,

    /// Connection or HTTP-level error
    #[error("LLM service unavailable: {0}")]
    Unavailable(String),
}

impl TransportFailure {
    /// Fixed degraded-service text shown to the user for this failure kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            TransportFailure::Timeout => "Request to LLM timed out. Please try again.",
            TransportFailure::Unavailable(_) => "LLM service unavailable.",
        }
    }
}

/// Contract for text-generation backends.
///
/// One request per call, no retry, bounded by a single wall-clock timeout.
/// On success the implementation returns the raw generated text (empty when
/// the backend response carried no text field).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        context_lines: &[String],
        tools: &[ToolSchema],
    ) -> std::result::Result<String, TransportFailure>;
}

/// Render the tool-usage instruction block for a phase-1 prompt.
///
/// One line per tool: name, description, and the serialized parameter schema.
pub fn tool_instructions(tools: &[ToolSchema]) -> String {
    let tool_list: Vec<String> = tools
        .iter()
        .map(|t| {
            format!(
                "- {}: {}. Parameters: {}",
                t.name,
                t.description,
                t.parameters_json()
            )
        })
        .collect();

    format!(
        "You can use tools to get information. If the user's question requires one of the tools, \
         respond ONLY with a JSON object describing which tool to call in the form: \
         {{\"function\": \"name\", \"arguments\": {{ ... }}}}. \
         If not, respond directly in natural language.\n\nAvailable tools:\n{}",
        tool_list.join("\n")
    )
}

/// Build the outgoing prompt by concatenation, in fixed order:
/// tool instructions (only when tools are offered), the literal prompt text,
/// then a context block of the most recent [`MAX_CONTEXT_LINES`] lines.
pub fn compose_prompt(prompt: &str, context_lines: &[String], tools: &[ToolSchema]) -> String {
    let ctx_text = if context_lines.is_empty() {
        String::new()
    } else {
        let start = context_lines.len().saturating_sub(MAX_CONTEXT_LINES);
        format!("\n\nContext:\n{}", context_lines[start..].join("\n"))
    };

    if tools.is_empty() {
        format!("{prompt}{ctx_text}")
    } else {
        format!("{}\n\nUser:\n{prompt}{ctx_text}", tool_instructions(tools))
    }
}
