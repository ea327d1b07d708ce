//! Knowledge Retrieval
//!
//! Seam for the vector-similarity document retriever. The orchestrator only
//! consumes ranked hits; indexing and embedding live behind the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A retrieved document with its similarity score.
/// Score is a distance: lower is more similar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KbHit {
    pub title: String,
    pub text: String,
    pub score: f32,
}

impl KbHit {
    /// Render as a `KB:` context line for the prompt
    pub fn context_line(&self) -> String {
        format!("KB: {}: {}", self.title, self.text)
    }
}

/// Knowledge retrieval provider.
///
/// Returns the `top_k` semantically closest documents, or an empty sequence
/// when the index is uninitialized.
#[async_trait]
pub trait KnowledgeProvider: Send + Sync {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<KbHit>>;
}

/// Provider with no index; always returns no hits. Useful for tests and
/// deployments without a knowledge base.
pub struct EmptyKb;

#[async_trait]
impl KnowledgeProvider for EmptyKb {
    async fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<KbHit>> {
        Ok(Vec::new())
    }
}
