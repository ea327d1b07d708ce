//! Ollama Generation Backend
//!
//! Implementation of `LlmClient` against the Ollama HTTP API. One request
//! per call, no retry, one wall-clock timeout. Also provides embeddings for
//! the vector knowledge base.

use std::time::Duration;

use agent_core::{
    error::Result,
    llm::{LlmClient, TransportFailure, compose_prompt},
    tool::ToolSchema,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::kb::Embedder;

/// Ollama client configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub host: String,

    /// Generation model name
    pub model: String,

    /// Embedding model name (for the knowledge base)
    pub embedding_model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Wall-clock timeout per request, in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".into(),
            model: "qwen3:0.6b".into(),
            embedding_model: "nomic-embed-text".into(),
            max_tokens: 512,
            temperature: 0.2,
            timeout_secs: 30,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("OLLAMA_HOST").unwrap_or(defaults.host),
            model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            embedding_model: std::env::var("OLLAMA_EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            ..defaults
        }
    }
}

/// Request body for `POST /api/generate`
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// Success response from `/api/generate`; a missing text field is treated
/// as an empty generation, not a transport failure
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Ollama generation backend
pub struct OllamaClient {
    http: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.host.trim_end_matches('/'))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Check that the backend answers at all
    pub async fn health_check(&self) -> bool {
        match self
            .http
            .get(self.endpoint("/api/tags"))
            .timeout(self.timeout())
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                false
            }
        }
    }
}

fn map_transport(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Unavailable(e.to_string())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        context_lines: &[String],
        tools: &[ToolSchema],
    ) -> std::result::Result<String, TransportFailure> {
        let final_prompt = compose_prompt(prompt, context_lines, tools);
        let payload = GenerateRequest {
            model: &self.config.model,
            prompt: &final_prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        tracing::debug!(
            model = %self.config.model,
            tools_offered = !tools.is_empty(),
            prompt_len = final_prompt.len(),
            "calling generation backend"
        );

        let resp = self
            .http
            .post(self.endpoint("/api/generate"))
            .timeout(self.timeout())
            .json(&payload)
            .send()
            .await
            .map_err(map_transport)?
            .error_for_status()
            .map_err(map_transport)?;

        let body: GenerateResponse = resp.json().await.map_err(map_transport)?;
        Ok(body.response.unwrap_or_default())
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let payload = EmbeddingsRequest {
            model: &self.config.embedding_model,
            prompt: text,
        };

        let resp = self
            .http
            .post(self.endpoint("/api/embeddings"))
            .timeout(self.timeout())
            .json(&payload)
            .send()
            .await
            .map_err(map_transport)?
            .error_for_status()
            .map_err(map_transport)?;

        let body: EmbeddingsResponse = resp.json().await.map_err(map_transport)?;
        Ok(body.embedding)
    }
}
