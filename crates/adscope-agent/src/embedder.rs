//! Text embedding collaborator.

use std::time::Duration;

use adscope_core::EMBEDDING_DIMENSIONS;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Turns query text into a vector comparable with stored campaign embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AgentError::Embedding`] on any failure. There is no fallback
    /// vector; callers treat this as fatal for the operation at hand.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AgentError>;
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Creates an embedder for `model` at `base_url` (for example
    /// `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Embedding`] if the HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AgentError::Embedding(format!("client build failed: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AgentError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| AgentError::Embedding(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::Embedding(format!(
                "embeddings endpoint returned status {}",
                response.status()
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Embedding(format!("response parse error: {e}")))?;

        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AgentError::Embedding("response contained no embedding".into()))?;

        if embedding.len() != EMBEDDING_DIMENSIONS {
            return Err(AgentError::Embedding(format!(
                "expected {EMBEDDING_DIMENSIONS} dimensions, got {}",
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}
