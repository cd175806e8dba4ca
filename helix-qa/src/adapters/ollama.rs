use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{HelixQaError, Result};
use crate::ports::EmbeddingGenerator;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Embeddings from a local Ollama server (`POST /api/embed`).
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimension,
        }
    }

    fn failure(&self, detail: impl std::fmt::Display) -> HelixQaError {
        HelixQaError::EmbeddingFailure(format!("ollama ({}): {detail}", self.model))
    }

    fn validate(&self, response: EmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
        if response.embeddings.len() != expected {
            return Err(self.failure(format!(
                "returned {} embeddings for {expected} inputs",
                response.embeddings.len()
            )));
        }
        if let Some(bad) = response
            .embeddings
            .iter()
            .find(|v| v.len() != self.dimension)
        {
            return Err(self.failure(format!(
                "returned dimension {}, configured {}",
                bad.len(),
                self.dimension
            )));
        }
        Ok(response.embeddings)
    }
}

#[async_trait]
impl EmbeddingGenerator for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or_else(|| self.failure("empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(model = %self.model, count = texts.len(), "Requesting embeddings");

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| self.failure(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.failure(format!("{status}: {body}")));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| self.failure(e))?;
        self.validate(parsed, texts.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
