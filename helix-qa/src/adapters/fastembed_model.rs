use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{HelixQaError, Result};
use crate::ports::EmbeddingGenerator;

const MODEL_NAME: &str = "all-MiniLM-L6-v2";
const DIMENSION: usize = 384;

/// Local ONNX embeddings via fastembed. Inference runs on the blocking pool.
pub struct FastEmbedder {
    model: Arc<TextEmbedding>,
}

impl FastEmbedder {
    pub fn new() -> Result<Self> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|e| HelixQaError::EmbeddingFailure(e.to_string()))?;
        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl EmbeddingGenerator for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| HelixQaError::EmbeddingFailure("empty fastembed output".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let model = Arc::clone(&self.model);

        tokio::task::spawn_blocking(move || model.embed(owned, None))
            .await
            .map_err(|e| HelixQaError::EmbeddingFailure(e.to_string()))?
            .map_err(|e| HelixQaError::EmbeddingFailure(e.to_string()))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
