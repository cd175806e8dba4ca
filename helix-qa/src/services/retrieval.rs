use std::sync::Arc;

use crate::domain::RetrievalResult;
use crate::error::{HelixQaError, Result};
use crate::ports::{EmbeddingGenerator, VectorIndex};

/// Read path: one query embedding, one index lookup. Never touches the corpus.
pub struct RetrievalService<E, I>
where
    E: EmbeddingGenerator + ?Sized,
    I: VectorIndex + ?Sized,
{
    embedder: Arc<E>,
    index: Arc<I>,
}

impl<E, I> RetrievalService<E, I>
where
    E: EmbeddingGenerator + ?Sized,
    I: VectorIndex + ?Sized,
{
    pub const fn new(embedder: Arc<E>, index: Arc<I>) -> Self {
        Self { embedder, index }
    }

    #[tracing::instrument(skip(self, query))]
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(HelixQaError::InvalidConfiguration(
                "k must be at least 1".to_string(),
            ));
        }
        if query.trim().is_empty() {
            return Err(HelixQaError::InvalidConfiguration(
                "query must not be empty".to_string(),
            ));
        }
        if self.index.is_empty() {
            tracing::debug!("Index is empty, skipping query embedding");
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let hits = self.index.query(&embedding, k)?;
        tracing::debug!(hits = hits.len(), "Retrieved chunks");
        Ok(hits)
    }
}
