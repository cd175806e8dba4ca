use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::{AnswerRecord, ScoredChunk};
use crate::error::{HelixQaError, Result};
use crate::ports::{AnswerGenerator, EmbeddingGenerator, VectorIndex};
use crate::services::RetrievalService;

const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy)]
pub struct AnswerSettings {
    pub top_k: usize,
    pub timeout: Duration,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct AnswerService<E, I, G>
where
    E: EmbeddingGenerator + ?Sized,
    I: VectorIndex + ?Sized,
    G: AnswerGenerator + ?Sized,
{
    retrieval: RetrievalService<E, I>,
    generator: Arc<G>,
    settings: AnswerSettings,
}

impl<E, I, G> AnswerService<E, I, G>
where
    E: EmbeddingGenerator + ?Sized,
    I: VectorIndex + ?Sized,
    G: AnswerGenerator + ?Sized,
{
    pub fn new(
        retrieval: RetrievalService<E, I>,
        generator: Arc<G>,
        settings: AnswerSettings,
    ) -> Result<Self> {
        if settings.top_k == 0 {
            return Err(HelixQaError::InvalidConfiguration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if settings.timeout.is_zero() {
            return Err(HelixQaError::InvalidConfiguration(
                "generation timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            retrieval,
            generator,
            settings,
        })
    }

    pub const fn retrieval(&self) -> &RetrievalService<E, I> {
        &self.retrieval
    }

    /// Retrieve, assemble context in rank order, and generate a grounded answer.
    ///
    /// With nothing retrieved the generator is not called and a `NoContext`
    /// record is returned. Generator errors and timeouts are returned as
    /// errors; the retrieved chunks are dropped with them.
    #[tracing::instrument(skip(self))]
    pub async fn answer(&self, question: &str) -> Result<AnswerRecord> {
        let started = Instant::now();

        let hits = self.retrieval.retrieve(question, self.settings.top_k).await?;
        if hits.is_empty() {
            tracing::info!("No indexed context, skipping generation");
            return Ok(AnswerRecord::no_context(question, started.elapsed()));
        }

        let context = assemble_context(&hits);
        let generated = tokio::time::timeout(
            self.settings.timeout,
            self.generator.generate(&context, question),
        )
        .await
        .map_err(|_| HelixQaError::GenerationTimeout(self.settings.timeout))?;

        let answer = generated.map_err(|e| match e {
            e @ (HelixQaError::GenerationFailure(_) | HelixQaError::GenerationTimeout(_)) => e,
            other => HelixQaError::GenerationFailure(other.to_string()),
        })?;

        let latency = started.elapsed();
        tracing::info!(
            chunks = hits.len(),
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            model = self.generator.model_name(),
            "Answered question"
        );
        Ok(AnswerRecord::answered(question, answer, hits, latency))
    }
}

/// Chunk texts joined in rank order.
pub fn assemble_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
