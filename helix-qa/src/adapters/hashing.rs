use async_trait::async_trait;

use crate::error::{HelixQaError, Result};
use crate::ports::EmbeddingGenerator;

/// Deterministic bag-of-words embedder using feature hashing.
///
/// Each lower-cased alphanumeric token increments one of `dimension` buckets
/// chosen by its blake3 hash. Needs no model download, which makes it the
/// default provider for offline use.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(HelixQaError::InvalidConfiguration(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model_name: format!("hashing-{dimension}"),
        })
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for token in tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let mut prefix = [0u8; 8];
            prefix.copy_from_slice(&hash.as_bytes()[..8]);
            #[allow(clippy::cast_possible_truncation)] // result is < dimension
            let bucket = (u64::from_le_bytes(prefix) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

/// Lower-cased alphanumeric tokens; a word with no alphanumerics is kept verbatim.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(|word| {
        let cleaned: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        if cleaned.is_empty() {
            word.to_string()
        } else {
            cleaned
        }
    })
}

#[async_trait]
impl EmbeddingGenerator for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
