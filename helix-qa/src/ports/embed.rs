use async_trait::async_trait;

use crate::error::Result;

/// Text to fixed-dimension vector. Implementations must always return
/// `dimension()`-length vectors and surface backend errors as `EmbeddingFailure`.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    /// Output preserves input order and length.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
    fn dimension(&self) -> usize;
    fn model_name(&self) -> &str;
}
