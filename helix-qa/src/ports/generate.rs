use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Produce an answer to `question` grounded in `context`.
    async fn generate(&self, context: &str, question: &str) -> Result<String>;
    fn model_name(&self) -> &str;
}
