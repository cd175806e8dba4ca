use async_trait::async_trait;

use crate::domain::{DocId, Document, NewDocument};
use crate::error::Result;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn get_document(&self, id: &DocId) -> Result<Option<Document>>;
    async fn list_documents(&self) -> Result<Vec<Document>>;
    /// Assigns the id (unless replacing) and the version.
    async fn save_document(&self, doc: NewDocument) -> Result<Document>;
    async fn delete_document(&self, id: &DocId) -> Result<bool>;
}
