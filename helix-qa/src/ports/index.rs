use crate::domain::{Chunk, ChunkingParams, DocId, IndexEntry, RetrievalResult};
use crate::error::Result;

/// Nearest-neighbour store over chunk embeddings.
///
/// Operations are CPU-bound and synchronous. Mutations are atomic per
/// document: a document's batch either lands in full or not at all.
pub trait VectorIndex: Send + Sync {
    /// Replace every entry of each document present in `entries` with the new batch.
    fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()>;
    /// Remove all entries owned by `doc_id`, returning how many were removed.
    fn delete(&self, doc_id: &DocId) -> Result<usize>;
    /// Top `min(k, len)` chunks by cosine similarity. Empty index yields an empty result.
    fn query(&self, vector: &[f32], k: usize) -> Result<RetrievalResult>;

    fn dimension(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn document_count(&self) -> usize;
    fn document_ids(&self) -> Vec<DocId>;
    /// Version currently indexed for `doc_id`, if any.
    fn document_version(&self, doc_id: &DocId) -> Option<String>;
    /// Chunking parameters the indexed version of `doc_id` was built with.
    fn document_chunking(&self, doc_id: &DocId) -> Option<ChunkingParams>;
    fn chunks_for(&self, doc_id: &DocId) -> Vec<Chunk>;
}
