use serde::{Deserialize, Serialize};

use super::{ChunkId, DocId};

/// A contiguous window of a document's text, produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: DocId,
    pub ordinal: usize,
    pub text: String,
    pub start_byte: usize,
    pub end_byte: usize,
    /// Words shared with the preceding chunk.
    pub overlap: usize,
}

impl Chunk {
    pub fn id(&self) -> ChunkId {
        ChunkId::for_chunk(&self.doc_id, self.ordinal)
    }
}

/// Window and overlap a document was chunked with. Entries produced under
/// different parameters are not interchangeable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingParams {
    pub window: usize,
    pub overlap: usize,
}

impl std::fmt::Display for ChunkingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w{}o{}", self.window, self.overlap)
    }
}

/// A chunk paired with its embedding, as stored in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
    pub doc_id: DocId,
    pub version: String,
    pub ordinal: usize,
    pub chunking: ChunkingParams,
}

impl IndexEntry {
    pub fn new(
        chunk: Chunk,
        vector: Vec<f32>,
        version: impl Into<String>,
        chunking: ChunkingParams,
    ) -> Self {
        Self {
            doc_id: chunk.doc_id.clone(),
            ordinal: chunk.ordinal,
            version: version.into(),
            chunking,
            chunk,
            vector,
        }
    }
}
