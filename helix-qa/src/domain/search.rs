use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Chunk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity between the query and the chunk.
    pub score: f32,
}

impl ScoredChunk {
    /// Ranking order: descending score, then smaller ordinal, then smaller document id.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.chunk.ordinal.cmp(&other.chunk.ordinal))
            .then_with(|| self.chunk.doc_id.cmp(&other.chunk.doc_id))
    }
}

/// Top-k hits in rank order.
pub type RetrievalResult = Vec<ScoredChunk>;
