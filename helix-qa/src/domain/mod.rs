pub mod answer;
pub mod chunk;
pub mod document;
pub mod id;
pub mod search;

pub use answer::{AnswerRecord, AnswerStatus};
pub use chunk::{Chunk, ChunkingParams, IndexEntry};
pub use document::{Document, NewDocument, content_version};
pub use id::{ChunkId, DocId};
pub use search::{RetrievalResult, ScoredChunk};
