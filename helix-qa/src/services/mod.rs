pub mod answer;
pub mod chunker;
pub mod ingestion;
pub mod retrieval;

pub use answer::{AnswerService, AnswerSettings, assemble_context};
pub use chunker::{Chunker, chunk};
pub use ingestion::{IngestionOutcome, IngestionService, SyncReport};
pub use retrieval::RetrievalService;
