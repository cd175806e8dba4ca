//! Concrete implementations of the ports.

pub mod cache;
pub mod chat;
pub mod extract;
#[cfg(feature = "fastembed")]
pub mod fastembed_model;
pub mod hashing;
pub mod memory_index;
pub mod ollama;
pub mod repository;

pub use cache::CachedEmbedder;
pub use chat::ChatCompletionsGenerator;
pub use extract::PlainTextExtractor;
#[cfg(feature = "fastembed")]
pub use fastembed_model::FastEmbedder;
pub use hashing::HashingEmbedder;
pub use memory_index::MemoryVectorIndex;
pub use ollama::OllamaEmbedder;
pub use repository::{JsonDocumentRepository, MemoryDocumentRepository};
