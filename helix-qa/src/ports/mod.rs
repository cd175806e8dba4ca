pub mod embed;
pub mod extract;
pub mod generate;
pub mod index;
pub mod repository;

pub use embed::EmbeddingGenerator;
pub use extract::{FileKind, TextExtractor};
pub use generate::AnswerGenerator;
pub use index::VectorIndex;
pub use repository::DocumentRepository;
