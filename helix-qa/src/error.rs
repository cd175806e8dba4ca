use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelixQaError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unsupported content: {0}")]
    UnsupportedContent(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("Vector index is empty")]
    EmptyIndex,

    #[error("No documents found")]
    NoContext,

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Generation timed out after {}ms", .0.as_millis())]
    GenerationTimeout(Duration),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HelixQaError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::UnsupportedContent(_) => "unsupported_content",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::EmbeddingFailure(_) => "embedding_failure",
            Self::EmptyIndex => "empty_index",
            Self::NoContext => "no_context",
            Self::GenerationFailure(_) => "generation_failure",
            Self::GenerationTimeout(_) => "generation_timeout",
            Self::DocumentNotFound(_) => "document_not_found",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Http(_) => "http",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }

    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DocumentNotFound(_) => 1,
            Self::EmptyIndex | Self::NoContext => 2,
            Self::InvalidConfiguration(_) | Self::Config(_) => 3,
            Self::UnsupportedContent(_) | Self::UnsupportedFormat(_) => 4,
            Self::EmbeddingFailure(_) => 5,
            Self::GenerationFailure(_) | Self::GenerationTimeout(_) => 6,
            Self::Io(_) | Self::Serialization(_) | Self::Http(_) => 10,
        }
    }

    /// Whether the failure came from the generation step rather than retrieval.
    pub const fn is_generation(&self) -> bool {
        matches!(self, Self::GenerationFailure(_) | Self::GenerationTimeout(_))
    }
}

/// User-facing error shape: a stable kind plus a human message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, HelixQaError>;
