//! # helix-qa
//!
//! Retrieval-augmented question answering over a local document corpus.
//!
//! Documents are chunked and embedded once, at ingestion time, into an owned
//! [`MemoryVectorIndex`](adapters::MemoryVectorIndex). Questions are answered
//! by embedding the query, taking the top-k chunks by cosine similarity and
//! handing them, in rank order, to a generation model.
//!
//! ```no_run
//! use std::sync::Arc;
//! use helix_qa::adapters::{ChatCompletionsGenerator, HashingEmbedder, MemoryVectorIndex};
//! use helix_qa::domain::Document;
//! use helix_qa::services::{AnswerService, AnswerSettings, Chunker, IngestionService, RetrievalService};
//!
//! # async fn run() -> helix_qa::Result<()> {
//! let embedder = Arc::new(HashingEmbedder::new(384)?);
//! let index = Arc::new(MemoryVectorIndex::new(384));
//!
//! let ingestion = IngestionService::new(embedder.clone(), index.clone(), Chunker::new(200, 40)?)?;
//! ingestion.ingest(&Document::new("sky.txt", "The sky is blue. Grass is green.")).await?;
//!
//! let generator = Arc::new(ChatCompletionsGenerator::new(
//!     "https://api.groq.com/openai/v1",
//!     "llama-3.1-8b-instant",
//!     std::env::var("GROQ_API_KEY").ok(),
//! ));
//! let answers = AnswerService::new(
//!     RetrievalService::new(embedder, index),
//!     generator,
//!     AnswerSettings::default(),
//! )?;
//! let record = answers.answer("What color is grass?").await?;
//! println!("{:?} ({})", record.answer, record.response_time());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{ErrorReport, HelixQaError, Result};
