//! Word-window chunking.
//!
//! Length is measured in whitespace-delimited words. Window `i + 1` starts
//! `window - overlap` words after window `i`; the final window may be short.

use crate::domain::{Chunk, ChunkingParams, DocId};
use crate::error::{HelixQaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    window: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(window: usize, overlap: usize) -> Result<Self> {
        if window == 0 {
            return Err(HelixQaError::InvalidConfiguration(
                "chunk window must be greater than zero".to_string(),
            ));
        }
        if overlap >= window {
            return Err(HelixQaError::InvalidConfiguration(format!(
                "chunk overlap ({overlap}) must be smaller than the window ({window})"
            )));
        }
        Ok(Self { window, overlap })
    }

    pub const fn window(&self) -> usize {
        self.window
    }

    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    pub const fn params(&self) -> ChunkingParams {
        ChunkingParams {
            window: self.window,
            overlap: self.overlap,
        }
    }

    pub fn chunk(&self, doc_id: &DocId, text: &str) -> Vec<Chunk> {
        let words = word_spans(text);
        if words.is_empty() {
            return Vec::new();
        }

        let step = self.window - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.window).min(words.len());
            let start_byte = words[start].0;
            let end_byte = words[end - 1].1;

            chunks.push(Chunk {
                doc_id: doc_id.clone(),
                ordinal: chunks.len(),
                text: text[start_byte..end_byte].to_string(),
                start_byte,
                end_byte,
                overlap: if start == 0 { 0 } else { self.overlap },
            });

            // Anything past this point would only repeat words already covered.
            if end == words.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Chunk `text` with a one-off window configuration.
pub fn chunk(doc_id: &DocId, text: &str, window: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(Chunker::new(window, overlap)?.chunk(doc_id, text))
}

/// Byte ranges of each whitespace-delimited word.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut current: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), current) {
            (true, Some(start)) => {
                spans.push((start, idx));
                current = None;
            }
            (false, None) => current = Some(idx),
            _ => {}
        }
    }
    if let Some(start) = current {
        spans.push((start, text.len()));
    }

    spans
}
