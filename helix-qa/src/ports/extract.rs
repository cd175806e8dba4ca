use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Markdown,
    Other(String),
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" | "text" => Self::PlainText,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Other(ext),
        }
    }
}

pub trait TextExtractor: Send + Sync {
    /// Fails with `UnsupportedFormat` for kinds the extractor does not handle.
    fn extract(&self, bytes: &[u8], kind: &FileKind) -> Result<String>;
}
