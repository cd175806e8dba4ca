use crate::error::{HelixQaError, Result};
use crate::ports::{FileKind, TextExtractor};

/// Decodes UTF-8 text and markdown files. Every other kind is unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], kind: &FileKind) -> Result<String> {
        match kind {
            FileKind::PlainText | FileKind::Markdown => std::str::from_utf8(bytes)
                .map(|text| text.trim_start_matches('\u{feff}').to_string())
                .map_err(|e| HelixQaError::UnsupportedContent(format!("not valid UTF-8: {e}"))),
            FileKind::Other(ext) if ext.is_empty() => Err(HelixQaError::UnsupportedFormat(
                "file has no extension; upload a .txt or .md file".to_string(),
            )),
            FileKind::Other(ext) => Err(HelixQaError::UnsupportedFormat(format!(
                ".{ext} files are not supported; upload a .txt or .md file"
            ))),
        }
    }
}
