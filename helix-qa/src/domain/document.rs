use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DocId;

/// A stored document. Owned by the repository; the retrieval core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub name: String,
    pub content: String,
    /// Revision marker: blake3 hash of `content`.
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(DocId::generate(), name, content)
    }

    pub fn with_id(id: DocId, name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            version: content_version(&content),
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the content, bumping the version when it actually changed.
    pub fn revise(&mut self, content: String) {
        let version = content_version(&content);
        if version != self.version {
            self.version = version;
            self.content = content;
            self.updated_at = Utc::now();
        }
    }
}

pub fn content_version(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Input to `DocumentRepository::save_document`; the repository assigns id and version.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Option<DocId>,
    pub name: String,
    pub content: String,
}

impl NewDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn replacing(mut self, id: DocId) -> Self {
        self.id = Some(id);
        self
    }
}
