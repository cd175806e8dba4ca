use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{DocId, Document, NewDocument};
use crate::error::Result;
use crate::ports::DocumentRepository;

fn apply(documents: &mut BTreeMap<DocId, Document>, new: NewDocument) -> Document {
    let NewDocument { id, name, content } = new;
    let id = id.unwrap_or_else(DocId::generate);

    let doc = match documents.remove(&id) {
        Some(mut existing) => {
            existing.name = name;
            existing.revise(content);
            existing
        }
        None => Document::with_id(id, name, content),
    };
    documents.insert(doc.id.clone(), doc.clone());
    doc
}

#[derive(Debug, Default)]
pub struct MemoryDocumentRepository {
    documents: RwLock<BTreeMap<DocId, Document>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn get_document(&self, id: &DocId) -> Result<Option<Document>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.read().await.values().cloned().collect())
    }

    async fn save_document(&self, doc: NewDocument) -> Result<Document> {
        Ok(apply(&mut *self.documents.write().await, doc))
    }

    async fn delete_document(&self, id: &DocId) -> Result<bool> {
        Ok(self.documents.write().await.remove(id).is_some())
    }
}

/// Documents persisted as a single JSON file. Writes go through a temp file
/// and rename so a crash never leaves a truncated store.
#[derive(Debug)]
pub struct JsonDocumentRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonDocumentRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<DocId, Document>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let documents: Vec<Document> = serde_json::from_slice(&bytes)?;
                Ok(documents.into_iter().map(|d| (d.id.clone(), d)).collect())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, documents: &BTreeMap<DocId, Document>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let list: Vec<&Document> = documents.values().collect();
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&list)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for JsonDocumentRepository {
    async fn get_document(&self, id: &DocId) -> Result<Option<Document>> {
        Ok(self.load().await?.remove(id))
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.load().await?.into_values().collect())
    }

    async fn save_document(&self, doc: NewDocument) -> Result<Document> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;
        let saved = apply(&mut documents, doc);
        self.store(&documents).await?;
        Ok(saved)
    }

    async fn delete_document(&self, id: &DocId) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;
        if documents.remove(id).is_none() {
            return Ok(false);
        }
        self.store(&documents).await?;
        Ok(true)
    }
}
