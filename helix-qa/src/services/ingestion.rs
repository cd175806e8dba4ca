use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::domain::{DocId, Document, IndexEntry, NewDocument};
use crate::error::{HelixQaError, Result};
use crate::ports::{DocumentRepository, EmbeddingGenerator, VectorIndex};
use crate::services::Chunker;

/// What `ingest` did to the index for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestionOutcome {
    Indexed { chunks: usize },
    Replaced { chunks: usize, previous_version: String },
    Unchanged { chunks: usize },
}

impl IngestionOutcome {
    pub const fn chunks(&self) -> usize {
        match self {
            Self::Indexed { chunks } | Self::Replaced { chunks, .. } | Self::Unchanged { chunks } => {
                *chunks
            }
        }
    }
}

type DocLock = Arc<tokio::sync::Mutex<()>>;

pub struct IngestionService<E, I>
where
    E: EmbeddingGenerator + ?Sized,
    I: VectorIndex + ?Sized,
{
    embedder: Arc<E>,
    index: Arc<I>,
    chunker: Chunker,
    doc_locks: Mutex<HashMap<DocId, DocLock>>,
}

impl<E, I> IngestionService<E, I>
where
    E: EmbeddingGenerator + ?Sized,
    I: VectorIndex + ?Sized,
{
    pub fn new(embedder: Arc<E>, index: Arc<I>, chunker: Chunker) -> Result<Self> {
        if embedder.dimension() != index.dimension() {
            return Err(HelixQaError::InvalidConfiguration(format!(
                "embedder {} produces dimension {}, index expects {}",
                embedder.model_name(),
                embedder.dimension(),
                index.dimension()
            )));
        }
        Ok(Self {
            embedder,
            index,
            chunker,
            doc_locks: Mutex::new(HashMap::new()),
        })
    }

    pub const fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Lock serializing every mutation of one document's entries. Waiters are
    /// served in arrival order.
    fn doc_lock(&self, doc_id: &DocId) -> DocLock {
        let mut locks = self.doc_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(doc_id.clone()).or_default())
    }

    /// Chunk, embed and index one document version. Nothing is written to
    /// the index unless every chunk embedded successfully.
    ///
    /// A version already indexed under the current chunking is left alone.
    /// Concurrent calls for the same document run one after another, so the
    /// last caller's version is the one that stays indexed.
    #[tracing::instrument(skip(self, document), fields(doc_id = %document.id, version = %document.version))]
    pub async fn ingest(&self, document: &Document) -> Result<IngestionOutcome> {
        if document.content.trim().is_empty() {
            return Err(HelixQaError::UnsupportedContent(format!(
                "{} has no text to index",
                document.name
            )));
        }

        let lock = self.doc_lock(&document.id);
        let _guard = lock.lock().await;

        let chunking = self.chunker.params();
        let previous_version = self.index.document_version(&document.id);
        if previous_version.as_deref() == Some(document.version.as_str())
            && self.index.document_chunking(&document.id) == Some(chunking)
        {
            let chunks = self.index.chunks_for(&document.id).len();
            tracing::debug!(chunks, "Document version already indexed");
            return Ok(IngestionOutcome::Unchanged { chunks });
        }

        let chunks = self.chunker.chunk(&document.id, &document.content);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(HelixQaError::EmbeddingFailure(format!(
                "{} returned {} vectors for {} chunks",
                self.embedder.model_name(),
                vectors.len(),
                chunks.len()
            )));
        }

        let count = chunks.len();
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                IndexEntry::new(chunk, vector, document.version.clone(), chunking)
            })
            .collect();
        self.index.upsert(entries)?;

        tracing::info!(name = %document.name, chunks = count, %chunking, "Indexed document");
        Ok(match previous_version {
            Some(previous_version) => IngestionOutcome::Replaced {
                chunks: count,
                previous_version,
            },
            None => IngestionOutcome::Indexed { chunks: count },
        })
    }

    /// Save a document to `repo` and index it. If indexing fails the
    /// repository is put back as it was: a new document is deleted, a
    /// replaced one gets its previous content back.
    pub async fn add_document<R>(&self, repo: &R, new: NewDocument) -> Result<(Document, IngestionOutcome)>
    where
        R: DocumentRepository + ?Sized,
    {
        let previous = match &new.id {
            Some(id) => repo.get_document(id).await?,
            None => None,
        };

        let document = repo.save_document(new).await?;
        match self.ingest(&document).await {
            Ok(outcome) => Ok((document, outcome)),
            Err(err) => {
                let rollback = match previous {
                    Some(prev) => repo
                        .save_document(NewDocument::new(prev.name, prev.content).replacing(prev.id))
                        .await
                        .map(|_| ()),
                    None => repo.delete_document(&document.id).await.map(|_| ()),
                };
                if let Err(rollback_err) = rollback {
                    tracing::error!(
                        doc_id = %document.id,
                        error = %rollback_err,
                        "Failed to roll back document after ingestion error"
                    );
                }
                Err(err)
            }
        }
    }

    /// Drop a document's entries from the index.
    pub async fn remove(&self, doc_id: &DocId) -> Result<usize> {
        let lock = self.doc_lock(doc_id);
        let removed = {
            let _guard = lock.lock().await;
            self.index.delete(doc_id)?
        };
        drop(lock);

        // Lock handles are only cloned under the map lock, so a count of one means no waiters.
        let mut locks = self.doc_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(doc_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(doc_id);
        }
        drop(locks);

        tracing::info!(%doc_id, removed, "Removed document from index");
        Ok(removed)
    }

    /// Bring the index in line with the repository: ingest new or changed
    /// documents, skip unchanged ones, and drop entries of documents that no
    /// longer exist. Per-document failures are collected, not fatal.
    pub async fn sync<R>(&self, repo: &R) -> Result<SyncReport>
    where
        R: DocumentRepository + ?Sized,
    {
        let documents = repo.list_documents().await?;
        let mut report = SyncReport::default();

        for document in &documents {
            match self.ingest(document).await {
                Ok(IngestionOutcome::Indexed { .. }) => report.documents_indexed += 1,
                Ok(IngestionOutcome::Replaced { .. }) => report.documents_replaced += 1,
                Ok(IngestionOutcome::Unchanged { .. }) => report.documents_unchanged += 1,
                Err(e) => {
                    tracing::warn!(doc_id = %document.id, error = %e, "Failed to ingest document");
                    report.errors.push(format!("{} ({}): {e}", document.name, document.id));
                }
            }
        }

        let live: HashSet<&DocId> = documents.iter().map(|d| &d.id).collect();
        for doc_id in self.index.document_ids() {
            if !live.contains(&doc_id) {
                self.remove(&doc_id).await?;
                report.documents_removed += 1;
            }
        }

        report.entries = self.index.len();
        tracing::info!(
            indexed = report.documents_indexed,
            replaced = report.documents_replaced,
            unchanged = report.documents_unchanged,
            removed = report.documents_removed,
            failed = report.errors.len(),
            "Sync complete"
        );
        Ok(report)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub documents_indexed: usize,
    pub documents_replaced: usize,
    pub documents_unchanged: usize,
    pub documents_removed: usize,
    pub entries: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::adapters::{HashingEmbedder, MemoryDocumentRepository, MemoryVectorIndex};

    /// Counts texts embedded, fails on any text containing `poison` and
    /// stalls on any text containing `slow`.
    struct Tally {
        inner: HashingEmbedder,
        embedded: AtomicUsize,
        poison: Option<&'static str>,
        slow: Option<&'static str>,
    }

    impl Tally {
        fn new(poison: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                inner: HashingEmbedder::new(32).unwrap(),
                embedded: AtomicUsize::new(0),
                poison,
                slow: None,
            })
        }

        fn stalling_on(word: &'static str) -> Arc<Self> {
            Arc::new(Self {
                inner: HashingEmbedder::new(32).unwrap(),
                embedded: AtomicUsize::new(0),
                poison: None,
                slow: Some(word),
            })
        }
    }

    #[async_trait]
    impl EmbeddingGenerator for Tally {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.embed_batch(&[text]).await.map(|mut v| v.remove(0))
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            if let Some(poison) = self.poison
                && texts.iter().any(|t| t.contains(poison))
            {
                return Err(HelixQaError::EmbeddingFailure("malformed chunk".to_string()));
            }
            if let Some(slow) = self.slow
                && texts.iter().any(|t| t.contains(slow))
            {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
            self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn model_name(&self) -> &str {
            "tally"
        }
    }

    fn service(embedder: Arc<Tally>) -> (IngestionService<Tally, MemoryVectorIndex>, Arc<MemoryVectorIndex>) {
        let index = Arc::new(MemoryVectorIndex::new(32));
        let service =
            IngestionService::new(embedder, Arc::clone(&index), Chunker::new(4, 1).unwrap()).unwrap();
        (service, index)
    }

    const TEXT: &str = "one two three four five six seven eight nine ten";

    #[tokio::test]
    async fn test_ingest_twice_is_idempotent() {
        let tally = Tally::new(None);
        let (service, index) = service(Arc::clone(&tally));
        let doc = Document::new("numbers.txt", TEXT);

        let first = service.ingest(&doc).await.unwrap();
        let entries = index.len();
        let embedded = tally.embedded.load(Ordering::SeqCst);

        let second = service.ingest(&doc).await.unwrap();

        assert_eq!(first, IngestionOutcome::Indexed { chunks: 3 });
        assert_eq!(second, IngestionOutcome::Unchanged { chunks: 3 });
        assert_eq!(index.len(), entries);
        assert_eq!(tally.embedded.load(Ordering::SeqCst), embedded);
    }

    #[tokio::test]
    async fn test_new_version_supersedes() {
        let (service, index) = service(Tally::new(None));
        let mut doc = Document::new("numbers.txt", TEXT);
        service.ingest(&doc).await.unwrap();
        let v1 = doc.version.clone();

        doc.revise("eleven twelve".to_string());
        let outcome = service.ingest(&doc).await.unwrap();

        assert_eq!(
            outcome,
            IngestionOutcome::Replaced {
                chunks: 1,
                previous_version: v1
            }
        );
        let chunks = index.chunks_for(&doc.id);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "eleven twelve");
        assert_eq!(index.document_version(&doc.id), Some(doc.version.clone()));
    }

    #[tokio::test]
    async fn test_empty_content_is_unsupported_and_not_indexed() {
        let (service, index) = service(Tally::new(None));
        let doc = Document::new("blank.txt", " \n ");

        let err = service.ingest(&doc).await.unwrap_err();
        assert!(matches!(err, HelixQaError::UnsupportedContent(_)));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_no_entries() {
        let (service, index) = service(Tally::new(Some("seven")));
        let doc = Document::new("numbers.txt", TEXT);

        let err = service.ingest(&doc).await.unwrap_err();
        assert!(matches!(err, HelixQaError::EmbeddingFailure(_)));
        assert!(index.chunks_for(&doc.id).is_empty());
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_keeps_previous_version() {
        let (service, index) = service(Tally::new(Some("poison")));
        let mut doc = Document::new("numbers.txt", TEXT);
        service.ingest(&doc).await.unwrap();
        let v1 = doc.version.clone();

        doc.revise("now with poison inside".to_string());
        assert!(service.ingest(&doc).await.is_err());
        assert_eq!(index.document_version(&doc.id), Some(v1));
        assert_eq!(index.len(), 3);
    }

    #[tokio::test]
    async fn test_sync_reconciles_with_repository() {
        let (service, index) = service(Tally::new(Some("poison")));
        let repo = MemoryDocumentRepository::new();

        let kept = repo.save_document(NewDocument::new("a.txt", TEXT)).await.unwrap();
        let dropped = repo.save_document(NewDocument::new("b.txt", "alpha beta")).await.unwrap();
        repo.save_document(NewDocument::new("c.txt", "poison pill")).await.unwrap();

        let first = service.sync(&repo).await.unwrap();
        assert_eq!(first.documents_indexed, 2);
        assert_eq!(first.errors.len(), 1);

        repo.delete_document(&dropped.id).await.unwrap();
        let second = service.sync(&repo).await.unwrap();

        assert_eq!(second.documents_unchanged, 1);
        assert_eq!(second.documents_removed, 1);
        assert_eq!(index.document_ids(), vec![kept.id]);
        assert_eq!(second.entries, 3);
    }

    #[test]
    fn test_dimension_mismatch_rejected_at_construction() {
        let index = Arc::new(MemoryVectorIndex::new(8));
        let result = IngestionService::new(Tally::new(None), index, Chunker::new(4, 1).unwrap());
        assert!(matches!(result, Err(HelixQaError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_concurrent_ingests_of_one_document_keep_the_later_version() {
        let index = Arc::new(MemoryVectorIndex::new(32));
        let service = Arc::new(
            IngestionService::new(
                Tally::stalling_on("first"),
                Arc::clone(&index),
                Chunker::new(4, 1).unwrap(),
            )
            .unwrap(),
        );
        let id = DocId::generate();
        let v1 = Document::with_id(id.clone(), "draft.txt", "first draft");
        let v2 = Document::with_id(id.clone(), "draft.txt", "second draft");

        let earlier = {
            let service = Arc::clone(&service);
            let v1 = v1.clone();
            tokio::spawn(async move { service.ingest(&v1).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let later = service.ingest(&v2).await.unwrap();
        let earlier = earlier.await.unwrap().unwrap();

        assert_eq!(earlier, IngestionOutcome::Indexed { chunks: 1 });
        assert_eq!(
            later,
            IngestionOutcome::Replaced {
                chunks: 1,
                previous_version: v1.version.clone()
            }
        );
        assert_eq!(index.document_version(&id), Some(v2.version.clone()));
        assert_eq!(index.chunks_for(&id)[0].text, "second draft");
    }

    #[tokio::test]
    async fn test_changed_chunking_reindexes_same_version() {
        let tally = Tally::new(None);
        let (service, index) = service(Arc::clone(&tally));
        let doc = Document::new("numbers.txt", TEXT);
        service.ingest(&doc).await.unwrap();

        let rechunked =
            IngestionService::new(tally, Arc::clone(&index), Chunker::new(2, 0).unwrap()).unwrap();
        let outcome = rechunked.ingest(&doc).await.unwrap();

        assert_eq!(
            outcome,
            IngestionOutcome::Replaced {
                chunks: 5,
                previous_version: doc.version.clone()
            }
        );
        let texts: Vec<String> = index.chunks_for(&doc.id).into_iter().map(|c| c.text).collect();
        assert_eq!(
            texts,
            vec!["one two", "three four", "five six", "seven eight", "nine ten"]
        );
        assert_eq!(
            index.document_chunking(&doc.id),
            Some(Chunker::new(2, 0).unwrap().params())
        );
        assert_eq!(
            rechunked.ingest(&doc).await.unwrap(),
            IngestionOutcome::Unchanged { chunks: 5 }
        );
    }

    #[tokio::test]
    async fn test_add_document_rolls_back_new_document_on_failure() {
        let (service, index) = service(Tally::new(Some("poison")));
        let repo = MemoryDocumentRepository::new();

        let err = service
            .add_document(&repo, NewDocument::new("bad.txt", "poison pill"))
            .await
            .unwrap_err();

        assert!(matches!(err, HelixQaError::EmbeddingFailure(_)));
        assert!(repo.list_documents().await.unwrap().is_empty());
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_add_document_restores_replaced_content_on_failure() {
        let (service, index) = service(Tally::new(Some("poison")));
        let repo = MemoryDocumentRepository::new();
        let (original, outcome) = service
            .add_document(&repo, NewDocument::new("numbers.txt", TEXT))
            .await
            .unwrap();
        assert_eq!(outcome, IngestionOutcome::Indexed { chunks: 3 });

        let replacement = NewDocument::new("numbers.txt", "now with poison").replacing(original.id.clone());
        assert!(service.add_document(&repo, replacement).await.is_err());

        let stored = repo.get_document(&original.id).await.unwrap().unwrap();
        assert_eq!(stored.content, TEXT);
        assert_eq!(stored.version, original.version);
        assert_eq!(index.document_version(&original.id), Some(original.version));
    }

    #[tokio::test]
    async fn test_remove_then_reingest() {
        let (service, index) = service(Tally::new(None));
        let doc = Document::new("numbers.txt", TEXT);
        service.ingest(&doc).await.unwrap();

        assert_eq!(service.remove(&doc.id).await.unwrap(), 3);
        assert!(index.is_empty());
        assert_eq!(
            service.ingest(&doc).await.unwrap(),
            IngestionOutcome::Indexed { chunks: 3 }
        );
    }
}
