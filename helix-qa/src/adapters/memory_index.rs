//! Exhaustive-scan vector index held in memory.
//!
//! Vectors are L2-normalised on insert and the query is normalised once, so
//! ranking is a plain dot product per entry. No approximate structure is
//! used: results are exact, at O(n * D) per query.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::domain::{Chunk, ChunkingParams, DocId, IndexEntry, RetrievalResult, ScoredChunk};
use crate::error::{HelixQaError, Result};
use crate::ports::VectorIndex;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentEntries {
    doc_id: DocId,
    version: String,
    // Snapshots written before this field existed load as the zero value and get re-chunked.
    #[serde(default)]
    chunking: ChunkingParams,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    fingerprint: String,
    dimension: usize,
    documents: Vec<DocumentEntries>,
}

/// Single reader-writer lock over the whole index: many concurrent queries,
/// one mutation at a time.
#[derive(Debug)]
pub struct MemoryVectorIndex {
    dimension: usize,
    documents: RwLock<BTreeMap<DocId, DocumentEntries>>,
}

impl MemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    /// Write the index to `path` as JSON. `fingerprint` identifies the embedder
    /// that produced the vectors.
    pub fn save_snapshot(&self, path: &Path, fingerprint: &str) -> Result<()> {
        let snapshot = Snapshot {
            fingerprint: fingerprint.to_string(),
            dimension: self.dimension,
            documents: self.read().values().cloned().collect(),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&snapshot)?)?;
        std::fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), entries = self.len(), "Saved index snapshot");
        Ok(())
    }

    /// Load a snapshot. Returns `None` when the file is missing or was written
    /// by a different embedder.
    pub fn load_snapshot(path: &Path, dimension: usize, fingerprint: &str) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let snapshot: Snapshot = serde_json::from_slice(&std::fs::read(path)?)?;
        if snapshot.dimension != dimension || snapshot.fingerprint != fingerprint {
            tracing::warn!(
                path = %path.display(),
                stored = %snapshot.fingerprint,
                expected = %fingerprint,
                "Discarding index snapshot from a different embedder"
            );
            return Ok(None);
        }

        let documents = snapshot
            .documents
            .into_iter()
            .map(|doc| (doc.doc_id.clone(), doc))
            .collect();

        Ok(Some(Self {
            dimension,
            documents: RwLock::new(documents),
        }))
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<DocId, DocumentEntries>> {
        self.documents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<DocId, DocumentEntries>> {
        self.documents.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        if len == self.dimension {
            Ok(())
        } else {
            Err(HelixQaError::EmbeddingFailure(format!(
                "vector has dimension {len}, index expects {}",
                self.dimension
            )))
        }
    }

    /// Validate and normalise one document's batch without touching the index.
    fn prepare(&self, doc_id: DocId, batch: Vec<IndexEntry>) -> Result<DocumentEntries> {
        let version = batch[0].version.clone();
        let chunking = batch[0].chunking;
        let mut ordinals = HashSet::with_capacity(batch.len());
        let mut entries = Vec::with_capacity(batch.len());

        for entry in batch {
            if entry.version != version {
                return Err(HelixQaError::InvalidConfiguration(format!(
                    "batch for {doc_id} mixes versions {version} and {}",
                    entry.version
                )));
            }
            if entry.chunking != chunking {
                return Err(HelixQaError::InvalidConfiguration(format!(
                    "batch for {doc_id} mixes chunking {chunking} and {}",
                    entry.chunking
                )));
            }
            if entry.chunk.doc_id != doc_id || entry.chunk.ordinal != entry.ordinal {
                return Err(HelixQaError::InvalidConfiguration(format!(
                    "entry {} does not match its chunk",
                    entry.chunk.id()
                )));
            }
            if !ordinals.insert(entry.ordinal) {
                return Err(HelixQaError::InvalidConfiguration(format!(
                    "duplicate ordinal {} for {doc_id}",
                    entry.ordinal
                )));
            }
            self.check_dimension(entry.vector.len())?;

            let mut vector = entry.vector;
            if !normalize(&mut vector) {
                return Err(HelixQaError::EmbeddingFailure(format!(
                    "zero or non-finite vector for chunk {}",
                    entry.chunk.id()
                )));
            }
            entries.push(StoredEntry {
                chunk: entry.chunk,
                vector,
            });
        }

        entries.sort_by_key(|e| e.chunk.ordinal);
        Ok(DocumentEntries {
            doc_id,
            version,
            chunking,
            entries,
        })
    }
}

impl VectorIndex for MemoryVectorIndex {
    fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let mut grouped: BTreeMap<DocId, Vec<IndexEntry>> = BTreeMap::new();
        for entry in entries {
            grouped.entry(entry.doc_id.clone()).or_default().push(entry);
        }

        let prepared = grouped
            .into_iter()
            .map(|(doc_id, batch)| self.prepare(doc_id, batch))
            .collect::<Result<Vec<_>>>()?;

        let mut documents = self.write();
        for doc in prepared {
            tracing::debug!(
                doc_id = %doc.doc_id,
                version = %doc.version,
                entries = doc.entries.len(),
                "Upserted document"
            );
            documents.insert(doc.doc_id.clone(), doc);
        }
        Ok(())
    }

    fn delete(&self, doc_id: &DocId) -> Result<usize> {
        Ok(self
            .write()
            .remove(doc_id)
            .map_or(0, |doc| doc.entries.len()))
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<RetrievalResult> {
        self.check_dimension(vector.len())?;

        let documents = self.read();
        if k == 0 || documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = vector.to_vec();
        if !normalize(&mut query) {
            return Err(HelixQaError::EmbeddingFailure(
                "query vector is zero or non-finite".to_string(),
            ));
        }

        let mut hits: Vec<ScoredChunk> = documents
            .values()
            .flat_map(|doc| doc.entries.iter())
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: dot(&query, &entry.vector),
            })
            .collect();
        drop(documents);

        if hits.len() > k {
            hits.select_nth_unstable_by(k - 1, ScoredChunk::rank_cmp);
            hits.truncate(k);
        }
        hits.sort_by(ScoredChunk::rank_cmp);
        Ok(hits)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.read().values().map(|doc| doc.entries.len()).sum()
    }

    fn document_count(&self) -> usize {
        self.read().len()
    }

    fn document_ids(&self) -> Vec<DocId> {
        self.read().keys().cloned().collect()
    }

    fn document_version(&self, doc_id: &DocId) -> Option<String> {
        self.read().get(doc_id).map(|doc| doc.version.clone())
    }

    fn document_chunking(&self, doc_id: &DocId) -> Option<ChunkingParams> {
        self.read().get(doc_id).map(|doc| doc.chunking)
    }

    fn chunks_for(&self, doc_id: &DocId) -> Vec<Chunk> {
        self.read()
            .get(doc_id)
            .map(|doc| doc.entries.iter().map(|e| e.chunk.clone()).collect())
            .unwrap_or_default()
    }
}

/// Scale `v` to unit length in place. Returns false for zero or non-finite input.
fn normalize(v: &mut [f32]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(doc: &str, ordinal: usize, version: &str, vector: Vec<f32>) -> IndexEntry {
        let chunk = Chunk {
            doc_id: DocId::from_string(doc),
            ordinal,
            text: format!("{doc} chunk {ordinal}"),
            start_byte: 0,
            end_byte: 0,
            overlap: 0,
        };
        IndexEntry::new(chunk, vector, version, PARAMS)
    }

    const PARAMS: ChunkingParams = ChunkingParams {
        window: 4,
        overlap: 1,
    };

    fn keys(hits: &[ScoredChunk]) -> Vec<(String, usize)> {
        hits.iter()
            .map(|h| (h.chunk.doc_id.to_string(), h.chunk.ordinal))
            .collect()
    }

    #[test]
    fn test_cosine_via_normalized_dot() {
        let mut a = vec![3.0, 0.0, 0.0];
        let mut b = vec![0.5, 0.0, 0.0];
        let mut c = vec![0.0, 2.0, 0.0];
        assert!(normalize(&mut a) && normalize(&mut b) && normalize(&mut c));

        assert!((dot(&a, &b) - 1.0).abs() < 1e-6);
        assert!(dot(&a, &c).abs() < 1e-6);
        assert!(!normalize(&mut [0.0, 0.0]));
    }

    #[test]
    fn test_empty_index_returns_empty_result() {
        let index = MemoryVectorIndex::new(3);
        assert!(index.is_empty());
        assert!(index.query(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_query_ranks_by_similarity() {
        let index = MemoryVectorIndex::new(2);
        index
            .upsert(vec![
                entry("doc-a", 0, "v1", vec![1.0, 0.0]),
                entry("doc-a", 1, "v1", vec![0.0, 1.0]),
                entry("doc-b", 0, "v1", vec![1.0, 1.0]),
            ])
            .unwrap();

        let hits = index.query(&[10.0, 1.0], 2).unwrap();
        assert_eq!(
            keys(&hits),
            vec![("doc-a".to_string(), 0), ("doc-b".to_string(), 0)]
        );
        assert!(hits[0].score >= hits[1].score);
        assert!((hits[0].score - 0.995_037).abs() < 1e-4);
    }

    #[test]
    fn test_query_length_is_min_k_len() {
        let index = MemoryVectorIndex::new(2);
        index
            .upsert(vec![
                entry("doc-a", 0, "v1", vec![1.0, 0.0]),
                entry("doc-a", 1, "v1", vec![0.0, 1.0]),
            ])
            .unwrap();

        assert_eq!(index.query(&[1.0, 1.0], 10).unwrap().len(), 2);
        assert_eq!(index.query(&[1.0, 1.0], 1).unwrap().len(), 1);
    }

    #[test]
    fn test_ties_break_by_ordinal_then_doc_id() {
        let index = MemoryVectorIndex::new(2);
        index
            .upsert(vec![
                entry("doc-b", 0, "v1", vec![1.0, 0.0]),
                entry("doc-a", 1, "v1", vec![2.0, 0.0]),
                entry("doc-a", 0, "v1", vec![1.0, 0.0]),
                entry("doc-c", 2, "v1", vec![0.0, 1.0]),
            ])
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 4).unwrap();
        assert_eq!(
            keys(&hits),
            vec![
                ("doc-a".to_string(), 0),
                ("doc-b".to_string(), 0),
                ("doc-a".to_string(), 1),
                ("doc-c".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_upsert_replaces_prior_version() {
        let index = MemoryVectorIndex::new(2);
        index
            .upsert(vec![
                entry("doc-a", 0, "v1", vec![1.0, 0.0]),
                entry("doc-a", 1, "v1", vec![0.0, 1.0]),
                entry("doc-a", 2, "v1", vec![1.0, 1.0]),
            ])
            .unwrap();
        index
            .upsert(vec![entry("doc-a", 0, "v2", vec![0.0, 1.0])])
            .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.document_version(&DocId::from_string("doc-a")),
            Some("v2".to_string())
        );
    }

    #[test]
    fn test_failed_batch_leaves_index_untouched() {
        let index = MemoryVectorIndex::new(2);
        index
            .upsert(vec![entry("doc-a", 0, "v1", vec![1.0, 0.0])])
            .unwrap();

        let err = index
            .upsert(vec![
                entry("doc-a", 0, "v2", vec![1.0, 0.0]),
                entry("doc-a", 1, "v2", vec![1.0, 0.0, 0.0]),
            ])
            .unwrap_err();
        assert!(matches!(err, HelixQaError::EmbeddingFailure(_)));
        assert_eq!(
            index.document_version(&DocId::from_string("doc-a")),
            Some("v1".to_string())
        );
        assert_eq!(index.len(), 1);

        let err = index
            .upsert(vec![
                entry("doc-b", 0, "v1", vec![1.0, 0.0]),
                entry("doc-b", 0, "v1", vec![0.0, 1.0]),
            ])
            .unwrap_err();
        assert!(matches!(err, HelixQaError::InvalidConfiguration(_)));
        assert_eq!(index.document_count(), 1);
    }

    #[test]
    fn test_rejects_zero_vectors_and_wrong_query_dimension() {
        let index = MemoryVectorIndex::new(2);
        assert!(
            index
                .upsert(vec![entry("doc-a", 0, "v1", vec![0.0, 0.0])])
                .is_err()
        );
        assert!(index.is_empty());

        index
            .upsert(vec![entry("doc-a", 0, "v1", vec![1.0, 0.0])])
            .unwrap();
        assert!(matches!(
            index.query(&[1.0], 1),
            Err(HelixQaError::EmbeddingFailure(_))
        ));
        assert!(matches!(
            index.query(&[0.0, 0.0], 1),
            Err(HelixQaError::EmbeddingFailure(_))
        ));
    }

    #[test]
    fn test_delete_removes_only_that_document() {
        let index = MemoryVectorIndex::new(2);
        index
            .upsert(vec![
                entry("doc-a", 0, "v1", vec![1.0, 0.0]),
                entry("doc-a", 1, "v1", vec![0.0, 1.0]),
                entry("doc-b", 0, "v1", vec![1.0, 1.0]),
            ])
            .unwrap();

        assert_eq!(index.delete(&DocId::from_string("doc-a")).unwrap(), 2);
        assert_eq!(index.delete(&DocId::from_string("doc-a")).unwrap(), 0);
        assert_eq!(index.document_ids(), vec![DocId::from_string("doc-b")]);
    }

    #[test]
    fn test_snapshot_round_trip_and_fingerprint_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = MemoryVectorIndex::new(2);
        index
            .upsert(vec![
                entry("doc-a", 0, "v1", vec![1.0, 0.0]),
                entry("doc-a", 1, "v1", vec![0.0, 1.0]),
            ])
            .unwrap();
        index.save_snapshot(&path, "hashing-2").unwrap();

        let restored = MemoryVectorIndex::load_snapshot(&path, 2, "hashing-2")
            .unwrap()
            .unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored.chunks_for(&DocId::from_string("doc-a")),
            index.chunks_for(&DocId::from_string("doc-a"))
        );
        assert_eq!(
            restored.document_chunking(&DocId::from_string("doc-a")),
            Some(PARAMS)
        );

        assert!(
            MemoryVectorIndex::load_snapshot(&path, 2, "other-model")
                .unwrap()
                .is_none()
        );
        assert!(
            MemoryVectorIndex::load_snapshot(&dir.path().join("missing.json"), 2, "hashing-2")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        use std::sync::Arc;

        let index = Arc::new(MemoryVectorIndex::new(2));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    let doc = format!("doc-{i}");
                    for version in 0..20 {
                        index
                            .upsert(vec![
                                entry(&doc, 0, &format!("v{version}"), vec![1.0, 0.0]),
                                entry(&doc, 1, &format!("v{version}"), vec![0.0, 1.0]),
                            ])
                            .unwrap();
                        let hits = index.query(&[1.0, 1.0], 100).unwrap();
                        assert!(hits.len() % 2 == 0);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(index.document_count(), 8);
        assert_eq!(index.len(), 16);
    }
}
