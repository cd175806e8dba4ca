use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{HelixQaError, Result};
use crate::ports::EmbeddingGenerator;

/// Entries kept before the oldest are evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Default)]
struct CacheState {
    vectors: HashMap<blake3::Hash, Vec<f32>>,
    order: VecDeque<blake3::Hash>,
}

impl CacheState {
    fn insert(&mut self, key: blake3::Hash, vector: Vec<f32>, capacity: usize) {
        if self.vectors.insert(key, vector).is_none() {
            self.order.push_back(key);
        }
        while self.vectors.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.vectors.remove(&oldest);
        }
    }
}

/// Memoises embeddings by content hash so unchanged text is never re-embedded
/// within a session. Holds at most `capacity` vectors, evicting oldest first.
pub struct CachedEmbedder<E: EmbeddingGenerator + ?Sized> {
    inner: Arc<E>,
    capacity: usize,
    cache: Mutex<CacheState>,
}

impl<E: EmbeddingGenerator + ?Sized> CachedEmbedder<E> {
    pub fn new(inner: Arc<E>) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<E>, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            cache: Mutex::new(CacheState::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, vector: &[f32]) -> Result<()> {
        if vector.len() == self.inner.dimension() {
            Ok(())
        } else {
            Err(HelixQaError::EmbeddingFailure(format!(
                "{} returned dimension {}, expected {}",
                self.inner.model_name(),
                vector.len(),
                self.inner.dimension()
            )))
        }
    }
}

#[async_trait]
impl<E: EmbeddingGenerator + ?Sized> EmbeddingGenerator for CachedEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = blake3::hash(text.as_bytes());
        if let Some(hit) = self.lock().vectors.get(&key) {
            return Ok(hit.clone());
        }

        let vector = self.inner.embed(text).await?;
        self.check(&vector)?;
        self.lock().insert(key, vector.clone(), self.capacity);
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let keys: Vec<blake3::Hash> = texts.iter().map(|t| blake3::hash(t.as_bytes())).collect();

        // Hits are copied out now: a large batch may evict them before we return.
        let mut found: HashMap<blake3::Hash, Vec<f32>> = HashMap::new();
        let mut misses: Vec<&str> = Vec::new();
        let mut miss_keys: Vec<blake3::Hash> = Vec::new();
        {
            let cache = self.lock();
            let mut seen = HashSet::with_capacity(keys.len());
            for (text, key) in texts.iter().zip(&keys) {
                if !seen.insert(*key) {
                    continue;
                }
                match cache.vectors.get(key) {
                    Some(hit) => {
                        found.insert(*key, hit.clone());
                    }
                    None => {
                        misses.push(*text);
                        miss_keys.push(*key);
                    }
                }
            }
        }

        if !misses.is_empty() {
            tracing::debug!(
                requested = texts.len(),
                misses = misses.len(),
                "Embedding cache misses"
            );
            let vectors = self.inner.embed_batch(&misses).await?;
            if vectors.len() != misses.len() {
                return Err(HelixQaError::EmbeddingFailure(format!(
                    "{} returned {} vectors for {} inputs",
                    self.inner.model_name(),
                    vectors.len(),
                    misses.len()
                )));
            }
            for vector in &vectors {
                self.check(vector)?;
            }

            let mut cache = self.lock();
            for (key, vector) in miss_keys.into_iter().zip(vectors) {
                cache.insert(key, vector.clone(), self.capacity);
                found.insert(key, vector);
            }
        }

        keys.iter()
            .map(|key| {
                found.get(key).cloned().ok_or_else(|| {
                    HelixQaError::EmbeddingFailure("embedding cache lost an entry".to_string())
                })
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
