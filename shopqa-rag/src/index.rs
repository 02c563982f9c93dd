//! Index building and nearest-neighbor retrieval over chunks.
//!
//! [`IndexBuilder`] feeds synthesized chunks to the embedding
//! collaborator and produces a [`CatalogIndex`]. The index is an opaque
//! queryable handle: built once from a complete chunk set, queried many
//! times, replaced wholesale on refresh.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::chunk::{Chunk, ScoredChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Nearest-neighbor search over embedded chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `k` chunks most similar to `embedding`, ordered by
    /// descending score.
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of chunks held by the index.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// An in-memory cosine-similarity index over a fixed chunk set.
///
/// Immutable after construction: refresh replaces the whole index
/// rather than mutating it, so no interior locking is needed.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    chunks: Vec<Chunk>,
}

impl InMemoryIndex {
    /// Build an index holding the given embedded chunks.
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                score: cosine_similarity(&chunk.embedding, embedding),
                chunk: chunk.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// The queryable handle produced by [`IndexBuilder::build`].
#[derive(Clone)]
pub struct CatalogIndex {
    inner: Arc<dyn VectorIndex>,
}

impl CatalogIndex {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { inner: index }
    }

    /// Retrieve the `k` nearest chunks to a query embedding.
    pub async fn retrieve(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        self.inner.search(embedding, k).await
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for CatalogIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogIndex").field("len", &self.len()).finish()
    }
}

/// Builds a [`CatalogIndex`] from synthesized chunks.
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Embed the chunks and build an index over them.
    ///
    /// An empty chunk set yields `Ok(None)` without invoking the
    /// embedding collaborator. Embedding runs in blocks bounded by the
    /// collaborator's [`max_batch_size`](EmbeddingProvider::max_batch_size);
    /// a full catalog exceeds the hosted API's per-request input cap.
    /// Chunks pass through unmodified and in stable order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexBuild`] if the collaborator rejects or
    /// fails on any block; there is no retry.
    pub async fn build(&self, mut chunks: Vec<Chunk>) -> Result<Option<CatalogIndex>> {
        if chunks.is_empty() {
            info!("no chunks to index");
            return Ok(None);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let batch_limit = self.embedder.max_batch_size().max(1);
        let mut embeddings = Vec::with_capacity(texts.len());
        for block in texts.chunks(batch_limit) {
            let batch = self.embedder.embed_batch(block).await.map_err(|e| {
                error!(chunk_count = chunks.len(), error = %e, "embedding failed during index build");
                RagError::IndexBuild(e.to_string())
            })?;
            if batch.len() != block.len() {
                return Err(RagError::IndexBuild(format!(
                    "collaborator returned {} embeddings for {} chunks",
                    batch.len(),
                    block.len()
                )));
            }
            embeddings.extend(batch);
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let chunk_count = chunks.len();
        info!(chunk_count, "built catalog index");

        Ok(Some(CatalogIndex::new(Arc::new(InMemoryIndex::new(chunks)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkMeta;

    struct HashEmbedder {
        dimensions: usize,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(RagError::Embedding {
                    provider: "hash".into(),
                    message: "forced failure".into(),
                });
            }
            let hash =
                text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let mut emb = vec![0.0f32; self.dimensions];
            for (i, v) in emb.iter_mut().enumerate() {
                *v = ((hash.wrapping_add(i as u64)) as f32).sin();
            }
            let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                emb.iter_mut().for_each(|x| *x /= norm);
            }
            Ok(emb)
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    fn chunk(id: i64, text: &str) -> Chunk {
        Chunk {
            id: format!("products:{id}"),
            text: text.into(),
            embedding: Vec::new(),
            meta: ChunkMeta::Product {
                id,
                category: "Electronics".into(),
                brand: "TechPro".into(),
                price: 10.0,
                rating: 4.0,
            },
        }
    }

    #[tokio::test]
    async fn empty_chunk_set_yields_no_index() {
        let builder = IndexBuilder::new(Arc::new(HashEmbedder { dimensions: 8, fail: false }));
        assert!(builder.build(Vec::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn build_attaches_embeddings_and_preserves_order() {
        let builder = IndexBuilder::new(Arc::new(HashEmbedder { dimensions: 8, fail: false }));
        let index = builder
            .build(vec![chunk(1, "first"), chunk(2, "second")])
            .await
            .unwrap()
            .expect("index");
        assert_eq!(index.len(), 2);

        // An exact-text query must rank its own chunk first.
        let embedder = HashEmbedder { dimensions: 8, fail: false };
        let query = embedder.embed("second").await.unwrap();
        let results = index.retrieve(&query, 2).await.unwrap();
        assert_eq!(results[0].chunk.id, "products:2");
    }

    #[tokio::test]
    async fn collaborator_failure_becomes_index_build_error() {
        let builder = IndexBuilder::new(Arc::new(HashEmbedder { dimensions: 8, fail: true }));
        let err = builder.build(vec![chunk(1, "x")]).await.unwrap_err();
        assert!(matches!(err, RagError::IndexBuild(_)));
    }

    /// Returns unit embeddings while recording the size of every batch
    /// it is asked for.
    struct CountingEmbedder {
        batch_sizes: std::sync::Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.batch_sizes.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn max_batch_size(&self) -> usize {
            2048
        }
    }

    #[tokio::test]
    async fn catalog_scale_builds_embed_in_bounded_batches() {
        let embedder = Arc::new(CountingEmbedder { batch_sizes: std::sync::Mutex::new(Vec::new()) });
        let chunks: Vec<Chunk> = (1..=4600).map(|i| chunk(i, &format!("product {i}"))).collect();

        let index = IndexBuilder::new(embedder.clone()).build(chunks).await.unwrap().unwrap();
        assert_eq!(index.len(), 4600);

        // Every request stays under the collaborator's cap; together they
        // cover the whole chunk set in order.
        let sizes = embedder.batch_sizes.lock().unwrap().clone();
        assert_eq!(sizes, vec![2048, 2048, 504]);
    }

    #[tokio::test]
    async fn search_truncates_to_k() {
        let builder = IndexBuilder::new(Arc::new(HashEmbedder { dimensions: 8, fail: false }));
        let chunks = (1..=10).map(|i| chunk(i, &format!("text {i}"))).collect();
        let index = builder.build(chunks).await.unwrap().unwrap();
        let query = vec![0.5f32; 8];
        assert_eq!(index.retrieve(&query, 3).await.unwrap().len(), 3);
    }

    #[test]
    fn zero_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
