//! Session state: the single process-wide handle to the built pipeline.
//!
//! [`QaSession`] owns the current [`AnsweringPipeline`] behind a
//! `tokio::sync::RwLock`. Initialization is lazy; `refresh` regenerates
//! source data and swaps the pipeline as one visible step, so concurrent
//! `answer` calls observe either the fully-old or fully-new index.
//!
//! Fetching and embedding can take minutes at catalog scale, so builds
//! run outside the pipeline lock: a separate gate serializes them, and
//! the write guard is taken only for the final slot swap. Queries keep
//! serving the previous index while a rebuild is in flight.
//!
//! Source and index-build failures are absorbed here and converted to a
//! boolean outcome; they never propagate to the dispatcher as faults.

use std::sync::Arc;

use shopqa_data::{RecordSet, RecordSource, SnapshotStats};
use shopqa_model::CompletionModel;
use shopqa_rag::{
    synthesize_all, Answer, AnsweringPipeline, EmbeddingProvider, IndexBuilder, RagError,
};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

/// Errors surfaced to the dispatcher when answering.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The pipeline has never been successfully built.
    #[error("System not initialized: no catalog index has been built")]
    NotInitialized,

    /// A per-query failure; the stored index is unaffected.
    #[error(transparent)]
    Rag(#[from] RagError),
}

/// The process-wide session owning the answering pipeline.
pub struct QaSession {
    source: Arc<dyn RecordSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn CompletionModel>,
    top_k: usize,
    pipeline: RwLock<Option<Arc<AnsweringPipeline>>>,
    /// Serializes initialization and refresh without blocking readers.
    build_gate: Mutex<()>,
}

impl QaSession {
    pub fn new(
        source: Arc<dyn RecordSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn CompletionModel>,
        top_k: usize,
    ) -> Self {
        Self { source, embedder, model, top_k, pipeline: RwLock::new(None), build_gate: Mutex::new(()) }
    }

    /// Whether a pipeline is currently attached.
    pub async fn is_initialized(&self) -> bool {
        self.pipeline.read().await.is_some()
    }

    /// Fetch → synthesize → build index → attach pipeline.
    ///
    /// Returns `None` when any step fails or yields an empty index; the
    /// cause is logged, never raised.
    async fn build_pipeline(&self, records: RecordSet) -> Option<Arc<AnsweringPipeline>> {
        let chunks = synthesize_all(&records);
        info!(chunk_count = chunks.len(), "synthesized catalog chunks");

        let index = match IndexBuilder::new(self.embedder.clone()).build(chunks).await {
            Ok(Some(index)) => index,
            Ok(None) => {
                warn!("no records to index; session stays uninitialized");
                return None;
            }
            Err(e) => {
                error!(error = %e, "index build failed");
                return None;
            }
        };

        let pipeline = AnsweringPipeline::builder()
            .embedder(self.embedder.clone())
            .index(index)
            .model(self.model.clone())
            .top_k(self.top_k)
            .build();

        match pipeline {
            Ok(pipeline) => Some(Arc::new(pipeline)),
            Err(e) => {
                error!(error = %e, "pipeline construction failed");
                None
            }
        }
    }

    /// Build the pipeline lazily on first use.
    ///
    /// Returns `true` when a usable pipeline is attached afterwards. On
    /// failure the session stays uninitialized and the next call retries.
    pub async fn ensure_initialized(&self) -> bool {
        if self.pipeline.read().await.is_some() {
            return true;
        }

        let _gate = self.build_gate.lock().await;
        if self.pipeline.read().await.is_some() {
            // Another request finished initializing while we waited.
            return true;
        }

        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "record fetch failed during initialization");
                return false;
            }
        };

        match self.build_pipeline(records).await {
            Some(pipeline) => {
                info!(index_len = pipeline.index_len(), "session initialized");
                *self.pipeline.write().await = Some(pipeline);
                true
            }
            None => false,
        }
    }

    /// Regenerate source data and rebuild the index wholesale.
    ///
    /// Returns `true` iff the new index is non-empty and usable. On
    /// failure the previous pipeline is discarded and the session ends
    /// uninitialized; the next query reports `NotInitialized` until a
    /// later initialization or refresh succeeds.
    ///
    /// The rebuild runs outside the pipeline lock; concurrent `answer`
    /// calls keep serving the previous index until the swap.
    pub async fn refresh(&self) -> bool {
        let _gate = self.build_gate.lock().await;

        let records = match self.source.regenerate().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "data regeneration failed during refresh");
                *self.pipeline.write().await = None;
                return false;
            }
        };

        match self.build_pipeline(records).await {
            Some(pipeline) => {
                info!(index_len = pipeline.index_len(), "session refreshed");
                *self.pipeline.write().await = Some(pipeline);
                true
            }
            None => {
                *self.pipeline.write().await = None;
                false
            }
        }
    }

    /// Answer a query with the currently attached pipeline.
    ///
    /// The pipeline reference is snapshotted under a read lock and the
    /// query runs without holding it, so a concurrent refresh cannot
    /// expose a half-built index.
    pub async fn answer(&self, query: &str) -> Result<Answer, SessionError> {
        let pipeline = {
            let slot = self.pipeline.read().await;
            slot.clone().ok_or(SessionError::NotInitialized)?
        };
        Ok(pipeline.answer(query).await?)
    }

    /// Display counts for the landing page, when the source tracks them.
    pub async fn stats(&self) -> Option<SnapshotStats> {
        self.source.stats().await
    }
}
