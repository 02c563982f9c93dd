//! Retrieval-augmented answering pipeline.
//!
//! Given a query: retrieve the top-k nearest chunks, assemble the
//! prompt, delegate completion to the configured [`CompletionModel`],
//! and return the answer with the provenance of the chunks used.

use std::sync::Arc;

use shopqa_model::CompletionModel;
use tracing::{error, info};

use crate::chunk::Provenance;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::CatalogIndex;

/// The fixed system instruction for the shopping assistant.
pub const SYSTEM_PROMPT: &str = "\
You are an AI shopping assistant for an ecommerce platform. Answer questions \
about products, reviews, and orders based on the provided context.

You can help with:
- Product recommendations and comparisons
- Pricing and availability information
- Customer reviews and ratings
- Product categories and brands
- Recent order trends

Always be helpful, accurate, and specific. If you don't have exact information, \
say so clearly. When recommending products, consider price, rating, and availability.";

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 8;

/// An answer with the provenance of its supporting chunks, in
/// retrieval order.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub provenance: Vec<Provenance>,
}

/// The answering pipeline: embed → retrieve → prompt → complete.
///
/// Construct one via [`AnsweringPipeline::builder()`]. The pipeline
/// holds the current [`CatalogIndex`]; refresh replaces the whole
/// pipeline rather than mutating it.
pub struct AnsweringPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    index: CatalogIndex,
    model: Arc<dyn CompletionModel>,
    top_k: usize,
}

impl std::fmt::Debug for AnsweringPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsweringPipeline")
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl AnsweringPipeline {
    /// Create a new [`AnsweringPipelineBuilder`].
    pub fn builder() -> AnsweringPipelineBuilder {
        AnsweringPipelineBuilder::default()
    }

    /// Number of chunks held by the underlying index.
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// Answer a query from the indexed catalog.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidQuery`] for empty or whitespace-only input.
    /// - [`RagError::AnswerFailed`] if the embedding, retrieval, or
    ///   completion collaborator fails; the underlying cause is carried
    ///   in the message. Never panics.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RagError::InvalidQuery);
        }

        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            RagError::AnswerFailed(e.to_string())
        })?;

        let retrieved = self.index.retrieve(&query_embedding, self.top_k).await.map_err(|e| {
            error!(error = %e, "retrieval failed");
            RagError::AnswerFailed(e.to_string())
        })?;

        let context =
            retrieved.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let provenance: Vec<Provenance> =
            retrieved.iter().map(|r| r.chunk.meta.provenance()).collect();

        let text = self.model.complete(SYSTEM_PROMPT, &context, query).await.map_err(|e| {
            error!(error = %e, "completion failed");
            RagError::AnswerFailed(e.to_string())
        })?;

        info!(retrieved = provenance.len(), "answered query");

        Ok(Answer { text, provenance })
    }
}

/// Builder for constructing an [`AnsweringPipeline`].
#[derive(Default)]
pub struct AnsweringPipelineBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<CatalogIndex>,
    model: Option<Arc<dyn CompletionModel>>,
    top_k: Option<usize>,
}

impl AnsweringPipelineBuilder {
    /// Set the embedding provider used for queries.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the index to retrieve from.
    pub fn index(mut self, index: CatalogIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the completion model.
    pub fn model(mut self, model: Arc<dyn CompletionModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the number of chunks retrieved per query (defaults to
    /// [`DEFAULT_TOP_K`]).
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Build the pipeline, validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or
    /// `top_k` is zero.
    pub fn build(self) -> Result<AnsweringPipeline> {
        let embedder =
            self.embedder.ok_or_else(|| RagError::Config("embedder is required".into()))?;
        let index = self.index.ok_or_else(|| RagError::Config("index is required".into()))?;
        let model = self.model.ok_or_else(|| RagError::Config("model is required".into()))?;
        let top_k = self.top_k.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".into()));
        }
        Ok(AnsweringPipeline { embedder, index, model, top_k })
    }
}
