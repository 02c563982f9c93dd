//! Retrieval-augmented answering over an ecommerce catalog.
//!
//! The crate turns typed catalog records into retrievable chunks
//! ([`synthesize`]), builds a similarity index over them ([`index`]),
//! and answers natural-language questions by retrieving the nearest
//! chunks and delegating completion to a hosted model ([`pipeline`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopqa_rag::{synthesize_all, AnsweringPipeline, IndexBuilder, OpenAiEmbedder};
//!
//! let embedder = Arc::new(OpenAiEmbedder::from_env()?);
//! let chunks = synthesize_all(&records);
//! let index = IndexBuilder::new(embedder.clone()).build(chunks).await?.expect("non-empty");
//! let pipeline = AnsweringPipeline::builder()
//!     .embedder(embedder)
//!     .index(index)
//!     .model(model)
//!     .build()?;
//! let answer = pipeline.answer("best-rated headphones under $100?").await?;
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod synthesize;

pub use chunk::{Chunk, ChunkMeta, Provenance, ScoredChunk};
pub use embedding::{EmbeddingProvider, OpenAiEmbedder};
pub use error::{RagError, Result};
pub use index::{CatalogIndex, InMemoryIndex, IndexBuilder, VectorIndex};
pub use pipeline::{Answer, AnsweringPipeline, AnsweringPipelineBuilder, DEFAULT_TOP_K, SYSTEM_PROMPT};
pub use synthesize::{
    synthesize_all, synthesize_category, synthesize_order_item, synthesize_product,
    synthesize_review,
};
