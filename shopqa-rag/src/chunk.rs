//! The retrievable unit: text plus typed provenance metadata.

use serde::{Deserialize, Serialize};
use shopqa_data::OrderStatus;

/// A retrievable text chunk derived from exactly one catalog record.
///
/// Chunks are immutable once created; the owning index is rebuilt
/// wholesale, never patched. The `embedding` is empty until the index
/// builder attaches one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier within one index build (e.g. `products:42`).
    pub id: String,
    /// Human-readable rendering of the source record.
    pub text: String,
    /// The vector embedding for this chunk's text.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Typed metadata for provenance and filtering.
    pub meta: ChunkMeta,
}

/// Per-category chunk metadata, one case per record kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ChunkMeta {
    #[serde(rename = "products")]
    Product { id: i64, category: String, brand: String, price: f64, rating: f64 },
    #[serde(rename = "categories")]
    Category { id: i64 },
    #[serde(rename = "reviews")]
    Review { id: i64, product_id: i64, rating: i32, verified: bool },
    #[serde(rename = "orders")]
    Order { order_id: i64, product_id: i64, status: OrderStatus },
}

impl ChunkMeta {
    /// The source category name.
    pub fn source(&self) -> &'static str {
        match self {
            ChunkMeta::Product { .. } => "products",
            ChunkMeta::Category { .. } => "categories",
            ChunkMeta::Review { .. } => "reviews",
            ChunkMeta::Order { .. } => "orders",
        }
    }

    /// The identifier of the originating record.
    ///
    /// For order-line chunks this is the order id.
    pub fn record_id(&self) -> i64 {
        match self {
            ChunkMeta::Product { id, .. }
            | ChunkMeta::Category { id, .. }
            | ChunkMeta::Review { id, .. } => *id,
            ChunkMeta::Order { order_id, .. } => *order_id,
        }
    }

    /// The `(source, id)` pair rendered to callers.
    pub fn provenance(&self) -> Provenance {
        Provenance { source: self.source().to_string(), id: self.record_id() }
    }
}

/// Where an answer's supporting chunk came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provenance {
    /// Source category name (`products`, `categories`, `reviews`, `orders`).
    pub source: String,
    /// Identifier of the originating record.
    pub id: i64,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Similarity score (higher is more relevant).
    pub score: f32,
}
