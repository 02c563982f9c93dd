//! Document synthesis: catalog records rendered into retrievable chunks.
//!
//! One fixed template per record category, interpolating fields in a
//! fixed order. The mapping is pure and total: every well-formed record
//! produces exactly one chunk, and re-synthesizing the same record
//! always yields byte-identical text. Missing optional fields render as
//! placeholders, never errors.

use shopqa_data::{CategoryRecord, Order, OrderItem, Product, RecordSet, Review};

use crate::chunk::{Chunk, ChunkMeta};

fn date_or(value: Option<chrono::DateTime<chrono::Utc>>, placeholder: &str) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| placeholder.to_string())
}

/// Render one product into a chunk.
pub fn synthesize_product(product: &Product) -> Chunk {
    let status = if product.is_active { "Active" } else { "Inactive" };
    let text = format!(
        "Product: {}\n\
         Description: {}\n\
         Price: ${:.2}\n\
         Category: {}\n\
         Brand: {}\n\
         Rating: {:.1}/5.0\n\
         Stock: {} units available\n\
         Status: {}\n\
         Tags: {}\n\
         Added: {}",
        product.name,
        product.description,
        product.price,
        product.category,
        product.brand,
        product.rating,
        product.stock_quantity,
        status,
        product.tags.join(", "),
        date_or(product.created_at, "unknown"),
    );

    Chunk {
        id: format!("products:{}", product.id),
        text: text.trim().to_string(),
        embedding: Vec::new(),
        meta: ChunkMeta::Product {
            id: product.id,
            category: product.category.clone(),
            brand: product.brand.clone(),
            price: product.price,
            rating: product.rating,
        },
    }
}

/// Render one category into a chunk.
pub fn synthesize_category(category: &CategoryRecord) -> Chunk {
    let text = format!(
        "Category: {}\n\
         Description: {}\n\
         Parent Category: {}",
        category.name,
        category.description,
        category.parent_category.as_deref().unwrap_or("none"),
    );

    Chunk {
        id: format!("categories:{}", category.id),
        text: text.trim().to_string(),
        embedding: Vec::new(),
        meta: ChunkMeta::Category { id: category.id },
    }
}

/// Render one review into a chunk.
pub fn synthesize_review(review: &Review) -> Chunk {
    let verified = if review.verified_purchase { "Yes" } else { "No" };
    let text = format!(
        "Product Review: {}\n\
         Rating: {}/5 stars\n\
         Review: {}\n\
         Reviewer: {}\n\
         Verified Purchase: {}\n\
         Date: {}",
        review.product_name,
        review.rating,
        review.review_text,
        review.reviewer_name,
        verified,
        review.created_at.format("%Y-%m-%d"),
    );

    Chunk {
        id: format!("reviews:{}", review.id),
        text: text.trim().to_string(),
        embedding: Vec::new(),
        meta: ChunkMeta::Review {
            id: review.id,
            product_id: review.product_id,
            rating: review.rating,
            verified: review.verified_purchase,
        },
    }
}

/// Render one order line item into a chunk.
///
/// `line` disambiguates repeated products within a single order so chunk
/// ids stay unique across an index build.
pub fn synthesize_order_item(order: &Order, item: &OrderItem, line: usize) -> Chunk {
    let text = format!(
        "Recent Order Information:\n\
         Product: {}\n\
         Quantity Ordered: {}\n\
         Price: ${:.2} each\n\
         Order Total: ${:.2}\n\
         Order Status: {}\n\
         Order Date: {}\n\
         Customer ID: {}",
        item.product_name,
        item.quantity,
        item.price,
        item.total,
        order.status,
        order.created_at.format("%Y-%m-%d"),
        order.user_id,
    );

    Chunk {
        id: format!("orders:{}:{}:{}", order.id, item.product_id, line),
        text: text.trim().to_string(),
        embedding: Vec::new(),
        meta: ChunkMeta::Order {
            order_id: order.id,
            product_id: item.product_id,
            status: order.status,
        },
    }
}

/// Render a complete record set, in stable order: products, categories,
/// reviews, then one chunk per order line item.
pub fn synthesize_all(records: &RecordSet) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    chunks.extend(records.products.iter().map(synthesize_product));
    chunks.extend(records.categories.iter().map(synthesize_category));
    chunks.extend(records.reviews.iter().map(synthesize_review));
    for order in &records.orders {
        for (line, item) in order.items.iter().enumerate() {
            chunks.push(synthesize_order_item(order, item, line));
        }
    }
    chunks
}
