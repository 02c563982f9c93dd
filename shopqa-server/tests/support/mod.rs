//! Shared stub collaborators for server tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shopqa_data::{
    Order, OrderItem, OrderStatus, Product, RecordSet, Review, SourceError,
};
use shopqa_model::CompletionModel;
use shopqa_rag::{EmbeddingProvider, RagError};

/// Deterministic hash-based embedder.
pub struct HashEmbedder {
    /// Calls fail once this many embed batches have run (usize::MAX = never).
    pub fail_after: AtomicUsize,
}

impl HashEmbedder {
    pub fn reliable() -> Arc<Self> {
        Arc::new(Self { fail_after: AtomicUsize::new(usize::MAX) })
    }

    /// Succeeds for `n` batch calls, then fails deterministically.
    pub fn failing_after(n: usize) -> Arc<Self> {
        Arc::new(Self { fail_after: AtomicUsize::new(n) })
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> shopqa_rag::Result<Vec<f32>> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb: Vec<f32> = (0..16).map(|i| ((hash.wrapping_add(i)) as f32).sin()).collect();
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    async fn embed_batch(&self, texts: &[&str]) -> shopqa_rag::Result<Vec<Vec<f32>>> {
        let remaining = self.fail_after.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(RagError::Embedding {
                provider: "stub".into(),
                message: "deterministic failure".into(),
            });
        }
        if remaining != usize::MAX {
            self.fail_after.store(remaining - 1, Ordering::SeqCst);
        }
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        16
    }
}

/// Completion stub that echoes the input.
pub struct EchoModel;

#[async_trait]
impl CompletionModel for EchoModel {
    async fn complete(
        &self,
        _system: &str,
        _context: &str,
        input: &str,
    ) -> shopqa_model::Result<String> {
        Ok(format!("echo: {input}"))
    }
}

/// Record source serving a fixed set, optionally a different one after
/// `regenerate`.
pub struct StubSource {
    pub initial: RecordSet,
    pub after_refresh: RecordSet,
    pub regenerations: AtomicUsize,
}

impl StubSource {
    pub fn fixed(records: RecordSet) -> Arc<Self> {
        Arc::new(Self {
            after_refresh: records.clone(),
            initial: records,
            regenerations: AtomicUsize::new(0),
        })
    }

    pub fn switching(initial: RecordSet, after_refresh: RecordSet) -> Arc<Self> {
        Arc::new(Self { initial, after_refresh, regenerations: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl shopqa_data::RecordSource for StubSource {
    async fn fetch(&self) -> Result<RecordSet, SourceError> {
        if self.regenerations.load(Ordering::SeqCst) > 0 {
            Ok(self.after_refresh.clone())
        } else {
            Ok(self.initial.clone())
        }
    }

    async fn regenerate(&self) -> Result<RecordSet, SourceError> {
        self.regenerations.fetch_add(1, Ordering::SeqCst);
        Ok(self.after_refresh.clone())
    }
}

/// A small but complete record set with product ids offset by `base`.
pub fn small_records(base: i64) -> RecordSet {
    let created = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    let products: Vec<Product> = (0..3)
        .map(|i| Product {
            id: base + i,
            name: format!("TechPro Gadget {}", base + i),
            description: "High-quality gadget from TechPro.".into(),
            category: "Electronics".into(),
            brand: "TechPro".into(),
            price: 49.99,
            rating: 4.5,
            stock_quantity: 10,
            is_active: true,
            created_at: Some(created),
            tags: vec!["bestseller".into()],
        })
        .collect();

    RecordSet {
        reviews: vec![Review {
            id: base,
            product_id: base,
            product_name: products[0].name.clone(),
            rating: 5,
            review_text: "Great product! Highly recommended.".into(),
            reviewer_name: "Customer1234".into(),
            verified_purchase: true,
            created_at: created,
        }],
        orders: vec![Order {
            id: base,
            user_id: 7,
            items: vec![OrderItem {
                product_id: base,
                product_name: products[0].name.clone(),
                quantity: 1,
                price: 49.99,
                total: 49.99,
            }],
            total_amount: 49.99,
            status: OrderStatus::Delivered,
            created_at: created,
        }],
        products,
        categories: Vec::new(),
    }
}
