//! Session lifecycle tests: lazy initialization, refresh, and failure
//! absorption.

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shopqa_data::{fixture, FixtureSource, RecordSet, RecordSource};
use shopqa_rag::EmbeddingProvider;
use shopqa_server::{QaSession, SessionError};
use support::{EchoModel, HashEmbedder, StubSource};
use tokio::sync::Notify;

fn session_with(
    source: Arc<dyn RecordSource>,
    embedder: Arc<support::HashEmbedder>,
) -> QaSession {
    QaSession::new(source, embedder, Arc::new(EchoModel), 5)
}

#[tokio::test]
async fn empty_source_leaves_session_uninitialized() {
    let source = StubSource::fixed(RecordSet::default());
    let session = session_with(source, HashEmbedder::reliable());

    assert!(!session.ensure_initialized().await);
    assert!(!session.is_initialized().await);

    let err = session.answer("test").await.unwrap_err();
    assert!(matches!(err, SessionError::NotInitialized));
}

#[tokio::test]
async fn initialization_is_lazy_and_retried() {
    // Build fails on the very first embed batch, then succeeds.
    let embedder = HashEmbedder::failing_after(0);
    let source = StubSource::fixed(support::small_records(1));
    let session = session_with(source, embedder.clone());

    assert!(!session.ensure_initialized().await);
    assert!(!session.is_initialized().await);

    embedder.fail_after.store(usize::MAX, std::sync::atomic::Ordering::SeqCst);
    assert!(session.ensure_initialized().await);
    assert!(session.is_initialized().await);
}

#[tokio::test]
async fn answer_returns_provenance_from_indexed_records() {
    let source = StubSource::fixed(support::small_records(1));
    let session = session_with(source, HashEmbedder::reliable());

    let answer = session.answer("what gadgets are available?").await;
    // Lazy init has not run yet; answer goes through ensure first.
    assert!(matches!(answer.unwrap_err(), SessionError::NotInitialized));

    assert!(session.ensure_initialized().await);
    let answer = session.answer("what gadgets are available?").await.unwrap();
    assert!(answer.text.starts_with("echo:"));
    assert!(!answer.provenance.is_empty());
    assert!(answer.provenance.len() <= 5);
}

#[tokio::test]
async fn refresh_swaps_to_new_data_with_no_stale_provenance() {
    let source = StubSource::switching(support::small_records(1), support::small_records(101));
    let session = session_with(source, HashEmbedder::reliable());

    assert!(session.ensure_initialized().await);
    let before = session.answer("gadget").await.unwrap();
    assert!(before.provenance.iter().all(|p| p.id < 100));

    assert!(session.refresh().await);
    let after = session.answer("gadget").await.unwrap();
    assert!(!after.provenance.is_empty());
    assert!(
        after.provenance.iter().all(|p| p.id >= 100),
        "stale chunks leaked into provenance: {:?}",
        after.provenance
    );
}

/// Delegates to [`HashEmbedder`] but, once gated, parks batch calls
/// until released so a rebuild can be held mid-flight.
struct GatedEmbedder {
    inner: Arc<HashEmbedder>,
    gated: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HashEmbedder::reliable(),
            gated: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GatedEmbedder {
    async fn embed(&self, text: &str) -> shopqa_rag::Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> shopqa_rag::Result<Vec<Vec<f32>>> {
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

#[tokio::test]
async fn answers_keep_serving_old_index_while_refresh_rebuilds() {
    let embedder = GatedEmbedder::new();
    let source = StubSource::switching(support::small_records(1), support::small_records(101));
    let session =
        Arc::new(QaSession::new(source, embedder.clone(), Arc::new(EchoModel), 5));

    assert!(session.ensure_initialized().await);

    embedder.gated.store(true, Ordering::SeqCst);
    let refresher = tokio::spawn({
        let session = session.clone();
        async move { session.refresh().await }
    });
    embedder.entered.notified().await;

    // The rebuild is parked inside its embed batch; queries must not
    // stall behind it and still see the pre-refresh data.
    let during = session.answer("gadget").await.unwrap();
    assert!(during.provenance.iter().all(|p| p.id < 100));

    embedder.gated.store(false, Ordering::SeqCst);
    embedder.release.notify_one();
    assert!(refresher.await.unwrap());

    let after = session.answer("gadget").await.unwrap();
    assert!(after.provenance.iter().all(|p| p.id >= 100));
}

#[tokio::test]
async fn failed_refresh_leaves_session_uninitialized() {
    // One successful build, then the collaborator fails deterministically.
    let embedder = HashEmbedder::failing_after(1);
    let source = StubSource::fixed(support::small_records(1));
    let session = session_with(source, embedder);

    assert!(session.ensure_initialized().await);
    assert!(session.answer("gadget").await.is_ok());

    assert!(!session.refresh().await);
    assert!(!session.is_initialized().await);
    let err = session.answer("gadget").await.unwrap_err();
    assert!(matches!(err, SessionError::NotInitialized));
}

#[tokio::test]
async fn refresh_to_empty_data_reports_failure() {
    let source = StubSource::switching(support::small_records(1), RecordSet::default());
    let session = session_with(source, HashEmbedder::reliable());

    assert!(session.ensure_initialized().await);
    assert!(!session.refresh().await);
    assert!(!session.is_initialized().await);
}

#[tokio::test]
async fn fixture_first_initialization_generates_and_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    let source = Arc::new(FixtureSource::new(&path));
    let session = QaSession::new(
        source.clone(),
        HashEmbedder::reliable(),
        Arc::new(EchoModel),
        8,
    );

    assert!(session.ensure_initialized().await);

    let snapshot = source.load_snapshot().await.unwrap();
    assert_eq!(snapshot.total_products, fixture::PRODUCT_COUNT);
    assert_eq!(snapshot.total_orders, fixture::ORDER_COUNT);
    assert!(snapshot.total_reviews >= 1000 && snapshot.total_reviews <= 5000);

    let stats = session.stats().await.unwrap();
    assert_eq!(stats.total_products, fixture::PRODUCT_COUNT);

    let answer = session.answer("any bestsellers in electronics?").await.unwrap();
    assert_eq!(answer.provenance.len(), 8);
}
