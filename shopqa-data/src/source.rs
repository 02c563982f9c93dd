//! Record sources: where catalog rows come from.
//!
//! Two interchangeable strategies implement [`RecordSource`]:
//!
//! - [`PostgresSource`] — four fixed queries against a relational store
//! - [`FixtureSource`] — a generated JSON snapshot on disk
//!
//! A failed connection surfaces as [`SourceError::Unavailable`]; a failed
//! individual query is logged and contributes an empty group, so callers
//! must tolerate empty record sets.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::{Result, SourceError};
use crate::fixture::{self, Snapshot, SnapshotStats};
use crate::record::{CategoryRecord, Order, OrderItem, Product, RecordSet, Review};

/// A source of catalog records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the current records, grouped by category.
    async fn fetch(&self) -> Result<RecordSet>;

    /// Re-fetch, regenerating underlying data where the strategy owns it.
    ///
    /// For the fixture strategy this discards and rewrites the snapshot;
    /// for the live strategy it is equivalent to [`fetch`](RecordSource::fetch).
    async fn regenerate(&self) -> Result<RecordSet>;

    /// Display counts for the current data, when the strategy tracks them.
    async fn stats(&self) -> Option<SnapshotStats> {
        None
    }
}

// ── Fixture strategy ───────────────────────────────────────────────

/// A [`RecordSource`] backed by a generated JSON snapshot.
///
/// The first fetch generates and persists the snapshot if the file is
/// absent; subsequent fetches read it verbatim until a regeneration.
/// Display counts are cached on every read or write, so `stats` never
/// re-parses the snapshot file.
pub struct FixtureSource {
    path: PathBuf,
    stats: RwLock<Option<SnapshotStats>>,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), stats: RwLock::new(None) }
    }

    /// Read the current snapshot without generating one.
    pub async fn load_snapshot(&self) -> Result<Snapshot> {
        fixture::load(&self.path).await
    }

    async fn generate_and_persist(&self) -> Result<Snapshot> {
        let snapshot = fixture::generate();
        fixture::save(&self.path, &snapshot).await?;
        info!(path = %self.path.display(), "persisted catalog snapshot");
        Ok(snapshot)
    }

    async fn remember(&self, snapshot: &Snapshot) {
        *self.stats.write().await = Some(snapshot.stats());
    }
}

#[async_trait]
impl RecordSource for FixtureSource {
    async fn fetch(&self) -> Result<RecordSet> {
        let exists = tokio::fs::try_exists(&self.path).await.unwrap_or(false);
        let snapshot = if exists {
            self.load_snapshot().await?
        } else {
            info!(path = %self.path.display(), "no snapshot found, generating sample catalog");
            self.generate_and_persist().await?
        };
        self.remember(&snapshot).await;
        Ok(snapshot.into())
    }

    async fn regenerate(&self) -> Result<RecordSet> {
        // Intentionally destructive: the old snapshot is discarded.
        let snapshot = self.generate_and_persist().await?;
        self.remember(&snapshot).await;
        Ok(snapshot.into())
    }

    async fn stats(&self) -> Option<SnapshotStats> {
        if let Some(stats) = *self.stats.read().await {
            return Some(stats);
        }
        // Cold cache: nothing fetched yet, fall back to the file once.
        let stats = self.load_snapshot().await.ok().map(|s| s.stats());
        if stats.is_some() {
            *self.stats.write().await = stats;
        }
        stats
    }
}

// ── Live strategy ──────────────────────────────────────────────────

/// Connection parameters for the live relational store.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl DbConfig {
    fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

const PRODUCTS_QUERY: &str = "\
    SELECT p.id, p.name, p.description, p.price::float8 AS price, \
           c.name AS category, p.stock_quantity, p.brand, p.rating::float8 AS rating \
    FROM products p \
    LEFT JOIN categories c ON p.category_id = c.id \
    WHERE p.is_active = true";

const CATEGORIES_QUERY: &str = "\
    SELECT id, name, description, parent_category \
    FROM categories \
    WHERE is_active = true";

const REVIEWS_QUERY: &str = "\
    SELECT r.id, r.product_id, p.name AS product_name, r.rating, \
           r.review_text, r.created_at \
    FROM reviews r \
    JOIN products p ON r.product_id = p.id \
    WHERE r.is_approved = true \
    ORDER BY r.created_at DESC \
    LIMIT 1000";

const ORDERS_QUERY: &str = "\
    SELECT o.id, o.user_id, o.total_amount::float8 AS total_amount, o.status, \
           o.created_at, oi.product_id, p.name AS product_name, \
           oi.quantity, oi.price::float8 AS price \
    FROM orders o \
    JOIN order_items oi ON o.id = oi.order_id \
    JOIN products p ON oi.product_id = p.id \
    WHERE o.created_at >= CURRENT_DATE - INTERVAL '30 days'";

/// A [`RecordSource`] backed by a PostgreSQL catalog database.
///
/// Issues four fixed queries (active products, active categories, the
/// 1000 most recent approved reviews, orders from the last 30 days with
/// their items).
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    /// Connect to the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] if the connection cannot be
    /// established.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.url())
            .await
            .map_err(|e| {
                error!(host = %config.host, error = %e, "failed to connect to record store");
                SourceError::Unavailable(e.to_string())
            })?;
        Ok(Self { pool })
    }

    /// Wrap an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_products(&self) -> std::result::Result<Vec<Product>, sqlx::Error> {
        let rows = sqlx::query(PRODUCTS_QUERY).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(Product {
                    id: row.try_get::<i32, _>("id")? as i64,
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    price: row.try_get("price")?,
                    category: row.try_get::<Option<String>, _>("category")?.unwrap_or_default(),
                    stock_quantity: row.try_get::<i32, _>("stock_quantity")? as i64,
                    brand: row.try_get("brand")?,
                    rating: row.try_get("rating")?,
                    is_active: true,
                    created_at: None,
                    tags: Vec::new(),
                })
            })
            .collect()
    }

    async fn fetch_categories(&self) -> std::result::Result<Vec<CategoryRecord>, sqlx::Error> {
        let rows = sqlx::query(CATEGORIES_QUERY).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(CategoryRecord {
                    id: row.try_get::<i32, _>("id")? as i64,
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    parent_category: row.try_get("parent_category")?,
                })
            })
            .collect()
    }

    async fn fetch_reviews(&self) -> std::result::Result<Vec<Review>, sqlx::Error> {
        let rows = sqlx::query(REVIEWS_QUERY).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(Review {
                    id: row.try_get::<i32, _>("id")? as i64,
                    product_id: row.try_get::<i32, _>("product_id")? as i64,
                    product_name: row.try_get("product_name")?,
                    rating: row.try_get("rating")?,
                    review_text: row.try_get("review_text")?,
                    reviewer_name: String::new(),
                    verified_purchase: false,
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                })
            })
            .collect()
    }

    async fn fetch_orders(&self) -> std::result::Result<Vec<Order>, sqlx::Error> {
        let rows = sqlx::query(ORDERS_QUERY).fetch_all(&self.pool).await?;

        // The join yields one row per line item; fold them back into
        // orders preserving first-seen order.
        let mut orders: Vec<Order> = Vec::new();
        for row in &rows {
            let order_id = row.try_get::<i32, _>("id")? as i64;
            let item = OrderItem {
                product_id: row.try_get::<i32, _>("product_id")? as i64,
                product_name: row.try_get("product_name")?,
                quantity: row.try_get::<i32, _>("quantity")? as i64,
                price: row.try_get("price")?,
                total: {
                    let quantity: i32 = row.try_get("quantity")?;
                    let price: f64 = row.try_get("price")?;
                    (quantity as f64 * price * 100.0).round() / 100.0
                },
            };

            match orders.iter_mut().find(|o| o.id == order_id) {
                Some(order) => order.items.push(item),
                None => {
                    let status: String = row.try_get("status")?;
                    orders.push(Order {
                        id: order_id,
                        user_id: row.try_get::<i32, _>("user_id")? as i64,
                        items: vec![item],
                        total_amount: row.try_get("total_amount")?,
                        status: status.parse().unwrap_or(crate::record::OrderStatus::Pending),
                        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                    });
                }
            }
        }
        Ok(orders)
    }
}

#[async_trait]
impl RecordSource for PostgresSource {
    async fn fetch(&self) -> Result<RecordSet> {
        // Query failures never propagate past this boundary: each failed
        // group is logged and replaced with an empty one.
        let products = self.fetch_products().await.unwrap_or_else(|e| {
            warn!(group = "products", error = %e, "query failed, returning empty group");
            Vec::new()
        });
        let categories = self.fetch_categories().await.unwrap_or_else(|e| {
            warn!(group = "categories", error = %e, "query failed, returning empty group");
            Vec::new()
        });
        let reviews = self.fetch_reviews().await.unwrap_or_else(|e| {
            warn!(group = "reviews", error = %e, "query failed, returning empty group");
            Vec::new()
        });
        let orders = self.fetch_orders().await.unwrap_or_else(|e| {
            warn!(group = "orders", error = %e, "query failed, returning empty group");
            Vec::new()
        });

        info!(
            products = products.len(),
            categories = categories.len(),
            reviews = reviews.len(),
            orders = orders.len(),
            "fetched records from store"
        );

        Ok(RecordSet { products, categories, reviews, orders })
    }

    async fn regenerate(&self) -> Result<RecordSet> {
        self.fetch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_fetch_generates_on_first_use_then_reads_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let source = FixtureSource::new(&path);

        let first = source.fetch().await.unwrap();
        assert_eq!(first.products.len(), fixture::PRODUCT_COUNT);
        assert!(tokio::fs::try_exists(&path).await.unwrap());

        let second = source.fetch().await.unwrap();
        assert_eq!(second.products, first.products);
        assert_eq!(second.orders, first.orders);
    }

    #[tokio::test]
    async fn fixture_regenerate_replaces_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let source = FixtureSource::new(&path);

        source.fetch().await.unwrap();
        let before = source.load_snapshot().await.unwrap();
        source.regenerate().await.unwrap();
        let after = source.load_snapshot().await.unwrap();

        assert!(after.generated_at >= before.generated_at);
        // Random content: identical regeneration is vanishingly unlikely.
        assert!(
            after.products != before.products || after.generated_at != before.generated_at,
            "regenerate did not rewrite the snapshot"
        );
    }

    #[tokio::test]
    async fn stats_are_served_from_the_cache_after_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let source = FixtureSource::new(&path);

        source.fetch().await.unwrap();

        // Deleting the file proves stats no longer re-read the snapshot.
        tokio::fs::remove_file(&path).await.unwrap();
        let stats = source.stats().await.expect("cached stats");
        assert_eq!(stats.total_products, fixture::PRODUCT_COUNT);
        assert_eq!(stats.total_orders, fixture::ORDER_COUNT);
    }

    #[tokio::test]
    async fn regenerate_refreshes_cached_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let source = FixtureSource::new(&path);

        source.fetch().await.unwrap();
        let before = source.stats().await.unwrap();
        source.regenerate().await.unwrap();
        let after = source.stats().await.unwrap();

        assert!(after.generated_at >= before.generated_at);
        let snapshot = source.load_snapshot().await.unwrap();
        assert_eq!(after, snapshot.stats());
    }

    #[tokio::test]
    async fn fixture_source_never_yields_category_records() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixtureSource::new(dir.path().join("catalog.json"));
        let records = source.fetch().await.unwrap();
        assert!(records.categories.is_empty());
    }
}
