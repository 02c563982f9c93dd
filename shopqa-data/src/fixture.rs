//! Sample catalog generator and JSON snapshot persistence.
//!
//! The generator produces a self-consistent catalog: exactly 1000
//! products (ids 1..=1000), 1–5 reviews per product, and exactly 200
//! orders whose line items all reference generated products. The full
//! set is persisted as a single JSON document and read back verbatim
//! until the next regeneration.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{Result, SourceError};
use crate::record::{Order, OrderItem, OrderStatus, Product, RecordSet, Review};

pub const PRODUCT_COUNT: usize = 1000;
pub const ORDER_COUNT: usize = 200;

const CATEGORIES: [&str; 12] = [
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports & Outdoors",
    "Books",
    "Health & Beauty",
    "Toys & Games",
    "Automotive",
    "Jewelry",
    "Food & Beverages",
    "Pet Supplies",
    "Office Supplies",
];

const BRANDS: [&str; 15] = [
    "TechPro",
    "StyleMax",
    "ComfortHome",
    "ActiveLife",
    "SmartChoice",
    "PremiumBrand",
    "EcoFriendly",
    "BudgetBest",
    "LuxuryLine",
    "QuickFix",
    "MegaBrand",
    "TopTier",
    "ValuePlus",
    "EliteChoice",
    "ProGear",
];

const TAGS: [&str; 6] =
    ["bestseller", "eco-friendly", "premium", "budget", "new-arrival", "sale"];

const REVIEW_TEXTS: [&str; 10] = [
    "Great product! Highly recommended.",
    "Good value for money. Works as expected.",
    "Excellent quality and fast shipping.",
    "Not bad, but could be better.",
    "Amazing product! Exceeded my expectations.",
    "Decent product for the price.",
    "Love it! Will buy again.",
    "Good build quality and design.",
    "Fair product, nothing special.",
    "Outstanding! Worth every penny.",
];

/// Per-category product name pools. Categories without a pool fall back
/// to "Generic Product".
fn name_pool(category: &str) -> &'static [&'static str] {
    match category {
        "Electronics" => &[
            "Wireless Bluetooth Headphones",
            "Smart TV",
            "Laptop Computer",
            "Smartphone",
            "Tablet",
            "Gaming Console",
            "Smart Watch",
            "Wireless Speaker",
            "Camera",
            "Power Bank",
            "Router",
            "Monitor",
        ],
        "Clothing" => &[
            "T-Shirt", "Jeans", "Dress", "Jacket", "Sneakers", "Hoodie", "Shorts",
            "Sweater", "Boots", "Skirt", "Blouse", "Pants",
        ],
        "Home & Garden" => &[
            "Coffee Maker",
            "Vacuum Cleaner",
            "Air Purifier",
            "Desk Lamp",
            "Garden Hose",
            "Tool Set",
            "Bedding Set",
            "Dining Table",
            "Plant Pot",
            "Wall Clock",
            "Storage Box",
            "Kitchen Scale",
        ],
        "Sports & Outdoors" => &[
            "Yoga Mat",
            "Running Shoes",
            "Bicycle",
            "Camping Tent",
            "Fitness Tracker",
            "Water Bottle",
            "Dumbbells",
            "Backpack",
            "Soccer Ball",
            "Tennis Racket",
            "Hiking Boots",
            "Swim Goggles",
        ],
        "Books" => &[
            "Fiction Novel",
            "Self-Help Book",
            "Cookbook",
            "Biography",
            "Science Book",
            "History Book",
            "Art Book",
            "Travel Guide",
            "Children's Book",
            "Poetry Collection",
            "Technical Manual",
            "Dictionary",
        ],
        "Health & Beauty" => &[
            "Skincare Set",
            "Hair Dryer",
            "Electric Toothbrush",
            "Perfume",
            "Makeup Kit",
            "Vitamins",
            "Face Mask",
            "Shampoo",
            "Moisturizer",
            "Nail Polish",
            "Sunscreen",
            "Body Lotion",
        ],
        _ => &["Generic Product"],
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn days_ago(now: DateTime<Utc>, rng: &mut impl Rng, max_days: i64) -> DateTime<Utc> {
    now - Duration::days(rng.gen_range(1..=max_days))
}

/// A generated catalog snapshot as persisted to disk.
///
/// Top-level shape is fixed: `products`, `reviews`, `orders`,
/// `generated_at` and the three `total_*` counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub products: Vec<Product>,
    pub reviews: Vec<Review>,
    pub orders: Vec<Order>,
    pub generated_at: DateTime<Utc>,
    pub total_products: usize,
    pub total_reviews: usize,
    pub total_orders: usize,
}

impl Snapshot {
    /// Summary counts for display.
    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            total_products: self.total_products,
            total_reviews: self.total_reviews,
            total_orders: self.total_orders,
            generated_at: self.generated_at,
        }
    }
}

/// Display counts surfaced on the landing page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SnapshotStats {
    pub total_products: usize,
    pub total_reviews: usize,
    pub total_orders: usize,
    pub generated_at: DateTime<Utc>,
}

impl From<Snapshot> for RecordSet {
    fn from(snapshot: Snapshot) -> Self {
        RecordSet {
            products: snapshot.products,
            categories: Vec::new(),
            reviews: snapshot.reviews,
            orders: snapshot.orders,
        }
    }
}

/// Generate a complete sample catalog using the thread-local RNG.
pub fn generate() -> Snapshot {
    generate_with(&mut rand::thread_rng())
}

/// Generate a complete sample catalog from the given RNG.
pub fn generate_with(rng: &mut impl Rng) -> Snapshot {
    let now = Utc::now();

    let mut products = Vec::with_capacity(PRODUCT_COUNT);
    let mut reviews = Vec::new();

    for id in 1..=PRODUCT_COUNT as i64 {
        let category = *CATEGORIES.choose(rng).unwrap();
        let brand = *BRANDS.choose(rng).unwrap();
        let base_name = *name_pool(category).choose(rng).unwrap();
        let name = format!("{brand} {base_name}");

        let tag_count = rng.gen_range(1..=3);
        let tags: Vec<String> =
            TAGS.choose_multiple(rng, tag_count).map(|t| t.to_string()).collect();

        products.push(Product {
            id,
            description: format!(
                "High-quality {} from {brand}. Perfect for everyday use with \
                 excellent performance and durability.",
                base_name.to_lowercase()
            ),
            name: name.clone(),
            category: category.to_string(),
            brand: brand.to_string(),
            price: round2(rng.gen_range(9.99..=999.99)),
            rating: round1(rng.gen_range(3.0..=5.0)),
            stock_quantity: rng.gen_range(0..=500),
            is_active: rng.gen_bool(0.75),
            created_at: Some(days_ago(now, rng, 365)),
            tags,
        });

        for _ in 0..rng.gen_range(1..=5) {
            reviews.push(Review {
                id: reviews.len() as i64 + 1,
                product_id: id,
                product_name: name.clone(),
                rating: rng.gen_range(1..=5),
                review_text: REVIEW_TEXTS.choose(rng).unwrap().to_string(),
                reviewer_name: format!("Customer{}", rng.gen_range(1000..=9999)),
                verified_purchase: rng.gen_bool(0.5),
                created_at: days_ago(now, rng, 180),
            });
        }
    }

    let mut orders = Vec::with_capacity(ORDER_COUNT);
    for order_id in 1..=ORDER_COUNT as i64 {
        let item_count = rng.gen_range(1..=5);
        let mut items = Vec::with_capacity(item_count);
        let mut total_amount = 0.0;

        for _ in 0..item_count {
            let product = products.choose(rng).unwrap();
            let quantity = rng.gen_range(1..=3);
            let total = round2(quantity as f64 * product.price);
            total_amount += total;
            items.push(OrderItem {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity,
                price: product.price,
                total,
            });
        }

        orders.push(Order {
            id: order_id,
            user_id: rng.gen_range(1..=100),
            items,
            total_amount: round2(total_amount),
            status: *OrderStatus::ALL.choose(rng).unwrap(),
            created_at: days_ago(now, rng, 30),
        });
    }

    let (total_products, total_reviews, total_orders) =
        (products.len(), reviews.len(), orders.len());

    info!(total_products, total_reviews, total_orders, "generated sample catalog");

    Snapshot {
        products,
        reviews,
        orders,
        generated_at: now,
        total_products,
        total_reviews,
        total_orders,
    }
}

fn snapshot_err(path: &Path, e: impl std::fmt::Display) -> SourceError {
    SourceError::Snapshot { path: path.display().to_string(), message: e.to_string() }
}

/// Read a snapshot document from disk.
pub async fn load(path: &Path) -> Result<Snapshot> {
    let bytes = tokio::fs::read(path).await.map_err(|e| snapshot_err(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| snapshot_err(path, e))
}

/// Persist a snapshot document to disk, replacing any existing one.
pub async fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_vec_pretty(snapshot).map_err(|e| snapshot_err(path, e))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| snapshot_err(path, e))?;
        }
    }
    tokio::fs::write(path, json).await.map_err(|e| snapshot_err(path, e))
}
