//! Typed catalog records.
//!
//! Records are read-only snapshots pulled from a store (or a generated
//! fixture) at index-build time. Every field consumed downstream of
//! synthesis is typed here; validation happens at the source boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Stable product identifier.
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    /// Unit price in dollars, rounded to 2 decimals.
    pub price: f64,
    /// Average rating in [0.0, 5.0].
    pub rating: f64,
    pub stock_quantity: i64,
    pub is_active: bool,
    /// When the product was added. Absent for rows the live store does
    /// not project a creation date for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A product category (live store only; fixtures carry no category rows).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_category: Option<String>,
}

/// A customer review of a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    /// The reviewed product. Always references an existing [`Product`].
    pub product_id: i64,
    pub product_name: String,
    /// Star rating, integer in 1..=5.
    pub rating: i32,
    pub review_text: String,
    pub reviewer_name: String,
    pub verified_purchase: bool,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of an [`Order`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All states, in the order the fixture generator samples them.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

/// One line item within an [`Order`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Always references an existing [`Product`].
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of order, 2 decimals.
    pub price: f64,
    /// `quantity * price`, rounded to 2 decimals.
    pub total: f64,
}

/// A customer order with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A complete fetch from a record source, grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    pub products: Vec<Product>,
    pub categories: Vec<CategoryRecord>,
    pub reviews: Vec<Review>,
    pub orders: Vec<Order>,
}

impl RecordSet {
    /// True when every group is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.categories.is_empty()
            && self.reviews.is_empty()
            && self.orders.is_empty()
    }
}
