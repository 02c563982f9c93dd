//! Catalog record model and record sources for the shopqa service.
//!
//! Records come from one of two interchangeable strategies behind the
//! [`RecordSource`] trait: a live PostgreSQL store or a generated JSON
//! fixture snapshot. See [`source`] and [`fixture`].

pub mod error;
pub mod fixture;
pub mod record;
pub mod source;

pub use error::{Result, SourceError};
pub use fixture::{Snapshot, SnapshotStats};
pub use record::{
    CategoryRecord, Order, OrderItem, OrderStatus, Product, RecordSet, Review,
};
pub use source::{DbConfig, FixtureSource, PostgresSource, RecordSource};
