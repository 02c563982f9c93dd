//! Web endpoint answering natural-language questions about an
//! ecommerce catalog via retrieval-augmented generation.
//!
//! Composition: a [`RecordSource`](shopqa_data::RecordSource) feeds
//! synthesized chunks into an index held by the [`session::QaSession`];
//! the [`routes`] dispatcher maps `query` / `refresh` form actions onto
//! session operations.

pub mod config;
pub mod routes;
pub mod session;

pub use config::{Config, ConfigError, DataStrategy};
pub use routes::app_router;
pub use session::{QaSession, SessionError};
