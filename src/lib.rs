//! deck_db: schema-driven Parquet loading with a read-only query gateway
//!
//! This library infers SQL schemas from columnar files, persists them as
//! JSON/YAML artifacts, generates constrained `CREATE TABLE` statements, and
//! loads interdependent tables parents-first. Loaded data is served through
//! a small set of read-only query tools.
//!
//! # Example
//!
//! ```no_run
//! use deck_db::config::Config;
//! use deck_db::database::{LoadOrchestrator, SqliteBackend};
//! use deck_db::query::QueryGateway;
//! use std::sync::Arc;
//!
//! # async fn run() -> deck_db::Result<()> {
//! let config = Config::from_env()?;
//! let backend = Arc::new(SqliteBackend::connect(&config.database_url).await?);
//!
//! // Drop, create and fill every table
//! let report = LoadOrchestrator::new(&*backend, &config).run().await?;
//!
//! // Query the result
//! let gateway = QueryGateway::new(backend);
//! let history = gateway.get_purchase_history("some-customer").await?;
//! # Ok(())
//! # }
//! ```

/// deck_db version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod database;
pub mod error;
pub mod query;
pub mod types;
pub mod utils;

#[cfg(feature = "api")]
pub mod api;

pub use error::{DeckError, Result};
