//! Query gateway module
//!
//! Read-only access to the loaded tables for remote callers:
//! - `parser`: rejects anything but a single read statement
//! - `gateway`: `run_query`, `get_purchase_history`, `get_product_details`
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::database::SqliteBackend;
//! use deck_db::query::QueryGateway;
//! use std::sync::Arc;
//!
//! # async fn run() -> deck_db::Result<()> {
//! let gateway = QueryGateway::new(Arc::new(SqliteBackend::connect("sqlite://mcp_deck.db").await?));
//! for record in gateway.run_query("SELECT * FROM customers LIMIT 3").await? {
//!     println!("{}", serde_json::to_string(&record).unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

pub mod gateway;
pub mod parser;

// Re-export main types for convenience
pub use gateway::{QueryGateway, PRODUCT_DETAILS_SQL, PURCHASE_HISTORY_SQL};
pub use parser::QueryParser;
