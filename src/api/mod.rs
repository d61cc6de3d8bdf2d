//! API layer module
//!
//! HTTP shell exposing the query gateway as named tools. It is only
//! available when the `api` feature is enabled.
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::api::{ApiClient, ApiServer};
//! use deck_db::database::SqliteBackend;
//! use deck_db::query::QueryGateway;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let backend = SqliteBackend::connect("sqlite://mcp_deck.db").await?;
//! let server = ApiServer::new("127.0.0.1:8080".parse()?, QueryGateway::new(Arc::new(backend)));
//! tokio::spawn(async move { server.start().await });
//!
//! let client = ApiClient::new("http://127.0.0.1:8080");
//! let rows = client
//!     .call_tool("run_query", serde_json::json!({ "sql": "SELECT COUNT(*) AS n FROM articles" }))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod server;

// Re-export main types for convenience
pub use client::ApiClient;
pub use server::{ApiServer, ToolDescriptor, TOOLS};
