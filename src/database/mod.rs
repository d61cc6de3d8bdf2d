//! Schema-driven table provisioning and loading
//!
//! This module turns columnar source files into populated, constrained SQL
//! tables.
//!
//! The database module consists of:
//! - `inference`: native storage types → SQL column types, schema generation
//! - `schema`: the portable table schema model and its validation
//! - `storage`: JSON/YAML schema artifacts
//! - `ddl`: `CREATE TABLE` generation
//! - `order`: load order, declared or derived from foreign keys
//! - `loader`: Parquet files materialized in memory
//! - `backend`: the database access contract and its SQLite implementation
//! - `orchestrator`: drop → create → bulk load runs
//!
//! # Workflow
//!
//! 1. **Infer**: read a Parquet file and generate a schema
//! 2. **Persist**: save the schema as a JSON or YAML artifact, edit keys as needed
//! 3. **Provision**: drop and recreate tables from the artifacts
//! 4. **Load**: append each table's rows, parents first
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::database::{generate_schema, DataLoader, DdlGenerator, SchemaStorage};
//! use std::path::Path;
//!
//! let table = DataLoader::new().read_parquet(Path::new("data/customers.parquet"))?;
//! let schema = generate_schema(&table, None, Some("customer_id"), Vec::new());
//! SchemaStorage::new().save(&schema, Path::new("schemas/customers.yaml"))?;
//! println!("{}", DdlGenerator::new().generate(&schema)?);
//! # Ok::<(), deck_db::DeckError>(())
//! ```

pub mod backend;
pub mod ddl;
pub mod inference;
pub mod loader;
pub mod orchestrator;
pub mod order;
pub mod schema;
pub mod storage;

// Re-export main types for convenience
pub use backend::{Backend, InsertMode, SqliteBackend};
pub use ddl::{DdlGenerator, MYSQL_TABLE_TRAILER};
pub use inference::{generate_schema, infer_column_type, NativeType};
pub use loader::DataLoader;
pub use orchestrator::{ArtifactKind, LoadOrchestrator, LoadReport, LoadWarning};
pub use order::LoadOrder;
pub use schema::{Column, ForeignKey, Reference, Schema, SqlType};
pub use storage::{SchemaFormat, SchemaStorage};
