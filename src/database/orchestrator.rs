//! Load orchestration
//!
//! One load run provisions and fills every table in four sequential phases:
//!
//! 1. **Drop**: `DROP TABLE IF EXISTS` in reverse load order
//! 2. **Create**: schema artifact → DDL → execute, in load order
//! 3. **Bulk load**: read the table's columnar file, append its rows, in load order
//! 4. **Report**: every table was attempted; skipped ones carry a warning
//!
//! A missing schema or data file skips that table only. Any backend error
//! aborts the run; there is no rollback across tables.
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::config::Config;
//! use deck_db::database::{LoadOrchestrator, SqliteBackend};
//!
//! # async fn run() -> deck_db::Result<()> {
//! let config = Config::from_env()?;
//! let backend = SqliteBackend::connect(&config.database_url).await?;
//! let report = LoadOrchestrator::new(&backend, &config).run().await?;
//! println!("{} tables loaded, {} warnings", report.loaded.len(), report.warnings.len());
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::database::backend::{Backend, InsertMode};
use crate::database::ddl::DdlGenerator;
use crate::database::loader::DataLoader;
use crate::database::order::LoadOrder;
use crate::database::storage::SchemaStorage;
use crate::error::Result;
use crate::utils::Helpers;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

/// Artifact a table needs during a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Schema file, needed to create the table
    Schema,

    /// Columnar data file, needed to fill the table
    Data,
}

/// Non-fatal condition recorded during a load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// The data directory does not exist; nothing was touched
    MissingDataDir {
        /// Configured data directory
        path: PathBuf,
    },

    /// A table's schema or data file is absent; the table was skipped
    MissingArtifact {
        /// Table name
        table: String,
        /// Which artifact
        kind: ArtifactKind,
        /// Path looked up
        path: PathBuf,
    },

    /// The table was not created in this run, so its data was not loaded
    NotProvisioned {
        /// Table name
        table: String,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MissingDataDir { path } => {
                write!(f, "no data directory found at {}", path.display())
            }
            LoadWarning::MissingArtifact { table, kind, path } => {
                let what = match kind {
                    ArtifactKind::Schema => "schema file",
                    ArtifactKind::Data => "data file",
                };
                write!(f, "{} {} not found, skipping {}", what, path.display(), table)
            }
            LoadWarning::NotProvisioned { table } => {
                write!(f, "table {} was not created, skipping data load", table)
            }
        }
    }
}

/// Outcome of one load run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Load order used for the run
    pub order: Vec<String>,

    /// Tables dropped, in drop order
    pub dropped: Vec<String>,

    /// Tables created, in creation order
    pub created: Vec<String>,

    /// Tables filled and their row counts, in load order
    pub loaded: Vec<(String, usize)>,

    /// Skipped work
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    /// Whether every table in the order was created and loaded
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Total rows inserted
    pub fn total_rows(&self) -> usize {
        self.loaded.iter().map(|(_, rows)| rows).sum()
    }
}

/// Drops, creates and fills tables from schema artifacts and columnar files
pub struct LoadOrchestrator<'a> {
    backend: &'a dyn Backend,
    config: &'a Config,
    storage: SchemaStorage,
    loader: DataLoader,
    ddl: DdlGenerator,
}

impl<'a> LoadOrchestrator<'a> {
    /// Create an orchestrator over a backend and configuration
    pub fn new(backend: &'a dyn Backend, config: &'a Config) -> Self {
        let ddl = match &config.ddl_trailer {
            Some(trailer) => DdlGenerator::with_trailer(trailer.clone()),
            None => DdlGenerator::new(),
        };
        Self {
            backend,
            config,
            storage: SchemaStorage::new(),
            loader: DataLoader::new(),
            ddl,
        }
    }

    /// Resolve the load order: declared in the configuration, or derived
    /// from the foreign keys of every schema in the schema directory
    pub fn resolve_order(&self) -> Result<LoadOrder> {
        match &self.config.load_order {
            Some(tables) => Ok(LoadOrder::declared(tables.iter().cloned())),
            None => {
                if !self.config.schema_dir.is_dir() {
                    return Ok(LoadOrder::declared(Vec::<String>::new()));
                }
                let schemas = self.storage.load_dir(&self.config.schema_dir)?;
                LoadOrder::from_schemas(&schemas)
            }
        }
    }

    /// Run all phases
    pub async fn run(&self) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        if !self.config.data_dir.is_dir() {
            let warning = LoadWarning::MissingDataDir {
                path: self.config.data_dir.clone(),
            };
            warn!("{}", warning);
            report.warnings.push(warning);
            return Ok(report);
        }

        let order = self.resolve_order()?;
        report.order = order.tables().to_vec();
        info!("Load order: {}", report.order.join(", "));

        self.drop_tables(&order, &mut report).await?;
        self.create_tables(&order, &mut report).await?;
        self.load_tables(&order, &mut report).await?;

        if report.is_complete() {
            info!(
                "All data loaded: {} tables, {} rows",
                report.loaded.len(),
                report.total_rows()
            );
        } else {
            warn!(
                "Load finished with {} warning(s): {} of {} tables loaded",
                report.warnings.len(),
                report.loaded.len(),
                report.order.len()
            );
        }
        Ok(report)
    }

    async fn drop_tables(&self, order: &LoadOrder, report: &mut LoadReport) -> Result<()> {
        info!("Dropping existing tables...");
        for table in order.drop_order() {
            self.backend.execute(&DdlGenerator::drop_table(table)).await?;
            debug!("Dropped table {}", table);
            report.dropped.push(table.to_string());
        }
        Ok(())
    }

    async fn create_tables(&self, order: &LoadOrder, report: &mut LoadReport) -> Result<()> {
        info!("Creating tables with foreign key constraints...");
        for table in order.tables() {
            let Some(path) = self.storage.find(&self.config.schema_dir, table) else {
                let warning = LoadWarning::MissingArtifact {
                    table: table.clone(),
                    kind: ArtifactKind::Schema,
                    path: self.config.schema_dir.join(format!("{}.json", table)),
                };
                warn!("{}", warning);
                report.warnings.push(warning);
                continue;
            };

            let schema = self.storage.load(&path)?;
            let sql = self.ddl.generate(&schema)?;
            info!("Creating table {}...", table);
            debug!("{}", sql);
            self.backend.execute(&sql).await?;
            report.created.push(table.clone());
        }
        Ok(())
    }

    async fn load_tables(&self, order: &LoadOrder, report: &mut LoadReport) -> Result<()> {
        let created: HashSet<String> = report.created.iter().cloned().collect();

        for table in order.tables() {
            if !created.contains(table) {
                let warning = LoadWarning::NotProvisioned {
                    table: table.clone(),
                };
                warn!("{}", warning);
                report.warnings.push(warning);
                continue;
            }

            let path = self.config.data_file(table);
            if !path.is_file() {
                let warning = LoadWarning::MissingArtifact {
                    table: table.clone(),
                    kind: ArtifactKind::Data,
                    path,
                };
                warn!("{}", warning);
                report.warnings.push(warning);
                continue;
            }

            info!("Loading {} into table {}...", path.display(), table);
            let started = Instant::now();
            let data = self.loader.read_parquet(&path)?;
            self.backend
                .insert_many(table, &data.column_names(), &data.rows, InsertMode::Append)
                .await?;
            info!(
                "Loaded {} into {} in {}",
                Helpers::rows(data.num_rows()),
                table,
                Helpers::format_duration_from(started.elapsed())
            );
            report.loaded.push((table.clone(), data.num_rows()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::backend::tests::{scratch_backend, RecordingBackend};
    use crate::database::loader::tests::write_parquet;
    use crate::database::schema::{Column, ForeignKey, Schema, SqlType};
    use crate::error::DeckError;
    use crate::types::Value;
    use arrow_array::{Float64Array, Int64Array, RecordBatch, StringArray};
    use arrow_schema::{DataType, Field, Schema as ArrowSchema};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    fn articles_schema() -> Schema {
        Schema::new("articles")
            .with_column(Column::new("article_id", SqlType::BigInt, false))
            .with_column(Column::new("prod_name", SqlType::Text, true))
            .with_primary_key("article_id")
    }

    fn customers_schema() -> Schema {
        Schema::new("customers")
            .with_column(Column::new("customer_id", SqlType::Text, false))
            .with_primary_key("customer_id")
    }

    fn transactions_schema() -> Schema {
        Schema::new("transactions")
            .with_column(Column::new("t_dat", SqlType::Text, false))
            .with_column(Column::new("customer_id", SqlType::Text, false))
            .with_column(Column::new("article_id", SqlType::BigInt, false))
            .with_column(Column::new("price", SqlType::Double, true))
            .with_foreign_key(ForeignKey::new("customer_id", "customers", "customer_id"))
            .with_foreign_key(ForeignKey::new("article_id", "articles", "article_id"))
    }

    fn articles_batch() -> RecordBatch {
        RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![
                Field::new("article_id", DataType::Int64, false),
                Field::new("prod_name", DataType::Utf8, true),
            ])),
            vec![
                Arc::new(Int64Array::from(vec![108775015, 108775044])),
                Arc::new(StringArray::from(vec![Some("Strap top"), None])),
            ],
        )
        .unwrap()
    }

    fn customers_batch() -> RecordBatch {
        RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![Field::new(
                "customer_id",
                DataType::Utf8,
                false,
            )])),
            vec![Arc::new(StringArray::from(vec!["c1", "c2"]))],
        )
        .unwrap()
    }

    fn transactions_batch() -> RecordBatch {
        RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![
                Field::new("t_dat", DataType::Utf8, false),
                Field::new("customer_id", DataType::Utf8, false),
                Field::new("article_id", DataType::Int64, false),
                Field::new("price", DataType::Float64, true),
            ])),
            vec![
                Arc::new(StringArray::from(vec!["2020-09-02", "2020-09-01", "2020-09-03"])),
                Arc::new(StringArray::from(vec!["c1", "c1", "c2"])),
                Arc::new(Int64Array::from(vec![108775015, 108775044, 108775015])),
                Arc::new(Float64Array::from(vec![Some(0.05), None, Some(0.02)])),
            ],
        )
        .unwrap()
    }

    struct Fixture {
        dir: TempDir,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let mut config = Config::default();
            config.data_dir = dir.path().join("data");
            config.schema_dir = dir.path().join("schemas");
            std::fs::create_dir_all(&config.data_dir).unwrap();
            std::fs::create_dir_all(&config.schema_dir).unwrap();
            Self { dir, config }
        }

        fn schema(&self, schema: &Schema, ext: &str) {
            let path = self
                .config
                .schema_dir
                .join(format!("{}.{}", schema.table_name, ext));
            SchemaStorage::new().save(schema, &path).unwrap();
        }

        fn data(&self, file: &str, batch: &RecordBatch) {
            write_parquet(&self.config.data_dir.join(file), batch);
        }

        fn full() -> Self {
            let fixture = Self::new();
            fixture.schema(&articles_schema(), "json");
            fixture.schema(&customers_schema(), "yaml");
            fixture.schema(&transactions_schema(), "json");
            fixture.data("articles_clean.parquet", &articles_batch());
            fixture.data("customers.parquet", &customers_batch());
            fixture.data("transactions.parquet", &transactions_batch());
            fixture
        }
    }

    #[tokio::test]
    async fn test_statement_order() {
        let mut fixture = Fixture::full();
        fixture.config.load_order = Some(vec![
            "articles".to_string(),
            "customers".to_string(),
            "transactions".to_string(),
        ]);
        let backend = RecordingBackend::default();

        let report = LoadOrchestrator::new(&backend, &fixture.config)
            .run()
            .await
            .unwrap();
        assert!(report.is_complete());

        let statements = backend.statements();
        let kinds: Vec<String> = statements
            .iter()
            .map(|s| s.split(" (").next().unwrap().to_string())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "DROP TABLE IF EXISTS transactions;",
                "DROP TABLE IF EXISTS customers;",
                "DROP TABLE IF EXISTS articles;",
                "CREATE TABLE articles",
                "CREATE TABLE customers",
                "CREATE TABLE transactions",
                "INSERT articles 2",
                "INSERT customers 2",
                "INSERT transactions 3",
            ]
        );
        assert_eq!(report.dropped, vec!["transactions", "customers", "articles"]);
        assert_eq!(report.total_rows(), 7);
    }

    #[tokio::test]
    async fn test_order_is_derived_from_foreign_keys() {
        let fixture = Fixture::full();
        let backend = RecordingBackend::default();
        let orchestrator = LoadOrchestrator::new(&backend, &fixture.config);

        let order = orchestrator.resolve_order().unwrap();
        assert_eq!(order.tables(), ["articles", "customers", "transactions"]);

        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.created, vec!["articles", "customers", "transactions"]);
    }

    #[tokio::test]
    async fn test_missing_data_file_skips_one_table() {
        let mut fixture = Fixture::new();
        fixture.config.load_order = Some(vec!["a".to_string(), "b".to_string()]);
        for name in ["a", "b"] {
            let schema = Schema::new(name)
                .with_column(Column::new("customer_id", SqlType::Text, false));
            fixture.schema(&schema, "json");
        }
        fixture.data("a.parquet", &customers_batch());

        let backend = RecordingBackend::default();
        let report = LoadOrchestrator::new(&backend, &fixture.config)
            .run()
            .await
            .unwrap();

        assert_eq!(report.created, vec!["a", "b"]);
        assert_eq!(report.loaded, vec![("a".to_string(), 2)]);
        assert_eq!(
            report.warnings,
            vec![LoadWarning::MissingArtifact {
                table: "b".to_string(),
                kind: ArtifactKind::Data,
                path: fixture.config.data_dir.join("b.parquet"),
            }]
        );
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_missing_schema_skips_create_and_load() {
        let mut fixture = Fixture::new();
        fixture.config.load_order = Some(vec!["customers".to_string(), "ghost".to_string()]);
        fixture.schema(&customers_schema(), "yml");
        fixture.data("customers.parquet", &customers_batch());
        fixture.data("ghost.parquet", &customers_batch());

        let backend = RecordingBackend::default();
        let report = LoadOrchestrator::new(&backend, &fixture.config)
            .run()
            .await
            .unwrap();

        assert_eq!(report.created, vec!["customers"]);
        assert_eq!(report.loaded, vec![("customers".to_string(), 2)]);
        assert_eq!(report.warnings.len(), 2);
        assert!(matches!(
            &report.warnings[0],
            LoadWarning::MissingArtifact { table, kind: ArtifactKind::Schema, .. } if table == "ghost"
        ));
        assert_eq!(
            report.warnings[1],
            LoadWarning::NotProvisioned {
                table: "ghost".to_string()
            }
        );
        assert!(backend
            .statements()
            .iter()
            .all(|s| !s.starts_with("CREATE TABLE ghost")));
    }

    #[tokio::test]
    async fn test_missing_data_dir_touches_nothing() {
        let mut fixture = Fixture::full();
        fixture.config.data_dir = fixture.dir.path().join("nowhere");
        let backend = RecordingBackend::default();

        let report = LoadOrchestrator::new(&backend, &fixture.config)
            .run()
            .await
            .unwrap();
        assert!(backend.statements().is_empty());
        assert!(matches!(
            report.warnings.as_slice(),
            [LoadWarning::MissingDataDir { .. }]
        ));
    }

    #[tokio::test]
    async fn test_backend_error_aborts_run() {
        let fixture = Fixture::full();
        let backend = RecordingBackend::failing_on("CREATE TABLE customers");

        let err = LoadOrchestrator::new(&backend, &fixture.config)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::BackendExecution(_)));

        let statements = backend.statements();
        assert!(statements.iter().any(|s| s.starts_with("CREATE TABLE articles")));
        assert!(statements.iter().all(|s| !s.starts_with("INSERT")));
    }

    #[tokio::test]
    async fn test_invalid_schema_is_fatal() {
        let fixture = Fixture::new();
        std::fs::write(
            fixture.config.schema_dir.join("bad.json"),
            r#"{"table_name": "bad", "columns": [{"name": "a b", "type": "TEXT"}]}"#,
        )
        .unwrap();
        let backend = RecordingBackend::default();

        let err = LoadOrchestrator::new(&backend, &fixture.config)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::SchemaValidation { .. }));
    }

    #[tokio::test]
    async fn test_cyclic_schemas_are_rejected() {
        let fixture = Fixture::new();
        let a = Schema::new("a")
            .with_column(Column::new("id", SqlType::BigInt, false))
            .with_foreign_key(ForeignKey::new("id", "b", "id"));
        let b = Schema::new("b")
            .with_column(Column::new("id", SqlType::BigInt, false))
            .with_foreign_key(ForeignKey::new("id", "a", "id"));
        fixture.schema(&a, "json");
        fixture.schema(&b, "json");

        let backend = RecordingBackend::default();
        let err = LoadOrchestrator::new(&backend, &fixture.config)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::CyclicDependency { .. }));
        assert!(backend.statements().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_with_sqlite() {
        let fixture = Fixture::full();
        let (_db_dir, backend) = scratch_backend().await;

        let orchestrator = LoadOrchestrator::new(&backend, &fixture.config);
        let report = orchestrator.run().await.unwrap();
        assert!(report.is_complete());
        assert_eq!(
            report.loaded,
            vec![
                ("articles".to_string(), 2),
                ("customers".to_string(), 2),
                ("transactions".to_string(), 3),
            ]
        );

        // re-running drops and recreates cleanly
        let report = orchestrator.run().await.unwrap();
        assert_eq!(report.total_rows(), 7);

        let rows = backend
            .fetch("SELECT COUNT(*) AS n FROM transactions", &[])
            .await
            .unwrap();
        assert_eq!(rows[0].get("n"), Some(&Value::Integer(3)));

        let names = backend
            .fetch("SELECT prod_name FROM articles ORDER BY article_id", &[])
            .await
            .unwrap();
        assert_eq!(names[0].get("prod_name"), Some(&Value::Text("Strap top".to_string())));
        assert_eq!(names[1].get("prod_name"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_foreign_key_violation_is_fatal() {
        let fixture = Fixture::full();
        // transactions reference customers c1/c2; load only one customer
        let only_c3 = RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![Field::new(
                "customer_id",
                DataType::Utf8,
                false,
            )])),
            vec![Arc::new(StringArray::from(vec!["c3"]))],
        )
        .unwrap();
        fixture.data("customers.parquet", &only_c3);
        let (_db_dir, backend) = scratch_backend().await;

        let err = LoadOrchestrator::new(&backend, &fixture.config)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::BackendExecution(_)));
    }
}
