//! deck_db CLI
//!
//! Command-line interface for schema tooling, loading and querying.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use deck_db::config::{parse_table_list, Config};
use deck_db::database::{
    generate_schema, DataLoader, DdlGenerator, ForeignKey, LoadOrchestrator, SchemaStorage,
    SqliteBackend,
};
use deck_db::query::QueryGateway;
use deck_db::utils::{Helpers, Logger};
use log::info;
#[cfg(feature = "api")]
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "deck_db", version)]
#[command(about = "Schema-driven Parquet loader and read-only query tools", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a schema from a Parquet file and/or DDL from a schema file
    Schema {
        /// Parquet file to infer a schema from
        #[arg(short, long, requires = "output")]
        input: Option<PathBuf>,

        /// Schema file to write (.json, .yaml or .yml)
        #[arg(short, long, requires = "input")]
        output: Option<PathBuf>,

        /// Table name (defaults to the input file stem)
        #[arg(short, long)]
        table: Option<String>,

        /// Primary key column
        #[arg(long)]
        pkey: Option<String>,

        /// Foreign keys as column=table.column
        #[arg(long, num_args = 1..)]
        fkeys: Vec<ForeignKey>,

        /// Schema file to generate DDL from
        #[arg(long, requires = "sql_out")]
        from_schema: Option<PathBuf>,

        /// DDL file to write
        #[arg(long, requires = "from_schema")]
        sql_out: Option<PathBuf>,

        /// Table options appended to the DDL (e.g. "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4")
        #[arg(long)]
        trailer: Option<String>,
    },

    /// Drop, recreate and fill every table
    Load(LoadArgs),

    /// Run a read-only SQL statement and print records as JSON lines
    Query {
        /// SQL statement
        #[arg(short, long)]
        sql: String,

        /// Database URL (overrides DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Serve the query tools over HTTP
    #[cfg(feature = "api")]
    Serve {
        /// Bind address (overrides SERVER_ADDR)
        #[arg(short, long)]
        addr: Option<SocketAddr>,

        /// Run a full load before serving
        #[arg(long)]
        load: bool,

        #[command(flatten)]
        load_args: LoadArgs,
    },
}

#[derive(Args)]
struct LoadArgs {
    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Directory of Parquet files (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory of schema files (overrides SCHEMA_DIR)
    #[arg(long)]
    schema_dir: Option<PathBuf>,

    /// Comma-separated load order (overrides LOAD_ORDER)
    #[arg(long)]
    order: Option<String>,
}

impl LoadArgs {
    fn apply(self, config: &mut Config) -> Result<()> {
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(dir) = self.schema_dir {
            config.schema_dir = dir;
        }
        if let Some(order) = self.order {
            config.load_order = Some(parse_table_list("--order", &order)?);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    Logger::init_with_level(Logger::level_for_verbosity(cli.verbose));

    let mut config = Config::from_env().context("invalid environment configuration")?;

    match cli.command {
        Commands::Schema {
            input,
            output,
            table,
            pkey,
            fkeys,
            from_schema,
            sql_out,
            trailer,
        } => {
            let storage = SchemaStorage::new();
            let mut did_something = false;

            if let (Some(input), Some(output)) = (input, output) {
                let data = DataLoader::new().read_parquet(&input)?;
                let schema = generate_schema(&data, table.as_deref(), pkey.as_deref(), fkeys);
                storage.save(&schema, &output)?;
                println!("Schema for {} saved to {}", schema.table_name, output.display());
                did_something = true;
            }

            if let (Some(from_schema), Some(sql_out)) = (from_schema, sql_out) {
                let schema = storage.load(&from_schema)?;
                let generator = match trailer {
                    Some(trailer) => DdlGenerator::with_trailer(trailer),
                    None => DdlGenerator::new(),
                };
                let sql = generator.generate(&schema)?;
                storage.save_sql(&sql, &sql_out)?;
                println!("DDL for {} saved to {}", schema.table_name, sql_out.display());
                did_something = true;
            }

            if !did_something {
                bail!("nothing to do: pass --input/--output and/or --from-schema/--sql-out");
            }
        }
        Commands::Load(args) => {
            args.apply(&mut config)?;
            run_load(&config).await?;
        }
        Commands::Query { sql, database_url } => {
            if let Some(url) = database_url {
                config.database_url = url;
            }
            let backend = SqliteBackend::connect(&config.database_url)
                .await
                .with_context(|| format!("cannot open {}", config.database_url))?;
            let gateway = QueryGateway::new(Arc::new(backend));
            for record in gateway.run_query(&sql).await? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        #[cfg(feature = "api")]
        Commands::Serve {
            addr,
            load,
            load_args,
        } => {
            load_args.apply(&mut config)?;
            if let Some(addr) = addr {
                config.server_addr = addr;
            }
            if load {
                run_load(&config).await?;
            }

            let backend = SqliteBackend::connect(&config.database_url)
                .await
                .with_context(|| format!("cannot open {}", config.database_url))?;
            let server = deck_db::api::ApiServer::new(
                config.server_addr,
                QueryGateway::new(Arc::new(backend)),
            );
            server
                .start()
                .await
                .with_context(|| format!("tool server on {} failed", config.server_addr))?;
        }
    }

    Ok(())
}

async fn run_load(config: &Config) -> Result<()> {
    let started = Instant::now();
    let backend = SqliteBackend::connect(&config.database_url)
        .await
        .with_context(|| format!("cannot open {}", config.database_url))?;
    let report = LoadOrchestrator::new(&backend, config)
        .run()
        .await
        .context("load failed")?;

    for (table, rows) in &report.loaded {
        println!("{:<24} {}", table, Helpers::rows(*rows));
    }
    for warning in &report.warnings {
        println!("skipped: {}", warning);
    }
    info!(
        "Loaded {} into {} tables in {}",
        Helpers::rows(report.total_rows()),
        report.loaded.len(),
        Helpers::format_duration_from(started.elapsed())
    );
    Ok(())
}
