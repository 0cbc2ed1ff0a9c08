//! minerva: submit a query, wait for it, print the result table.
//!
//! Reads connection settings from the environment (see `RunnerConfig`),
//! runs the given SQL (or a LIMIT 10 preview of the configured table when
//! no SQL is passed) and prints the assembled result as a text table or
//! JSON records. Optionally exports the result to a Parquet file.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use minerva_athena::{to_json_records, write_parquet, QueryRunner, RunnerConfig};

// ── CLI ─────────────────────────────────────────────────────────────

/// Run a query against the warehouse and print the results.
#[derive(Parser, Debug)]
#[command(name = "minerva", version, about)]
struct Cli {
    /// SQL to execute. Defaults to a LIMIT 10 preview of the configured table.
    query: Option<String>,

    /// Database to run against (overrides ATHENA_DATABASE).
    #[arg(long)]
    database: Option<String>,

    /// Table used for the default preview query (overrides ATHENA_TABLE).
    #[arg(long)]
    table: Option<String>,

    /// Output format for stdout.
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Also write the result to a Parquet file at this path.
    #[arg(long, value_name = "PATH")]
    parquet: Option<PathBuf>,

    /// Treat a missing result object as an error instead of an empty table.
    #[arg(long)]
    strict: bool,

    /// Give up after this many seconds (overrides ATHENA_MAX_WAIT_SECONDS).
    #[arg(long)]
    max_wait_seconds: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Aligned text table.
    Table,
    /// Pretty-printed JSON records.
    Json,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    minerva_core::load_dotenv();

    let cli = Cli::parse();

    let mut config = RunnerConfig::from_env();
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(table) = cli.table {
        config.table = table;
    }
    if let Some(max_wait) = cli.max_wait_seconds {
        config.max_wait_seconds = max_wait;
    }
    if cli.strict {
        config.strict = true;
    }
    config.log_summary();

    let runner = QueryRunner::connect(config).await?;

    let table = match &cli.query {
        Some(sql) => runner.run_query(sql).await?,
        None => runner.run_default_query().await?,
    };

    info!(
        rows = table.row_count(),
        columns = table.column_count(),
        "Query complete"
    );

    match cli.format {
        OutputFormat::Table => println!("{table}"),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&to_json_records(&table))?)
        }
    }

    if let Some(path) = &cli.parquet {
        if table.column_count() == 0 {
            warn!("Result has no columns, skipping Parquet export");
        } else {
            let rows = write_parquet(&table, path)?;
            info!(path = %path.display(), rows, "Exported Parquet file");
        }
    }

    Ok(())
}
