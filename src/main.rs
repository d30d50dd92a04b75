use anyhow::{Context, Result, anyhow};
use api_client::BlobStorageClient;
use clap::{Parser, Subcommand};
use configuration::settings::Config;
use configuration::{LogFormat, LogLevel, load_config, setup_logging};
use database::{DbError, query_data_with_source};
use ml_features::CyclicalFeaturesExt;
use polars::prelude::*;
use std::path::PathBuf;
use std::process;

/// The main entry point for the assessment data pipeline.
///
/// Library crates return errors; this binary is where any failure becomes a
/// non-zero exit.
#[tokio::main]
async fn main() {
    // Load PIPELINE_* overrides from a .env file, if there is one.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match settings_for(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            process::exit(1);
        }
    };

    if let Err(e) = setup_logging(&config.logging) {
        eprintln!("Failed to set up logging: {}", e);
        process::exit(1);
    }

    // Execute the appropriate command
    let outcome = match cli.command {
        Commands::Query(args) => handle_query(args, &config).await,
    };

    if let Err(e) = outcome {
        match e.downcast_ref::<DbError>() {
            Some(db_error) if db_error.is_open_failure() => {
                tracing::error!("Could not open the database: {:#}", e);
            }
            _ => tracing::error!("{:#}", e),
        }
        process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Pulls assessment data out of its SQLite database and into a DataFrame.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. A missing file is not an error.
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    /// Overrides `logging.level`.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Overrides `logging.format`.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the database, run a query and show (or save) the result.
    Query(QueryArgs),
}

#[derive(Parser)]
struct QueryArgs {
    /// The SQL to run, e.g. "SELECT * FROM calls".
    #[arg(long)]
    sql: String,

    /// Database file name inside the blob container (e.g. "calls.db").
    #[arg(long)]
    db_name: Option<String>,

    /// Local directory the database is downloaded into.
    #[arg(long)]
    db_dir: Option<PathBuf>,

    /// Blob container URL the database name is appended to.
    #[arg(long)]
    base_url: Option<String>,

    /// Adds `<column>_sin`/`<column>_cos` for a periodic column, e.g. `month=12`.
    /// May be repeated.
    #[arg(long, value_parser = parse_cyclical)]
    cyclical: Vec<(String, f64)>,

    /// Number of rows to print.
    #[arg(long, default_value_t = 5)]
    head: usize,

    /// Writes the full result to this Parquet file.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// Parses `column=max_value`.
fn parse_cyclical(raw: &str) -> Result<(String, f64)> {
    let (column, max) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected <column>=<max_value>, got '{}'", raw))?;
    let max: f64 = max
        .trim()
        .parse()
        .with_context(|| format!("invalid cycle length '{}'", max))?;
    Ok((column.trim().to_string(), max))
}

/// File/env configuration with the global CLI overrides applied.
fn settings_for(cli: &Cli) -> Result<Config> {
    let mut config = load_config(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    Ok(config)
}

// ==============================================================================
// Query Command Logic
// ==============================================================================

/// Handles the orchestration of the query command.
async fn handle_query(args: QueryArgs, config: &Config) -> Result<()> {
    let source_config = &config.data_source;
    let db_name = args
        .db_name
        .or_else(|| source_config.db_name.clone())
        .context("No database name given; pass --db-name or set data_source.db_name")?;
    let db_dir = args
        .db_dir
        .unwrap_or_else(|| PathBuf::from(&source_config.db_dir));

    let source = match &args.base_url {
        Some(base_url) => BlobStorageClient::new(base_url),
        None => BlobStorageClient::from_config(source_config),
    }
    .context("Failed to build the HTTP client")?;
    tracing::debug!(base_url = source.base_url(), "Using blob container.");
    let mut df = query_data_with_source(&source, &args.sql, &db_dir, &db_name)
        .await
        .with_context(|| format!("Query against {} failed", db_name))?;

    for (column, max_value) in &args.cyclical {
        df.add_cyclical_features(column, *max_value)
            .with_context(|| format!("Failed to add cyclical features for '{}'", column))?;
    }

    println!("Result shape: {:?}", df.shape());
    println!("{}", df.head(Some(args.head)));

    if let Some(path) = args.output {
        let mut file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create output file at {:?}", &path))?;
        ParquetWriter::new(&mut file).finish(&mut df)?;
        tracing::info!(path = %path.display(), "Saved result as Parquet.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclical_flag_parses_column_and_cycle() {
        assert_eq!(parse_cyclical("month=12").unwrap(), ("month".to_string(), 12.0));
        assert_eq!(parse_cyclical(" hour = 24 ").unwrap(), ("hour".to_string(), 24.0));
        assert!(parse_cyclical("month").is_err());
        assert!(parse_cyclical("month=twelve").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
