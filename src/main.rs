use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};

use lending_club_etl::config::Config;
use lending_club_etl::csv_io::{read_dataset, write_dataset};
use lending_club_etl::dataset::Dataset;
use lending_club_etl::db::SqliteStorage;
use lending_club_etl::logging;
use lending_club_etl::pipeline::{clean_and_validate, CleaningReport};
use lending_club_etl::schema::LOAN_SCHEMA;
use lending_club_etl::storage::{InMemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "lending-club-etl")]
#[command(about = "Cleans Lending Club loan exports and loads them into a relational table")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a loan CSV, clean it and write it to the configured table
    Load {
        /// Loan export to ingest
        input: PathBuf,
        /// TOML config file (defaults to ./loan_etl.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the cleaning report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
        /// Clean and write to in-memory storage only
        #[arg(long)]
        dry_run: bool,
    },
    /// Load a loan CSV, clean it and write the cleaned rows to another CSV
    Clean {
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn print_report(report: &CleaningReport) {
    println!("\n📊 Cleaning Results (run {}):", report.run_id);
    println!("   Rows in: {}", report.rows_in);
    println!("   Rows out: {}", report.rows_out);
    println!("   Duplicates removed: {}", report.duplicates_removed);
    println!("   Rows without member id: {}", report.rows_missing_member_id);
    println!("   Cells coerced to zero: {}", report.total_cells_coerced());
    println!("   Values made non-negative: {}", report.values_sign_flipped);
    println!("   Date columns converted: {}", report.date_columns_converted.len());
    println!("   Defaults filled: {}", report.total_defaults_filled());
    if !report.columns_skipped.is_empty() {
        println!("\n⚠️  Columns skipped:");
        for skipped in &report.columns_skipped {
            println!("   - [{}] {}: {}", skipped.step, skipped.column, skipped.reason);
        }
    }
}

fn write_report(path: &Path, report: &CleaningReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!(path = %path.display(), "Cleaning report written");
    println!("📝 Report written to {}", path.display());
    Ok(())
}

fn clean_file(
    input: &Path,
    config: &Config,
    report_path: Option<&Path>,
) -> anyhow::Result<Dataset> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let dataset = read_dataset(input, &config.input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let (cleaned, report) = clean_and_validate(dataset).context("Cleaning failed")?;
    print_report(&report);
    if let Some(path) = report_path {
        write_report(path, &report)?;
    }
    Ok(cleaned)
}

fn run_load(
    input: &Path,
    config: &Config,
    report_path: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let cleaned = clean_file(input, config, report_path)?;
    let options = config.write_options();

    let mut storage: Box<dyn Storage> = if dry_run {
        println!("🧪 Dry run: writing to in-memory storage");
        Box::new(InMemoryStorage::new())
    } else {
        Box::new(
            SqliteStorage::open(&config.database.path)
                .with_context(|| format!("Failed to open database {}", config.database.path.display()))?,
        )
    };

    match storage.write(&cleaned, &LOAN_SCHEMA, &options) {
        Ok(written) => {
            println!("✅ {} rows written to table '{}'", written, options.table);
            Ok(())
        }
        Err(e) => {
            error!(table = %options.table, "Error during database insertion: {}", e);
            println!("❌ Database insertion failed: {}", e);
            Err(e).context("Database insertion failed")
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Commands::Load { config, .. } | Commands::Clean { config, .. } => config.clone(),
    };
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;
    logging::init_logging(&config.logging)?;

    let span = info_span!("lending_club_etl", version = env!("CARGO_PKG_VERSION"));
    let _enter = span.enter();

    match cli.command {
        Commands::Load {
            input,
            report,
            dry_run,
            ..
        } => {
            println!("🚀 Loading {} into table '{}'...", input.display(), config.database.table);
            run_load(&input, &config, report.as_deref(), dry_run)?;
        }
        Commands::Clean {
            input,
            output,
            report,
            ..
        } => {
            println!("🔨 Cleaning {}...", input.display());
            let cleaned = clean_file(&input, &config, report.as_deref())?;
            write_dataset(&output, &cleaned)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("✅ {} cleaned rows written to {}", cleaned.len(), output.display());
        }
    }

    Ok(())
}
