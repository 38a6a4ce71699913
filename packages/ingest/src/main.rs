#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for ingesting and inspecting campus metrics.

use std::path::PathBuf;
use std::process::ExitCode;

use campus_kpi_database::{db, paths, run_migrations};
use campus_kpi_ingest::{IngestError, ingest_path};
use campus_kpi_ingest_models::IngestConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "campus_kpi_ingest", about = "Campus metric ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a `.csv`, `.xlsx` or `.xls` metric file
    Ingest {
        /// Path to the file
        file: PathBuf,
    },
    /// Print stored records ordered by year, department and metric type
    Query {
        /// Only records for this year
        #[arg(long)]
        year: Option<String>,
        /// Only records for this department code
        #[arg(long)]
        department: Option<String>,
    },
    /// Print the dashboard chart payload as JSON
    Chart {
        /// Only records for this year
        #[arg(long)]
        year: Option<String>,
        /// Only records for this department code
        #[arg(long)]
        department: Option<String>,
    },
    /// Create the database schema
    Migrate,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Migrate => {
            log::info!(
                "Running database migrations on {}...",
                paths::metrics_db_path().display()
            );
            let conn = db::open_from_env()?;
            run_migrations(&conn)?;
            log::info!("Migrations complete.");
        }
        Commands::Ingest { file } => {
            let config = IngestConfig::from_env();
            let mut conn = db::open_from_env()?;

            match ingest_path(&mut conn, &file, &config) {
                Ok(report) => {
                    for failure in &report.failures {
                        println!("  {failure}");
                    }
                    println!("{}", report.summary);
                }
                Err(IngestError::Validation { message }) => {
                    log::error!("Rejected {}", file.display());
                    return Err(message.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Query { year, department } => {
            let filters = campus_kpi_dashboard::parse_filters(year.as_deref(), department.as_deref())?;
            let conn = db::open_from_env()?;
            let records = campus_kpi_dashboard::query(&conn, &filters)?;

            println!(
                "{:<6} {:<24} {:<26} {:>20}",
                "YEAR", "DEPARTMENT", "METRIC_TYPE", "VALUE"
            );
            println!("{}", "-".repeat(79));
            for record in &records {
                println!(
                    "{:<6} {:<24} {:<26} {:>20}",
                    record.year, record.department, record.metric_type, record.metric_value
                );
            }
            println!("{} records", records.len());
        }
        Commands::Chart { year, department } => {
            let filters = campus_kpi_dashboard::parse_filters(year.as_deref(), department.as_deref())?;
            let conn = db::open_from_env()?;
            let chart = campus_kpi_dashboard::chart_data(&conn, &filters)?;
            println!("{}", serde_json::to_string_pretty(&chart)?);
        }
    }

    Ok(())
}
