use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod db;
mod gpa;
mod models;
mod report;

#[derive(Parser)]
#[command(name = "cgpa-aggregator")]
#[command(about = "CGPA aggregation and batch statistics for student records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import grade rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute CGPA summaries per student
    #[command(group(
        ArgGroup::new("scope")
            .args(["batch", "index"])
            .multiple(false)
    ))]
    Summary {
        #[arg(long)]
        batch: Option<String>,
        #[arg(long)]
        index: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate a markdown report with batch statistics
    #[command(group(
        ArgGroup::new("scope")
            .args(["batch", "index"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        batch: Option<String>,
        #[arg(long)]
        index: Option<String>,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} grade rows from {}.", csv.display());
        }
        Commands::Summary {
            batch,
            index,
            limit,
            json,
        } => {
            let records = db::fetch_grades(&pool, batch.as_deref(), index.as_deref()).await?;
            let table = gpa::GradePointTable::standard();
            let summaries = gpa::summarize_students(&table, &records);

            if summaries.is_empty() {
                println!("No grade records found for this scope.");
                return Ok(());
            }

            if json {
                let mut top = gpa::top_n(&summaries, limit);
                for summary in top.iter_mut() {
                    summary.cgpa = gpa::round2(summary.cgpa);
                }
                println!("{}", serde_json::to_string_pretty(&top)?);
            } else {
                println!("Students by CGPA:");
                for summary in summaries.iter().take(limit) {
                    println!(
                        "- {} ({}, batch {}) CGPA {:.2} over {} credits in {} modules",
                        summary.student_name,
                        summary.index_number,
                        summary.batch,
                        summary.cgpa,
                        summary.total_credits,
                        summary.module_count
                    );
                    for note in summary.anomalies.iter() {
                        println!("  anomaly: {note}");
                    }
                }
            }
        }
        Commands::Report {
            batch,
            index,
            top,
            out,
        } => {
            let records = db::fetch_grades(&pool, batch.as_deref(), index.as_deref()).await?;
            let table = gpa::GradePointTable::standard();
            let generated_on = Utc::now().date_naive();
            let report = report::build_report(
                batch.as_deref().or(index.as_deref()),
                top,
                generated_on,
                &table,
                &records,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
