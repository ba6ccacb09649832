//! Batch valuation runner - loads sale records and subjects, values each subject

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use property_valuation::api::BatchEntry;
use property_valuation::config::parse_flag;
use property_valuation::ingestion::parse::parse_price_paid_file;
use property_valuation::valuation::batch::valuate_batch;
use property_valuation::valuation::{SubjectProperty, ValuationConfig, ValuationEngine};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting batch valuation");

    let config = Config::from_env()?;
    info!("Configuration loaded");

    // Step 1: Load sale records
    info!("Step 1/3: Loading sale records...");
    let (sales, stats) = parse_price_paid_file(&config.sales_csv)?;
    if stats.skipped > 0 {
        warn!("{} sale records were unusable and skipped", stats.skipped);
    }
    info!("✓ Loaded {} sale records", sales.len());

    // Step 2: Load subjects
    info!("Step 2/3: Loading subjects...");
    let raw = std::fs::read_to_string(&config.subjects_json)
        .with_context(|| format!("failed to read subjects from {:?}", config.subjects_json))?;
    let subjects: Vec<SubjectProperty> =
        serde_json::from_str(&raw).context("subjects file must be a JSON array of subjects")?;
    info!("✓ Loaded {} subjects", subjects.len());

    // Step 3: Value
    info!(
        "Step 3/3: Valuing as of {}...",
        config.reference_date
    );
    let engine = ValuationEngine::new(
        ValuationConfig::default().with_location_free_matching(config.allow_location_free),
    );
    let outcomes = valuate_batch(
        Arc::new(engine),
        subjects,
        sales.into(),
        config.reference_date,
    )
    .await;

    let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    let entries: Vec<BatchEntry> = outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| BatchEntry::from_outcome(index, outcome))
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);

    info!(
        "Batch valuation complete: {} valued, {} rejected",
        entries.len() - failed,
        failed
    );

    Ok(())
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
struct Config {
    sales_csv: PathBuf,
    subjects_json: PathBuf,
    reference_date: NaiveDate,
    allow_location_free: bool,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let reference_date = match env::var("REFERENCE_DATE") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("REFERENCE_DATE must be YYYY-MM-DD, got {:?}", raw))?,
            Err(_) => Utc::now().date_naive(),
        };

        Ok(Config {
            sales_csv: env::var("SALES_CSV")
                .context("SALES_CSV must be set")?
                .into(),
            subjects_json: env::var("SUBJECTS_JSON")
                .context("SUBJECTS_JSON must be set")?
                .into(),
            reference_date,
            allow_location_free: parse_flag(
                "ALLOW_LOCATION_FREE",
                env::var("ALLOW_LOCATION_FREE").ok(),
            )?,
        })
    }
}
