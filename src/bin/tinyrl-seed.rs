use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tinyrl::analytics::ClickRecorder;
use tinyrl::config::Config;
use tinyrl::seed::{self, DateRange, SeedOptions, DEFAULT_BATCH_SIZE, DEMO_CODE, DEMO_URL};
use tinyrl::storage;

#[derive(Parser)]
#[command(name = "tinyrl-seed")]
#[command(about = "Populate the demo link with a year of synthetic clicks", long_about = None)]
struct Cli {
    /// Last day of the seeded year (YYYY-MM-DD, UTC). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// RNG seed for reproducible runs. A random one is drawn and logged if omitted.
    #[arg(long)]
    rng_seed: Option<u64>,

    #[arg(long, default_value = DEMO_CODE)]
    demo_code: String,

    #[arg(long, default_value = DEMO_URL)]
    demo_url: String,

    /// Rows per multi-row insert
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let end = cli.end.unwrap_or_else(|| Utc::now().date_naive());
    let range = DateRange::year_ending(end)?;

    let rng_seed = cli.rng_seed.unwrap_or_else(rand::random::<u64>);
    info!(rng_seed, "using RNG seed");
    let mut rng = StdRng::seed_from_u64(rng_seed);

    let storage = storage::connect(&config.database).await?;
    let recorder = ClickRecorder::from_config(&config.analytics)?;

    let options = SeedOptions {
        range,
        demo_code: cli.demo_code,
        demo_url: cli.demo_url,
        batch_size: cli.batch_size,
    };

    let outcome = seed::seed(storage.as_ref(), &options, &recorder, &mut rng).await;
    storage.close().await;
    let report = outcome.context("seeding failed, no rows were kept")?;

    println!(
        "✓ Seeded {} clicks for '{}' over {} days ({} batches, {} to {})",
        report.inserted,
        options.demo_code,
        report.days,
        report.batches,
        options.range.start(),
        options.range.end()
    );

    Ok(())
}
