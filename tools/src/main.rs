//! retention-cli: query churn risk for one partition from a SQLite store.
//!
//! Usage:
//!   retention-cli --db pos.db --partition 3
//!   retention-cli --db pos.db --partition 3 --tier critical --page 2 --limit 20
//!   retention-cli --synthesize 500 --seed 7 --partition 3

use anyhow::Result;
use retention_core::{
    config::RetentionConfig,
    engine::RetentionEngine,
    query::QueryRequest,
    scoring::RiskTier,
    store::TransactionStore,
    synth::{self, SynthConfig},
    types::PartitionKey,
};
use std::env;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let partition: PartitionKey = parse_arg(&args, "--partition", 3);
    let page = parse_arg(&args, "--page", 1usize);
    let synthesize = parse_arg(&args, "--synthesize", 0usize);
    let seed = parse_arg(&args, "--seed", 42u64);
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let tier = string_arg(&args, "--tier")
        .map(|t| t.parse::<RiskTier>().map_err(anyhow::Error::msg))
        .transpose()?;

    let config = match RetentionConfig::load(data_dir) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; falling back to built-in defaults");
            RetentionConfig::default()
        }
    };
    let limit = parse_arg(&args, "--limit", config.default_page_limit);

    let store = TransactionStore::open(db)?;
    store.migrate()?;

    if synthesize > 0 {
        let today = chrono::Utc::now().date_naive();
        let rows = synth::synthesize(seed, &SynthConfig::new(synthesize, today));
        let inserted = store.insert_batch(partition, &rows)?;
        log::info!("synthesized {inserted} rows for {synthesize} customers (seed={seed})");
    }
    log::info!(
        "partition {partition}: {} rows in {db}",
        store.count_for_partition(partition)?,
    );

    let engine = RetentionEngine::with_system_clock(config, Arc::new(store));

    let mut request = QueryRequest::new(partition, page, limit);
    request.tier = tier;

    let response = engine.query(&request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
