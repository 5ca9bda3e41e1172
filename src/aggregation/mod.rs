use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::telemetry::{self};
use crate::util::time::parse_duration;

pub mod cycle;
pub mod db;
pub mod fetch;
pub mod normalize;
pub mod schedule;
pub mod store;
pub mod types;

/// gator agg <time_between_reqs>
#[derive(Args)]
pub struct AggCmd {
    /// Time between requests, e.g. `30s`, `1m`, `1h30m`
    pub time_between_reqs: String,
}

/// Polls feeds until the process is terminated; there is no other way to stop it.
pub async fn run(pool: &PgPool, args: AggCmd) -> Result<()> {
    let log = telemetry::agg();
    let _g = log.root_span_kv([("time_between_reqs", args.time_between_reqs.clone())]).entered();

    let interval = parse_duration(&args.time_between_reqs)
        .with_context(|| format!("error parsing time between requests {:?}", args.time_between_reqs))?;
    log.info(format!("Collecting feeds every {}", args.time_between_reqs));

    let store = db::PgStore::new(pool.clone());
    let fetcher = fetch::HttpFetcher::new()?;
    schedule::run_scheduler(&store, &fetcher, interval, CancellationToken::new()).await
}
