use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

use crate::telemetry::{self};
use crate::telemetry::ops::init::Phase as InitPhase;

#[derive(Serialize)]
struct InitResult {
    migrations: usize,
}

pub async fn run(pool: &PgPool) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span().entered();
    let _s = log.span(&InitPhase::Migrate).entered();

    // Apply any pending migrations (idempotent)
    let migrator = sqlx::migrate!();
    migrator.run(pool).await.context("error applying migrations")?;

    log.info("Database initialized successfully");
    if telemetry::config::json_mode() {
        log.result(&InitResult { migrations: migrator.iter().count() })?;
    }
    Ok(())
}
