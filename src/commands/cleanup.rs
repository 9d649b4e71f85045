//! `aerostat cleanup --retention-hours <H>`: a one-shot run of the same
//! history-pruning sweep the Coordinator performs every 30 minutes (§4.5
//! `cleanup_old`), for operators who want it off the polling cadence — e.g.
//! before a maintenance window or to reclaim space after lowering
//! `RETENTION_H` (§10.1).

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::repo::{PilotsRepository, TransceiversRepository};

pub async fn handle_cleanup(retention_hours: Option<u64>) -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    let pool = db::build_pool(&config).context("building database pool")?;

    let retention = match retention_hours {
        Some(h) => chrono::Duration::hours(h as i64),
        None => chrono::Duration::from_std(config.retention).unwrap_or(chrono::Duration::hours(24)),
    };

    let pilots_repo = PilotsRepository::new(pool.clone());
    let transceivers_repo = TransceiversRepository::new(pool.clone());

    let positions_deleted = pilots_repo.cleanup_old(retention).await?;
    let transceivers_deleted = transceivers_repo.cleanup_old(retention).await?;

    info!(positions_deleted, transceivers_deleted, retention_hours = retention.num_hours(), "cleanup complete");
    println!("deleted {positions_deleted} position rows and {transceivers_deleted} transceiver rows older than {}h", retention.num_hours());
    Ok(())
}
