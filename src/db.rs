//! Connection pool construction and schema validation (§4.5).

use std::time::Duration;

use anyhow::Context;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::config::Config;
use crate::error::CoreError;
use crate::repo::PgPool;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Builds the shared connection pool per §4.5's sizing contract (pool size
/// 20, overflow 40 — modeled here as `max_size = pool_size + max_overflow`,
/// since r2d2 does not distinguish a separate overflow tier) and §5's
/// timeouts (acquire 30 s).
pub fn build_pool(config: &Config) -> Result<PgPool, CoreError> {
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    Pool::builder()
        .max_size(config.db_pool_size + config.db_max_overflow)
        .min_idle(Some(config.db_pool_size))
        .connection_timeout(Duration::from_secs(30))
        .build(manager)
        .context("building database connection pool")
        .map_err(CoreError::Configuration)
}

/// Runs every pending embedded migration. Migrations use `CREATE TABLE IF
/// NOT EXISTS`/`CREATE INDEX IF NOT EXISTS` throughout, so repeated runs
/// against an already-current schema are no-ops (§4.5, §6 "idempotent").
pub fn validate_schema(pool: &PgPool) -> Result<(), CoreError> {
    let mut conn = pool
        .get()
        .context("acquiring connection for schema validation")
        .map_err(CoreError::PersistenceFatal)?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| CoreError::PersistenceFatal(anyhow::anyhow!("running migrations: {e}")))?;

    info!("schema validated");
    Ok(())
}
