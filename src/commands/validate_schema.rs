//! `aerostat validate-schema`: runs embedded migrations against
//! `DATABASE_URL` and exits, without starting the polling loop (§10.1).

use anyhow::Context;

use crate::config::Config;
use crate::db;

pub async fn handle_validate_schema() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    let pool = db::build_pool(&config).context("building database pool")?;
    db::validate_schema(&pool).context("validating schema")?;
    println!("schema validated");
    Ok(())
}
