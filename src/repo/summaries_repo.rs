//! Flight and controller summary persistence (§4.5 `insert_flight_summary`,
//! `insert_controller_summary`). Summaries are immutable once written;
//! reprocessing replaces the whole record by natural key (§3).

use anyhow::Context;
use diesel::prelude::*;

use crate::error::CoreError;
use crate::models::{ControllerSummary, FlightSummary, NewControllerSummaryRow, NewFlightSummaryRow};
use crate::repo::PgPool;

#[derive(Clone)]
pub struct SummariesRepository {
    pool: PgPool,
}

impl SummariesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_flight_summary(&self, summary: &FlightSummary) -> Result<(), CoreError> {
        use crate::schema::flight_summaries::dsl::*;

        let row = NewFlightSummaryRow::try_from(summary)
            .context("serializing flight summary interaction array")
            .map_err(CoreError::Detector)?;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            diesel::insert_into(flight_summaries)
                .values(&row)
                .on_conflict((callsign, logon_time))
                .do_update()
                .set(&row)
                .execute(&mut conn)
                .context("inserting flight summary")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)?;
        Ok(())
    }

    pub async fn insert_controller_summary(&self, summary: &ControllerSummary) -> Result<(), CoreError> {
        use crate::schema::controller_summaries::dsl::*;

        let row = NewControllerSummaryRow::try_from(summary)
            .context("serializing controller summary interaction array")
            .map_err(CoreError::Detector)?;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            diesel::insert_into(controller_summaries)
                .values(&row)
                .on_conflict((callsign, online_at))
                .do_update()
                .set(&row)
                .execute(&mut conn)
                .context("inserting controller summary")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)?;
        Ok(())
    }
}
