//! Frequency match persistence (§4.5 `insert_frequency_matches`), the
//! building block both summary arrays are derived from (§4.10).

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::error::CoreError;
use crate::models::{FrequencyMatch, FrequencyMatchRow, NewFrequencyMatchRow};
use crate::repo::{PgPool, UPSERT_BATCH_SIZE};

#[derive(Clone)]
pub struct MatchesRepository {
    pool: PgPool,
}

impl MatchesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_frequency_matches(&self, batch: Vec<FrequencyMatch>) -> Result<usize, CoreError> {
        let rows: Vec<NewFrequencyMatchRow> = batch.iter().map(NewFrequencyMatchRow::from).collect();

        let pool = self.pool.clone();
        let mut total = 0usize;
        for chunk in rows.chunks(UPSERT_BATCH_SIZE) {
            let chunk = chunk.to_vec();
            let pool = pool.clone();
            total += tokio::task::spawn_blocking(move || {
                use crate::schema::frequency_matches::dsl::frequency_matches;
                let mut conn = pool.get().context("acquiring db connection")?;
                diesel::insert_into(frequency_matches)
                    .values(&chunk)
                    .execute(&mut conn)
                    .context("inserting frequency matches")
            })
            .await
            .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
            .map_err(CoreError::PersistenceTransient)?;
        }
        Ok(total)
    }

    /// Matches for one pilot overlapping `[span_start, span_end]`, used by
    /// `Summarizer.flight()` to build `controller_interactions` (§4.10).
    pub async fn for_pilot_in_span(
        &self,
        target_callsign: String,
        span_start: DateTime<Utc>,
        span_end: DateTime<Utc>,
    ) -> Result<Vec<FrequencyMatchRow>, CoreError> {
        use crate::schema::frequency_matches::dsl::*;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            frequency_matches
                .filter(pilot_callsign.eq(target_callsign))
                .load::<FrequencyMatchRow>(&mut conn)
                .map(|rows| {
                    rows.into_iter()
                        .filter(|r| r.first_seen <= span_end && r.last_seen >= span_start)
                        .collect()
                })
                .context("loading matches for pilot")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }

    /// Matches for one controller overlapping `[span_start, span_end]`, used
    /// by `Summarizer.controller()` to build `aircraft_interactions`.
    pub async fn for_controller_in_span(
        &self,
        controller_cs: String,
        span_start: DateTime<Utc>,
        span_end: DateTime<Utc>,
    ) -> Result<Vec<FrequencyMatchRow>, CoreError> {
        use crate::schema::frequency_matches::dsl::*;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            frequency_matches
                .filter(controller_callsign.eq(controller_cs))
                .load::<FrequencyMatchRow>(&mut conn)
                .map(|rows| {
                    rows.into_iter()
                        .filter(|r| r.first_seen <= span_end && r.last_seen >= span_start)
                        .collect()
                })
                .context("loading matches for controller")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }
}
