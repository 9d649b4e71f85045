//! Transceiver history persistence (§4.5 `insert_transceivers`), the sole
//! source the Matcher (C9) reads from.

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::error::CoreError;
use crate::models::{EntityType, NewTransceiverRow, TransceiverObs, TransceiverRow};
use crate::repo::{PgPool, UPSERT_BATCH_SIZE};

#[derive(Clone)]
pub struct TransceiversRepository {
    pool: PgPool,
}

impl TransceiversRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pure append, deduplicated by natural key `(entity_type, callsign,
    /// transceiver_index, observation_time)` (§3).
    pub async fn insert_transceivers(&self, batch: Vec<TransceiverObs>) -> Result<usize, CoreError> {
        use crate::schema::transceivers::dsl::*;

        let valid: Vec<NewTransceiverRow> = batch
            .iter()
            .filter(|t| (-90.0..=90.0).contains(&t.lat) && (-180.0..=180.0).contains(&t.lon))
            .map(NewTransceiverRow::from)
            .collect();

        let pool = self.pool.clone();
        let mut total = 0usize;
        for chunk in valid.chunks(UPSERT_BATCH_SIZE) {
            let chunk = chunk.to_vec();
            let pool = pool.clone();
            total += tokio::task::spawn_blocking(move || {
                let mut conn = pool.get().context("acquiring db connection")?;
                diesel::insert_into(transceivers)
                    .values(&chunk)
                    .on_conflict((entity_type, callsign, transceiver_index, observation_time))
                    .do_nothing()
                    .execute(&mut conn)
                    .context("inserting transceiver history")
            })
            .await
            .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
            .map_err(CoreError::PersistenceTransient)?;
        }
        Ok(total)
    }

    /// Transceiver observations of one entity type within `[since, now]`,
    /// used by the Matcher's per-bucket scan (§4.9 steps 1-2).
    pub async fn in_window(
        &self,
        entity: EntityType,
        since: DateTime<Utc>,
    ) -> Result<Vec<TransceiverRow>, CoreError> {
        use crate::schema::transceivers::dsl::*;

        let entity_str = entity.as_str().to_string();
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            transceivers
                .filter(entity_type.eq(entity_str))
                .filter(observation_time.ge(since))
                .order(observation_time.asc())
                .load::<TransceiverRow>(&mut conn)
                .context("loading transceiver window")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }

    pub async fn cleanup_old(&self, retention: chrono::Duration) -> Result<usize, CoreError> {
        use crate::schema::transceivers::dsl::*;

        let cutoff = Utc::now() - retention;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            diesel::delete(transceivers.filter(observation_time.lt(cutoff)))
                .execute(&mut conn)
                .context("cleaning up old transceiver history")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }
}
