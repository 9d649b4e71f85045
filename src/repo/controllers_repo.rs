//! Controller persistence and offline transitions (§4.5 `upsert_controllers`,
//! `mark_controllers_offline`).

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::error::CoreError;
use crate::models::{ControllerObs, ControllerRecord, ControllerRow, ControllerStatus};
use crate::repo::{PgPool, UPSERT_BATCH_SIZE};

#[derive(Clone)]
pub struct ControllersRepository {
    pool: PgPool,
}

impl ControllersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert_controllers(&self, batch: Vec<ControllerObs>) -> Result<usize, CoreError> {
        use crate::schema::controllers::dsl::*;

        let rows: Vec<ControllerRow> = batch.iter().map(ControllerRow::from).collect();

        let pool = self.pool.clone();
        let mut total = 0usize;
        for chunk in rows.chunks(UPSERT_BATCH_SIZE) {
            let chunk = chunk.to_vec();
            let pool = pool.clone();
            total += tokio::task::spawn_blocking(move || {
                let mut conn = pool.get().context("acquiring db connection")?;
                diesel::insert_into(controllers)
                    .values(&chunk)
                    .on_conflict(callsign)
                    .do_update()
                    .set((
                        cid.eq(excluded(cid)),
                        name.eq(excluded(name)),
                        facility.eq(excluded(facility)),
                        rating.eq(excluded(rating)),
                        frequency_hz.eq(excluded(frequency_hz)),
                        visual_range_nm.eq(excluded(visual_range_nm)),
                        atis.eq(excluded(atis)),
                        status.eq(excluded(status)),
                        last_seen.eq(excluded(last_seen)),
                        offline_at.eq(Option::<DateTime<Utc>>::None),
                        updated_at.eq(excluded(updated_at)),
                    ))
                    .execute(&mut conn)
                    .context("upserting controllers")
            })
            .await
            .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
            .map_err(CoreError::PersistenceTransient)?;
        }
        Ok(total)
    }

    /// Transitions every callsign present in the store but absent from
    /// `current_callsigns` to `status = offline`, and returns the set that
    /// newly transitioned this call — the Coordinator feeds each into
    /// `Summarizer.controller()` (§4.6 step 4d).
    pub async fn mark_controllers_offline(
        &self,
        previously_seen: Vec<String>,
        current_callsigns: Vec<String>,
    ) -> Result<Vec<String>, CoreError> {
        use crate::schema::controllers::dsl::*;

        let absent: Vec<String> = previously_seen
            .into_iter()
            .filter(|c| !current_callsigns.contains(c))
            .collect();
        if absent.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.pool.clone();
        let absent_for_query = absent.clone();
        let now = Utc::now();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            diesel::update(
                controllers
                    .filter(callsign.eq_any(&absent_for_query))
                    .filter(status.eq(ControllerStatus::Online.as_str())),
            )
            .set((
                status.eq(ControllerStatus::Offline.as_str()),
                offline_at.eq(now),
                updated_at.eq(now),
            ))
            .execute(&mut conn)
            .context("marking controllers offline")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)?;

        Ok(absent)
    }

    /// Every currently-online controller, used to warm-start the in-memory
    /// buffer (C4) and the Coordinator's previous-callsign set on startup.
    pub async fn load_online(&self) -> Result<Vec<ControllerObs>, CoreError> {
        use crate::schema::controllers::dsl::*;

        let pool = self.pool.clone();
        let rows: Vec<ControllerRecord> = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            controllers
                .filter(status.eq(ControllerStatus::Online.as_str()))
                .load::<ControllerRecord>(&mut conn)
                .context("loading online controllers")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)?;

        Ok(rows
            .into_iter()
            .map(|r| ControllerObs {
                callsign: r.callsign,
                cid: r.cid,
                name: r.name,
                facility: r.facility,
                rating: r.rating,
                frequency_hz: r.frequency_hz,
                visual_range_nm: r.visual_range_nm,
                atis: r.atis,
                logon_time: r.online_at,
                observation_time: r.last_seen,
            })
            .collect())
    }

    pub async fn find_by_callsign(&self, target_callsign: String) -> Result<Option<ControllerRecord>, CoreError> {
        use crate::schema::controllers::dsl::*;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            controllers
                .filter(callsign.eq(target_callsign))
                .first::<ControllerRecord>(&mut conn)
                .optional()
                .context("loading controller")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }

    /// Facility pre-load map consulted by the Matcher (C9) before the
    /// detection query, never by join — the correctness lesson behind this
    /// being load-bearing rather than optional is recorded in §9.
    pub async fn facility_map(&self) -> Result<std::collections::HashMap<String, i32>, CoreError> {
        use crate::schema::controllers::dsl::*;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            controllers
                .select((callsign, facility))
                .load::<(String, i32)>(&mut conn)
                .map(|rows| rows.into_iter().collect())
                .context("loading facility map")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_computation_is_pure_set_difference() {
        let previous = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let current = vec!["B".to_string()];
        let absent: Vec<String> = previous.into_iter().filter(|c| !current.contains(c)).collect();
        assert_eq!(absent, vec!["A".to_string(), "C".to_string()]);
    }
}
