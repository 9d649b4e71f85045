//! Pilot and position-history persistence (§4.5 `upsert_pilots`,
//! `insert_positions`).

use anyhow::Context;
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::error::CoreError;
use crate::models::{FlightPositionRow, NewFlightPositionRow, NewPilotRow, PilotObs, PilotRecord};
use crate::repo::{PgPool, UPSERT_BATCH_SIZE};

#[derive(Clone)]
pub struct PilotsRepository {
    pool: PgPool,
}

impl PilotsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts current pilot state, conflict target `callsign` (§4.5).
    /// Records that fail the coordinate/altitude range invariant (§8
    /// "coordinate coercion") are dropped before submission, not clamped.
    pub async fn upsert_pilots(&self, batch: Vec<PilotObs>) -> Result<usize, CoreError> {
        use crate::schema::pilots::dsl::*;

        let valid: Vec<NewPilotRow> = batch
            .iter()
            .filter(|p| record_in_range(p.lat, p.lon, p.altitude_ft))
            .map(NewPilotRow::from)
            .collect();

        let pool = self.pool.clone();
        let mut total = 0usize;
        for chunk in valid.chunks(UPSERT_BATCH_SIZE) {
            let chunk = chunk.to_vec();
            let pool = pool.clone();
            total += tokio::task::spawn_blocking(move || {
                let mut conn = pool.get().context("acquiring db connection")?;
                diesel::insert_into(pilots)
                    .values(&chunk)
                    .on_conflict(callsign)
                    .do_update()
                    .set((
                        cid.eq(excluded(cid)),
                        logon_time.eq(excluded(logon_time)),
                        aircraft_type.eq(excluded(aircraft_type)),
                        lat.eq(excluded(lat)),
                        lon.eq(excluded(lon)),
                        altitude_ft.eq(excluded(altitude_ft)),
                        groundspeed_kt.eq(excluded(groundspeed_kt)),
                        heading_deg.eq(excluded(heading_deg)),
                        transponder.eq(excluded(transponder)),
                        departure.eq(excluded(departure)),
                        arrival.eq(excluded(arrival)),
                        route.eq(excluded(route)),
                        cruise_tas.eq(excluded(cruise_tas)),
                        planned_altitude.eq(excluded(planned_altitude)),
                        deptime.eq(excluded(deptime)),
                        remarks.eq(excluded(remarks)),
                        flight_rules.eq(excluded(flight_rules)),
                        observation_time.eq(excluded(observation_time)),
                        updated_at.eq(excluded(updated_at)),
                    ))
                    .execute(&mut conn)
                    .context("upserting pilots")
            })
            .await
            .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
            .map_err(CoreError::PersistenceTransient)?;
        }
        Ok(total)
    }

    /// Pure append to the position-history table (§4.5 `insert_positions`).
    /// Deduplicated by the natural key `(callsign, observation_time)` via
    /// `ON CONFLICT DO NOTHING`, so a replayed snapshot is a no-op (§8
    /// idempotence).
    pub async fn insert_positions(&self, batch: Vec<PilotObs>) -> Result<usize, CoreError> {
        use crate::schema::flights::dsl::*;

        let valid: Vec<NewFlightPositionRow> = batch
            .iter()
            .filter(|p| record_in_range(p.lat, p.lon, p.altitude_ft))
            .map(NewFlightPositionRow::from)
            .collect();

        let pool = self.pool.clone();
        let mut total = 0usize;
        for chunk in valid.chunks(UPSERT_BATCH_SIZE) {
            let chunk = chunk.to_vec();
            let pool = pool.clone();
            total += tokio::task::spawn_blocking(move || {
                let mut conn = pool.get().context("acquiring db connection")?;
                diesel::insert_into(flights)
                    .values(&chunk)
                    .on_conflict((callsign, observation_time))
                    .do_nothing()
                    .execute(&mut conn)
                    .context("inserting position history")
            })
            .await
            .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
            .map_err(CoreError::PersistenceTransient)?;
        }
        Ok(total)
    }

    /// Every currently-tracked pilot's latest state, used to warm-start the
    /// in-memory buffer (C4) on process startup so a restart doesn't treat
    /// every in-flight aircraft as newly logged on.
    pub async fn load_latest(&self) -> Result<Vec<PilotObs>, CoreError> {
        use crate::schema::pilots::dsl::*;

        let pool = self.pool.clone();
        let rows: Vec<PilotRecord> = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            pilots
                .load::<PilotRecord>(&mut conn)
                .context("loading latest pilot state")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)?;

        Ok(rows.into_iter().map(PilotObs::from).collect())
    }

    /// Position history for one flight, used by the Summarizer (§4.10).
    pub async fn position_history(
        &self,
        flight_callsign: String,
        flight_logon_time: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<FlightPositionRow>, CoreError> {
        use crate::schema::flights::dsl::*;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            flights
                .filter(callsign.eq(flight_callsign))
                .filter(logon_time.eq(flight_logon_time))
                .order(observation_time.asc())
                .load::<FlightPositionRow>(&mut conn)
                .context("loading position history")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }

    /// Deletes position history older than the retention window (§4.5
    /// `cleanup_old`).
    pub async fn cleanup_old(&self, retention: chrono::Duration) -> Result<usize, CoreError> {
        use crate::schema::flights::dsl::*;

        let cutoff = chrono::Utc::now() - retention;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            diesel::delete(flights.filter(observation_time.lt(cutoff)))
                .execute(&mut conn)
                .context("cleaning up old position history")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }

    /// Deletes position rows for one flight older than the retention
    /// window, invoked after a flight summary is written (§4.10 step 4).
    pub async fn cleanup_flight_positions(
        &self,
        flight_callsign: String,
        flight_logon_time: chrono::DateTime<chrono::Utc>,
        retention: chrono::Duration,
    ) -> Result<usize, CoreError> {
        use crate::schema::flights::dsl::*;

        let cutoff = chrono::Utc::now() - retention;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            diesel::delete(
                flights
                    .filter(callsign.eq(flight_callsign))
                    .filter(logon_time.eq(flight_logon_time))
                    .filter(observation_time.lt(cutoff)),
            )
            .execute(&mut conn)
            .context("cleaning up flight position history")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)
    }
}

/// §8 "coordinate coercion": reject, never clamp.
fn record_in_range(lat: f64, lon: f64, altitude_ft: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) && (-1000.0..=60000.0).contains(&altitude_ft)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(!record_in_range(91.0, 0.0, 0.0));
    }

    #[test]
    fn rejects_out_of_range_altitude() {
        assert!(!record_in_range(0.0, 0.0, 70_000.0));
    }

    #[test]
    fn accepts_in_range_values() {
        assert!(record_in_range(-33.9, 151.1, 35_000.0));
    }
}
