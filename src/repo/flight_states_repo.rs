//! Flight lifecycle persistence (§4.5 `update_flight_status`, §4.8).

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::error::CoreError;
use crate::models::{CompletionMethod, FlightState, FlightStateRow, FlightStatus};
use crate::repo::PgPool;

#[derive(Clone)]
pub struct FlightStatesRepository {
    pool: PgPool,
}

impl FlightStatesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent upsert keyed by `(callsign, logon_time)`, the Flight
    /// Completion state machine's sole persistence point (§4.8).
    pub async fn upsert(&self, state: FlightState) -> Result<(), CoreError> {
        use crate::schema::flight_states::dsl::*;

        let row = FlightStateRow::from(&state);
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            diesel::insert_into(flight_states)
                .values(&row)
                .on_conflict((callsign, logon_time))
                .do_update()
                .set(&row)
                .execute(&mut conn)
                .context("upserting flight state")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)?;
        Ok(())
    }

    pub async fn find(
        &self,
        flight_callsign: String,
        flight_logon_time: DateTime<Utc>,
    ) -> Result<Option<FlightState>, CoreError> {
        use crate::schema::flight_states::dsl::*;

        let pool = self.pool.clone();
        let row: Option<FlightStateRow> = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            flight_states
                .filter(callsign.eq(flight_callsign))
                .filter(logon_time.eq(flight_logon_time))
                .first::<FlightStateRow>(&mut conn)
                .optional()
                .context("loading flight state")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)?;

        Ok(row.map(row_to_state))
    }

    /// Every flight not yet in a terminal state, scanned each cycle by
    /// Flight Completion (§4.8) to evaluate stale/timeout transitions.
    pub async fn active_and_stale(&self) -> Result<Vec<FlightState>, CoreError> {
        use crate::schema::flight_states::dsl::*;

        let pool = self.pool.clone();
        let rows: Vec<FlightStateRow> = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().context("acquiring db connection")?;
            flight_states
                .filter(status.ne(FlightStatus::Completed.as_str()))
                .load::<FlightStateRow>(&mut conn)
                .context("loading active/stale flight states")
        })
        .await
        .map_err(|e| CoreError::PersistenceTransient(anyhow::anyhow!(e)))?
        .map_err(CoreError::PersistenceTransient)?;

        Ok(rows.into_iter().map(row_to_state).collect())
    }
}

fn row_to_state(row: FlightStateRow) -> FlightState {
    FlightState {
        callsign: row.callsign,
        logon_time: row.logon_time,
        cid: row.cid,
        status: FlightStatus::from_str(&row.status).unwrap_or(FlightStatus::Active),
        landed_at: row.landed_at,
        landing_airport_icao: row.landing_airport_icao,
        completed_at: row.completed_at,
        completion_method: row.completion_method.as_deref().and_then(method_from_str),
        completion_confidence: row.completion_confidence,
        last_seen_at: row.last_seen_at,
    }
}

fn method_from_str(s: &str) -> Option<CompletionMethod> {
    match s {
        "landing" => Some(CompletionMethod::Landing),
        "timeout" => Some(CompletionMethod::Timeout),
        "manual" => Some(CompletionMethod::Manual),
        _ => None,
    }
}
