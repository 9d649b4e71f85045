//! Flight completion state machine (§4.8). Persisted so the Coordinator
//! can resume correctly across restarts (at-least-once, idempotent upsert).

use chrono::{DateTime, Utc};
use diesel::prelude::*;

pub type FlightKey = (String, DateTime<Utc>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStatus {
    Active,
    Stale,
    Landed,
    Completed,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Active => "active",
            FlightStatus::Stale => "stale",
            FlightStatus::Landed => "landed",
            FlightStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(FlightStatus::Active),
            "stale" => Some(FlightStatus::Stale),
            "landed" => Some(FlightStatus::Landed),
            "completed" => Some(FlightStatus::Completed),
            _ => None,
        }
    }

    /// §8 "Terminal monotonicity": completed never transitions further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlightStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMethod {
    Landing,
    Timeout,
    Manual,
}

impl CompletionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionMethod::Landing => "landing",
            CompletionMethod::Timeout => "timeout",
            CompletionMethod::Manual => "manual",
        }
    }
}

/// In-memory/in-flight view of one flight's lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightState {
    pub callsign: String,
    pub logon_time: DateTime<Utc>,
    pub cid: i64,
    pub status: FlightStatus,
    pub landed_at: Option<DateTime<Utc>>,
    pub landing_airport_icao: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_method: Option<CompletionMethod>,
    pub completion_confidence: Option<f64>,
    pub last_seen_at: DateTime<Utc>,
}

impl FlightState {
    pub fn new_active(callsign: String, logon_time: DateTime<Utc>, cid: i64, seen_at: DateTime<Utc>) -> Self {
        Self {
            callsign,
            logon_time,
            cid,
            status: FlightStatus::Active,
            landed_at: None,
            landing_airport_icao: None,
            completed_at: None,
            completion_method: None,
            completion_confidence: None,
            last_seen_at: seen_at,
        }
    }

    pub fn key(&self) -> FlightKey {
        (self.callsign.clone(), self.logon_time)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::flight_states)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FlightStateRow {
    pub callsign: String,
    pub logon_time: DateTime<Utc>,
    pub cid: i64,
    pub status: String,
    pub landed_at: Option<DateTime<Utc>>,
    pub landing_airport_icao: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_method: Option<String>,
    pub completion_confidence: Option<f64>,
    pub last_seen_at: DateTime<Utc>,
}

impl From<&FlightState> for FlightStateRow {
    fn from(s: &FlightState) -> Self {
        Self {
            callsign: s.callsign.clone(),
            logon_time: s.logon_time,
            cid: s.cid,
            status: s.status.as_str().to_string(),
            landed_at: s.landed_at,
            landing_airport_icao: s.landing_airport_icao.clone(),
            completed_at: s.completed_at,
            completion_method: s.completion_method.map(|m| m.as_str().to_string()),
            completion_confidence: s.completion_confidence,
            last_seen_at: s.last_seen_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_flight_starts_active() {
        let now = Utc::now();
        let s = FlightState::new_active("QFA1".into(), now, 1, now);
        assert_eq!(s.status, FlightStatus::Active);
        assert!(s.completed_at.is_none());
    }

    #[test]
    fn completed_is_terminal() {
        assert!(FlightStatus::Completed.is_terminal());
        assert!(!FlightStatus::Active.is_terminal());
        assert!(!FlightStatus::Landed.is_terminal());
        assert!(!FlightStatus::Stale.is_terminal());
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            FlightStatus::Active,
            FlightStatus::Stale,
            FlightStatus::Landed,
            FlightStatus::Completed,
        ] {
            assert_eq!(FlightStatus::from_str(s.as_str()), Some(s));
        }
    }
}
