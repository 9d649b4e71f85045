//! Frequency match records (§3, §4.9) — the building block both summary
//! arrays are derived from.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyMatch {
    pub pilot_callsign: String,
    pub controller_callsign: String,
    pub frequency_hz: i64,
    pub pilot_pos: Option<(f64, f64)>,
    pub controller_pos: Option<(f64, f64)>,
    pub distance_nm: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub duration_s: i32,
    pub confidence: f64,
    pub communication_type: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::frequency_matches)]
pub struct NewFrequencyMatchRow {
    pub pilot_callsign: String,
    pub controller_callsign: String,
    pub frequency_hz: i64,
    pub pilot_lat: Option<f64>,
    pub pilot_lon: Option<f64>,
    pub controller_lat: Option<f64>,
    pub controller_lon: Option<f64>,
    pub distance_nm: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub duration_s: i32,
    pub confidence: f64,
    pub communication_type: String,
}

impl From<&FrequencyMatch> for NewFrequencyMatchRow {
    fn from(m: &FrequencyMatch) -> Self {
        Self {
            pilot_callsign: m.pilot_callsign.clone(),
            controller_callsign: m.controller_callsign.clone(),
            frequency_hz: m.frequency_hz,
            pilot_lat: m.pilot_pos.map(|(lat, _)| lat),
            pilot_lon: m.pilot_pos.map(|(_, lon)| lon),
            controller_lat: m.controller_pos.map(|(lat, _)| lat),
            controller_lon: m.controller_pos.map(|(_, lon)| lon),
            distance_nm: m.distance_nm,
            first_seen: m.first_seen,
            last_seen: m.last_seen,
            duration_s: m.duration_s,
            confidence: m.confidence,
            communication_type: m.communication_type.clone(),
        }
    }
}

/// A match row read back to build summary interaction arrays (§4.10).
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::frequency_matches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FrequencyMatchRow {
    pub id: i64,
    pub pilot_callsign: String,
    pub controller_callsign: String,
    pub frequency_hz: i64,
    pub pilot_lat: Option<f64>,
    pub pilot_lon: Option<f64>,
    pub controller_lat: Option<f64>,
    pub controller_lon: Option<f64>,
    pub distance_nm: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub duration_s: i32,
    pub confidence: f64,
    pub communication_type: String,
    pub created_at: DateTime<Utc>,
}
