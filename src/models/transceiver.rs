//! Transceiver observation (§3) — the sole authoritative source of
//! geo-located frequency information for the ATC<->flight matcher.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Pilot,
    Atc,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Pilot => "pilot",
            EntityType::Atc => "atc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pilot" => Some(EntityType::Pilot),
            "atc" => Some(EntityType::Atc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransceiverObs {
    pub entity_type: EntityType,
    pub callsign: String,
    pub transceiver_index: i32,
    pub frequency_hz: i64,
    pub lat: f64,
    pub lon: f64,
    pub height_msl_m: Option<f64>,
    pub height_agl_m: Option<f64>,
    pub observation_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::transceivers)]
pub struct NewTransceiverRow {
    pub entity_type: String,
    pub callsign: String,
    pub transceiver_index: i32,
    pub frequency_hz: i64,
    pub lat: f64,
    pub lon: f64,
    pub height_msl_m: Option<f64>,
    pub height_agl_m: Option<f64>,
    pub observation_time: DateTime<Utc>,
}

impl From<&TransceiverObs> for NewTransceiverRow {
    fn from(t: &TransceiverObs) -> Self {
        Self {
            entity_type: t.entity_type.as_str().to_string(),
            callsign: t.callsign.clone(),
            transceiver_index: t.transceiver_index,
            frequency_hz: t.frequency_hz,
            lat: t.lat,
            lon: t.lon,
            height_msl_m: t.height_msl_m,
            height_agl_m: t.height_agl_m,
            observation_time: t.observation_time,
        }
    }
}

/// A transceiver row read back for matching (§4.9).
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::transceivers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransceiverRow {
    pub id: i64,
    pub entity_type: String,
    pub callsign: String,
    pub transceiver_index: i32,
    pub frequency_hz: i64,
    pub lat: f64,
    pub lon: f64,
    pub height_msl_m: Option<f64>,
    pub height_agl_m: Option<f64>,
    pub observation_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
