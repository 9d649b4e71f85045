//! Controller summary (§3, §4.10 "controller" entry point).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One entry in a controller summary's `aircraft_interactions` array.
/// Symmetric with [`crate::models::ControllerInteraction`] — see §4.10's
/// bidirectional invariant and the `summary_symmetry` property in §8.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftInteraction {
    pub pilot_callsign: String,
    pub frequency_hz: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub duration_s: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSummary {
    pub callsign: String,
    pub cid: i64,
    pub facility: i32,
    pub rating: i32,
    pub online_at: DateTime<Utc>,
    pub offline_at: DateTime<Utc>,
    pub frequencies_held: Vec<i64>,
    pub aircraft_interactions: Vec<AircraftInteraction>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::controller_summaries)]
pub struct NewControllerSummaryRow {
    pub callsign: String,
    pub cid: i64,
    pub facility: i32,
    pub rating: i32,
    pub online_at: DateTime<Utc>,
    pub offline_at: DateTime<Utc>,
    pub frequencies_held: serde_json::Value,
    pub aircraft_interactions: serde_json::Value,
}

impl TryFrom<&ControllerSummary> for NewControllerSummaryRow {
    type Error = serde_json::Error;

    fn try_from(s: &ControllerSummary) -> Result<Self, Self::Error> {
        Ok(Self {
            callsign: s.callsign.clone(),
            cid: s.cid,
            facility: s.facility,
            rating: s.rating,
            online_at: s.online_at,
            offline_at: s.offline_at,
            frequencies_held: serde_json::to_value(&s.frequencies_held)?,
            aircraft_interactions: serde_json::to_value(&s.aircraft_interactions)?,
        })
    }
}
