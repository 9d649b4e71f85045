//! Flight summary (§3, §4.10 "flight" entry point).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One entry in a flight summary's `controller_interactions` array. Uniform
/// object shape — never a map keyed by callsign (§4.10) — so the array in a
/// flight summary and the array in a controller summary
/// ([`crate::models::AircraftInteraction`]) are symmetric and externally
/// comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerInteraction {
    pub controller_callsign: String,
    pub frequency_hz: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub duration_s: i32,
    pub communication_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSummary {
    pub callsign: String,
    pub logon_time: DateTime<Utc>,
    pub cid: i64,
    pub aircraft_type: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub route: Option<String>,
    pub flight_rules: Option<String>,
    pub first_lat: f64,
    pub first_lon: f64,
    pub first_altitude_ft: f64,
    pub first_observed_at: DateTime<Utc>,
    pub last_lat: f64,
    pub last_lon: f64,
    pub last_altitude_ft: f64,
    pub last_observed_at: DateTime<Utc>,
    pub max_altitude_ft: f64,
    pub completion_method: String,
    pub completion_confidence: f64,
    pub landing_airport_icao: Option<String>,
    pub controller_interactions: Vec<ControllerInteraction>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::flight_summaries)]
pub struct NewFlightSummaryRow {
    pub callsign: String,
    pub logon_time: DateTime<Utc>,
    pub cid: i64,
    pub aircraft_type: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub route: Option<String>,
    pub flight_rules: Option<String>,
    pub first_lat: f64,
    pub first_lon: f64,
    pub first_altitude_ft: f64,
    pub first_observed_at: DateTime<Utc>,
    pub last_lat: f64,
    pub last_lon: f64,
    pub last_altitude_ft: f64,
    pub last_observed_at: DateTime<Utc>,
    pub max_altitude_ft: f64,
    pub completion_method: String,
    pub completion_confidence: f64,
    pub landing_airport_icao: Option<String>,
    pub controller_interactions: serde_json::Value,
}

impl TryFrom<&FlightSummary> for NewFlightSummaryRow {
    type Error = serde_json::Error;

    fn try_from(s: &FlightSummary) -> Result<Self, Self::Error> {
        Ok(Self {
            callsign: s.callsign.clone(),
            logon_time: s.logon_time,
            cid: s.cid,
            aircraft_type: s.aircraft_type.clone(),
            departure: s.departure.clone(),
            arrival: s.arrival.clone(),
            route: s.route.clone(),
            flight_rules: s.flight_rules.clone(),
            first_lat: s.first_lat,
            first_lon: s.first_lon,
            first_altitude_ft: s.first_altitude_ft,
            first_observed_at: s.first_observed_at,
            last_lat: s.last_lat,
            last_lon: s.last_lon,
            last_altitude_ft: s.last_altitude_ft,
            last_observed_at: s.last_observed_at,
            max_altitude_ft: s.max_altitude_ft,
            completion_method: s.completion_method.clone(),
            completion_confidence: s.completion_confidence,
            landing_airport_icao: s.landing_airport_icao.clone(),
            controller_interactions: serde_json::to_value(&s.controller_interactions)?,
        })
    }
}
