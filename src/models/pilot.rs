//! Pilot observation (§3 "Pilot observation") and its two persisted shapes:
//! the per-callsign upserted current state (`pilots`) and the append-only
//! position history row (`flights`).

use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// A single, coerced pilot position report. Identity is `(callsign,
/// logon_time)` — a pilot is a new flight whenever `logon_time` changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PilotObs {
    pub callsign: String,
    pub cid: i64,
    pub logon_time: DateTime<Utc>,
    pub aircraft_type: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    pub groundspeed_kt: f64,
    pub heading_deg: f64,
    pub transponder: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub route: Option<String>,
    pub cruise_tas: Option<String>,
    pub planned_altitude: Option<String>,
    pub deptime: Option<String>,
    pub remarks: Option<String>,
    pub flight_rules: Option<String>,
    pub observation_time: DateTime<Utc>,
}

impl PilotObs {
    /// The flight identity this observation belongs to.
    pub fn flight_key(&self) -> (String, DateTime<Utc>) {
        (self.callsign.clone(), self.logon_time)
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::pilots)]
pub struct NewPilotRow {
    pub callsign: String,
    pub cid: i64,
    pub logon_time: DateTime<Utc>,
    pub aircraft_type: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    pub groundspeed_kt: f64,
    pub heading_deg: f64,
    pub transponder: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub route: Option<String>,
    pub cruise_tas: Option<String>,
    pub planned_altitude: Option<String>,
    pub deptime: Option<String>,
    pub remarks: Option<String>,
    pub flight_rules: Option<String>,
    pub observation_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PilotObs> for NewPilotRow {
    fn from(p: &PilotObs) -> Self {
        Self {
            callsign: p.callsign.clone(),
            cid: p.cid,
            logon_time: p.logon_time,
            aircraft_type: p.aircraft_type.clone(),
            lat: p.lat,
            lon: p.lon,
            altitude_ft: p.altitude_ft,
            groundspeed_kt: p.groundspeed_kt,
            heading_deg: p.heading_deg,
            transponder: p.transponder.clone(),
            departure: p.departure.clone(),
            arrival: p.arrival.clone(),
            route: p.route.clone(),
            cruise_tas: p.cruise_tas.clone(),
            planned_altitude: p.planned_altitude.clone(),
            deptime: p.deptime.clone(),
            remarks: p.remarks.clone(),
            flight_rules: p.flight_rules.clone(),
            observation_time: p.observation_time,
            updated_at: Utc::now(),
        }
    }
}

/// Append-only row for the `flights` position-history table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::flights)]
pub struct NewFlightPositionRow {
    pub callsign: String,
    pub logon_time: DateTime<Utc>,
    pub cid: i64,
    pub aircraft_type: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    pub groundspeed_kt: f64,
    pub heading_deg: f64,
    pub transponder: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub route: Option<String>,
    pub cruise_tas: Option<String>,
    pub planned_altitude: Option<String>,
    pub flight_rules: Option<String>,
    pub observation_time: DateTime<Utc>,
}

impl From<&PilotObs> for NewFlightPositionRow {
    fn from(p: &PilotObs) -> Self {
        Self {
            callsign: p.callsign.clone(),
            logon_time: p.logon_time,
            cid: p.cid,
            aircraft_type: p.aircraft_type.clone(),
            lat: p.lat,
            lon: p.lon,
            altitude_ft: p.altitude_ft,
            groundspeed_kt: p.groundspeed_kt,
            heading_deg: p.heading_deg,
            transponder: p.transponder.clone(),
            departure: p.departure.clone(),
            arrival: p.arrival.clone(),
            route: p.route.clone(),
            cruise_tas: p.cruise_tas.clone(),
            planned_altitude: p.planned_altitude.clone(),
            flight_rules: p.flight_rules.clone(),
            observation_time: p.observation_time,
        }
    }
}

/// The current-state row as read back from `pilots`, used to warm-start the
/// in-memory buffer (C4) on process restart so a restart doesn't treat every
/// in-flight aircraft as newly logged on.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::pilots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PilotRecord {
    pub id: uuid::Uuid,
    pub callsign: String,
    pub cid: i64,
    pub logon_time: DateTime<Utc>,
    pub aircraft_type: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    pub groundspeed_kt: f64,
    pub heading_deg: f64,
    pub transponder: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub route: Option<String>,
    pub cruise_tas: Option<String>,
    pub planned_altitude: Option<String>,
    pub deptime: Option<String>,
    pub remarks: Option<String>,
    pub flight_rules: Option<String>,
    pub observation_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PilotRecord> for PilotObs {
    fn from(r: PilotRecord) -> Self {
        Self {
            callsign: r.callsign,
            cid: r.cid,
            logon_time: r.logon_time,
            aircraft_type: r.aircraft_type,
            lat: r.lat,
            lon: r.lon,
            altitude_ft: r.altitude_ft,
            groundspeed_kt: r.groundspeed_kt,
            heading_deg: r.heading_deg,
            transponder: r.transponder,
            departure: r.departure,
            arrival: r.arrival,
            route: r.route,
            cruise_tas: r.cruise_tas,
            planned_altitude: r.planned_altitude,
            deptime: r.deptime,
            remarks: r.remarks,
            flight_rules: r.flight_rules,
            observation_time: r.observation_time,
        }
    }
}

/// A position sample as read back from `flights`, used by the Summarizer.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::flights)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FlightPositionRow {
    pub id: i64,
    pub callsign: String,
    pub logon_time: DateTime<Utc>,
    pub cid: i64,
    pub aircraft_type: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    pub groundspeed_kt: f64,
    pub heading_deg: f64,
    pub transponder: Option<String>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub route: Option<String>,
    pub cruise_tas: Option<String>,
    pub planned_altitude: Option<String>,
    pub flight_rules: Option<String>,
    pub observation_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PilotObs {
        PilotObs {
            callsign: "QFA123".into(),
            cid: 100001,
            logon_time: "2025-01-01T00:00:00Z".parse().unwrap(),
            aircraft_type: Some("B738".into()),
            lat: -33.95,
            lon: 151.18,
            altitude_ft: 1500.0,
            groundspeed_kt: 120.0,
            heading_deg: 270.0,
            transponder: Some("2000".into()),
            departure: Some("YSSY".into()),
            arrival: Some("YMML".into()),
            route: Some("DCT".into()),
            cruise_tas: Some("N450".into()),
            planned_altitude: Some("F350".into()),
            deptime: Some("0000".into()),
            remarks: None,
            flight_rules: Some("I".into()),
            observation_time: "2025-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn flight_key_pairs_callsign_and_logon_time() {
        let p = sample();
        assert_eq!(p.flight_key(), ("QFA123".to_string(), p.logon_time));
    }

    #[test]
    fn new_pilot_row_copies_fields_from_obs() {
        let p = sample();
        let row = NewPilotRow::from(&p);
        assert_eq!(row.callsign, p.callsign);
        assert_eq!(row.lat, p.lat);
        assert_eq!(row.departure, p.departure);
    }
}
