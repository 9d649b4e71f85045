//! Feed client (C1): fetches the network snapshot and the transceiver
//! document, coercing loosely-typed upstream fields and dropping individual
//! malformed records rather than failing the whole batch (§4.1).

use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::error::CoreError;
use crate::feed::types::{
    RawController, RawFlightPlan, RawPilot, RawSnapshotDocument, RawTransceiverDocument,
};
use crate::models::{ControllerObs, EntityType, PilotObs, TransceiverObs};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Snapshot {
    pub pilots: Vec<PilotObs>,
    pub controllers: Vec<ControllerObs>,
    pub update_timestamp: DateTime<Utc>,
}

pub struct FeedClient {
    client: Client,
    snapshot_url: String,
    transceivers_url: String,
}

impl FeedClient {
    pub fn new(snapshot_url: String, transceivers_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("reqwest client builds with static config"),
            snapshot_url,
            transceivers_url,
        }
    }

    /// Fetch and coerce the pilot/controller snapshot. A transport failure,
    /// timeout, or non-2xx response is [`CoreError::FeedUnavailable`]; a
    /// response that isn't valid JSON or is missing `general` is
    /// [`CoreError::FeedCorrupt`] (§4.1, §7). Individual records that fail
    /// coercion are dropped and logged at `warn`, not treated as fatal.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, CoreError> {
        let body = self
            .client
            .get(&self.snapshot_url)
            .send()
            .await
            .context("sending snapshot request")
            .map_err(CoreError::FeedUnavailable)?
            .error_for_status()
            .context("snapshot response status")
            .map_err(CoreError::FeedUnavailable)?
            .text()
            .await
            .context("reading snapshot body")
            .map_err(CoreError::FeedUnavailable)?;

        let doc: RawSnapshotDocument = serde_json::from_str(&body)
            .context("snapshot document")
            .map_err(CoreError::FeedCorrupt)?;

        let update_timestamp = doc
            .general
            .update_timestamp
            .parse::<DateTime<Utc>>()
            .context("general.update_timestamp")
            .map_err(CoreError::FeedCorrupt)?;

        let pilots = doc
            .pilots
            .into_iter()
            .filter_map(|p| match coerce_pilot(p, update_timestamp) {
                Ok(p) => Some(p),
                Err(reason) => {
                    warn!(reason, "dropping pilot record that failed coercion");
                    None
                }
            })
            .collect();

        let controllers = doc
            .controllers
            .into_iter()
            .filter_map(|c| match coerce_controller(c, update_timestamp) {
                Ok(c) => Some(c),
                Err(reason) => {
                    warn!(reason, "dropping controller record that failed coercion");
                    None
                }
            })
            .collect();

        Ok(Snapshot {
            pilots,
            controllers,
            update_timestamp,
        })
    }

    /// Fetch the flattened transceiver list for all callsigns (§6). Entity
    /// type (pilot vs. ATC) is not known at this layer — the matcher (C9)
    /// classifies each callsign against the current facility map — so every
    /// entry is provisionally tagged [`EntityType::Pilot`] and corrected
    /// downstream.
    pub async fn fetch_transceivers(&self) -> Result<Vec<TransceiverObs>, CoreError> {
        let body = self
            .client
            .get(&self.transceivers_url)
            .send()
            .await
            .context("sending transceivers request")
            .map_err(CoreError::FeedUnavailable)?
            .error_for_status()
            .context("transceivers response status")
            .map_err(CoreError::FeedUnavailable)?
            .text()
            .await
            .context("reading transceivers body")
            .map_err(CoreError::FeedUnavailable)?;

        let doc: RawTransceiverDocument = serde_json::from_str(&body)
            .context("transceivers document")
            .map_err(CoreError::FeedCorrupt)?;

        let now = Utc::now();
        let mut out = Vec::new();
        for (callsign, entries) in doc {
            for entry in entries {
                match coerce_transceiver(callsign.clone(), entry, now) {
                    Ok(t) => out.push(t),
                    Err(reason) => {
                        warn!(callsign = %callsign, reason, "dropping transceiver entry that failed coercion");
                    }
                }
            }
        }
        Ok(out)
    }
}

fn value_to_f64(v: &Value, field: &str) -> Result<f64, String> {
    match v {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{field}: not a finite number")),
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| format!("{field}: {e}")),
        _ => Err(format!("{field}: expected number or numeric string")),
    }
}

fn value_to_i64(v: &Value, field: &str) -> Result<i64, String> {
    match v {
        Value::Number(n) => n.as_i64().ok_or_else(|| format!("{field}: not an integer")),
        Value::String(s) => s.trim().parse::<i64>().map_err(|e| format!("{field}: {e}")),
        _ => Err(format!("{field}: expected integer or numeric string")),
    }
}

fn coerce_pilot(p: RawPilot, observation_time: DateTime<Utc>) -> Result<PilotObs, String> {
    let cid = value_to_i64(&p.cid, "cid")?;
    let logon_time = p
        .logon_time
        .parse::<DateTime<Utc>>()
        .map_err(|e| format!("logon_time: {e}"))?;
    let lat = value_to_f64(&p.latitude, "latitude")?;
    let lon = value_to_f64(&p.longitude, "longitude")?;
    let altitude_ft = value_to_f64(&p.altitude, "altitude")?;
    let groundspeed_kt = value_to_f64(&p.groundspeed, "groundspeed")?;
    let heading_deg = value_to_f64(&p.heading, "heading")?;

    let flight_plan = p.flight_plan.unwrap_or(RawFlightPlan {
        flight_rules: None,
        aircraft_short: None,
        departure: None,
        arrival: None,
        route: None,
        cruise_tas: None,
        altitude: None,
        deptime: None,
        remarks: None,
    });

    Ok(PilotObs {
        callsign: p.callsign,
        cid,
        logon_time,
        aircraft_type: flight_plan.aircraft_short,
        lat,
        lon,
        altitude_ft,
        groundspeed_kt,
        heading_deg,
        transponder: p.transponder,
        departure: flight_plan.departure,
        arrival: flight_plan.arrival,
        route: flight_plan.route,
        cruise_tas: flight_plan.cruise_tas,
        planned_altitude: flight_plan.altitude,
        deptime: flight_plan.deptime,
        remarks: flight_plan.remarks,
        flight_rules: flight_plan.flight_rules,
        observation_time,
    })
}

fn coerce_controller(c: RawController, observation_time: DateTime<Utc>) -> Result<ControllerObs, String> {
    let cid = value_to_i64(&c.cid, "cid")?;
    let facility = value_to_i64(&c.facility, "facility")? as i32;
    let rating = value_to_i64(&c.rating, "rating")? as i32;
    let frequency_hz = {
        let mhz = value_to_f64(&c.frequency, "frequency")?;
        (mhz * 1_000_000.0).round() as i64
    };
    let visual_range_nm = match &c.visual_range {
        Value::Null => 0,
        v => value_to_i64(v, "visual_range")? as i32,
    };
    let logon_time = c
        .logon_time
        .parse::<DateTime<Utc>>()
        .map_err(|e| format!("logon_time: {e}"))?;
    let atis = c.text_atis.map(|lines| lines.join("\n"));

    Ok(ControllerObs {
        callsign: c.callsign,
        cid,
        name: c.name,
        facility,
        rating,
        frequency_hz,
        visual_range_nm,
        atis,
        logon_time,
        observation_time,
    })
}

fn coerce_transceiver(
    callsign: String,
    entry: crate::feed::types::RawTransceiverEntry,
    observation_time: DateTime<Utc>,
) -> Result<TransceiverObs, String> {
    let transceiver_index = value_to_i64(&entry.id, "id")? as i32;
    let frequency_hz = value_to_i64(&entry.frequency, "frequency")?;
    let lat = value_to_f64(&entry.lat_deg, "latDeg")?;
    let lon = value_to_f64(&entry.lon_deg, "lonDeg")?;
    let height_msl_m = entry
        .height_msl_m
        .as_ref()
        .map(|v| value_to_f64(v, "heightMslM"))
        .transpose()?;
    let height_agl_m = entry
        .height_agl_m
        .as_ref()
        .map(|v| value_to_f64(v, "heightAglM"))
        .transpose()?;

    Ok(TransceiverObs {
        entity_type: EntityType::Pilot,
        callsign,
        transceiver_index,
        frequency_hz,
        lat,
        lon,
        height_msl_m,
        height_agl_m,
        observation_time,
    })
}

/// Surfaces a bare `anyhow::Error` wrapping coercion failure, for callers
/// that need the richer error rather than the dropped-record path (e.g. a
/// `validate-schema`-style dry run over a captured fixture).
#[allow(dead_code)]
pub fn coerce_pilot_strict(p: RawPilot, observation_time: DateTime<Utc>) -> anyhow::Result<PilotObs> {
    coerce_pilot(p, observation_time).map_err(|reason| anyhow!(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_to_f64_accepts_string_and_number() {
        assert_eq!(value_to_f64(&json!(12.5), "x").unwrap(), 12.5);
        assert_eq!(value_to_f64(&json!("12.5"), "x").unwrap(), 12.5);
        assert!(value_to_f64(&json!("not a number"), "x").is_err());
    }

    #[test]
    fn value_to_i64_accepts_string_and_number() {
        assert_eq!(value_to_i64(&json!(42), "x").unwrap(), 42);
        assert_eq!(value_to_i64(&json!("42"), "x").unwrap(), 42);
        assert!(value_to_i64(&json!("nope"), "x").is_err());
    }

    #[test]
    fn coerce_pilot_rejects_bad_logon_time() {
        let p = RawPilot {
            callsign: "QFA1".into(),
            cid: json!(1),
            logon_time: "not-a-timestamp".into(),
            last_updated: None,
            flight_plan: None,
            latitude: json!(0.0),
            longitude: json!(0.0),
            altitude: json!(0.0),
            groundspeed: json!(0.0),
            heading: json!(0.0),
            transponder: None,
        };
        assert!(coerce_pilot(p, Utc::now()).is_err());
    }

    #[test]
    fn coerce_controller_accepts_string_facility_and_rating() {
        let c = RawController {
            callsign: "SY_APP".into(),
            cid: json!("900001"),
            name: Some("J. Smith".into()),
            facility: json!("3"),
            rating: json!("5"),
            frequency: json!("124.500"),
            visual_range: json!(100),
            text_atis: None,
            logon_time: "2025-01-01T00:00:00Z".into(),
            last_updated: None,
        };
        let obs = coerce_controller(c, Utc::now()).unwrap();
        assert_eq!(obs.facility, 3);
        assert_eq!(obs.rating, 5);
        assert_eq!(obs.frequency_hz, 124_500_000);
    }
}
