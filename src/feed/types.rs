//! Wire types for the upstream feed (§6 "Upstream feed (consumed)").
//!
//! Upstream numeric fields ("cid", "rating") sometimes arrive as strings.
//! These structs model the document as it actually arrives — loosely typed
//! — so coercion happens in one place ([`super::client`]) rather than being
//! spread across every downstream consumer.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RawSnapshotDocument {
    #[serde(default)]
    pub pilots: Vec<RawPilot>,
    #[serde(default)]
    pub controllers: Vec<RawController>,
    pub general: RawGeneral,
}

#[derive(Debug, Deserialize)]
pub struct RawGeneral {
    pub update_timestamp: String,
}

/// A raw pilot record. All fields that the upstream feed is known to emit
/// as either a string or a number are typed `Value` so the coercion layer
/// can accept both without failing the whole batch.
#[derive(Debug, Deserialize)]
pub struct RawPilot {
    pub callsign: String,
    pub cid: Value,
    pub logon_time: String,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub flight_plan: Option<RawFlightPlan>,
    pub latitude: Value,
    pub longitude: Value,
    pub altitude: Value,
    pub groundspeed: Value,
    pub heading: Value,
    #[serde(default)]
    pub transponder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawFlightPlan {
    #[serde(default)]
    pub flight_rules: Option<String>,
    #[serde(default)]
    pub aircraft_short: Option<String>,
    #[serde(default)]
    pub departure: Option<String>,
    #[serde(default)]
    pub arrival: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub cruise_tas: Option<String>,
    #[serde(default)]
    pub altitude: Option<String>,
    #[serde(default)]
    pub deptime: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawController {
    pub callsign: String,
    pub cid: Value,
    #[serde(default)]
    pub name: Option<String>,
    pub facility: Value,
    pub rating: Value,
    pub frequency: Value,
    #[serde(default)]
    pub visual_range: Value,
    #[serde(default)]
    pub text_atis: Option<Vec<String>>,
    pub logon_time: String,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Raw per-callsign transceiver list, as returned by the transceivers
/// endpoint: `{"<callsign>": [{...}, {...}]}`.
pub type RawTransceiverDocument = std::collections::HashMap<String, Vec<RawTransceiverEntry>>;

#[derive(Debug, Deserialize)]
pub struct RawTransceiverEntry {
    pub id: Value,
    pub frequency: Value,
    #[serde(rename = "latDeg")]
    pub lat_deg: Value,
    #[serde(rename = "lonDeg")]
    pub lon_deg: Value,
    #[serde(rename = "heightMslM")]
    pub height_msl_m: Option<Value>,
    #[serde(rename = "heightAglM")]
    pub height_agl_m: Option<Value>,
}
