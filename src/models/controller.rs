//! Controller observation (§3 "Controller observation").

use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStatus {
    Online,
    Offline,
}

impl ControllerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerStatus::Online => "online",
            ControllerStatus::Offline => "offline",
        }
    }
}

/// A single controller sighting, prior to persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerObs {
    pub callsign: String,
    pub cid: i64,
    pub name: Option<String>,
    pub facility: i32,
    pub rating: i32,
    pub frequency_hz: i64,
    pub visual_range_nm: i32,
    pub atis: Option<String>,
    pub logon_time: DateTime<Utc>,
    pub observation_time: DateTime<Utc>,
}

impl ControllerObs {
    /// Read-only/observer facilities must not participate in interaction
    /// detection (§3: "facility == 0 or callsign suffix `_OBS`").
    pub fn is_observer(&self) -> bool {
        self.facility == 0 || self.callsign.ends_with("_OBS")
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::controllers)]
pub struct ControllerRow {
    pub callsign: String,
    pub cid: i64,
    pub name: Option<String>,
    pub facility: i32,
    pub rating: i32,
    pub frequency_hz: i64,
    pub visual_range_nm: i32,
    pub atis: Option<String>,
    pub status: String,
    pub online_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub offline_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ControllerObs> for ControllerRow {
    fn from(c: &ControllerObs) -> Self {
        Self {
            callsign: c.callsign.clone(),
            cid: c.cid,
            name: c.name.clone(),
            facility: c.facility,
            rating: c.rating,
            frequency_hz: c.frequency_hz,
            visual_range_nm: c.visual_range_nm,
            atis: c.atis.clone(),
            status: ControllerStatus::Online.as_str().to_string(),
            online_at: c.logon_time,
            last_seen: c.observation_time,
            offline_at: None,
            updated_at: Utc::now(),
        }
    }
}

/// A controller row as read back from the store, used by the facility map
/// (§4.9 step 1) and the Summarizer's controller entry point.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::controllers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ControllerRecord {
    pub id: uuid::Uuid,
    pub callsign: String,
    pub cid: i64,
    pub name: Option<String>,
    pub facility: i32,
    pub rating: i32,
    pub frequency_hz: i64,
    pub visual_range_nm: i32,
    pub atis: Option<String>,
    pub status: String,
    pub online_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub offline_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(facility: i32, callsign: &str) -> ControllerObs {
        ControllerObs {
            callsign: callsign.to_string(),
            cid: 900001,
            name: Some("J. Smith".into()),
            facility,
            rating: 5,
            frequency_hz: 124_500_000,
            visual_range_nm: 100,
            atis: None,
            logon_time: Utc::now(),
            observation_time: Utc::now(),
        }
    }

    #[test]
    fn facility_zero_is_observer() {
        assert!(sample(0, "SY_APP").is_observer());
    }

    #[test]
    fn obs_suffix_is_observer_regardless_of_facility() {
        assert!(sample(3, "SY_TWR_OBS").is_observer());
    }

    #[test]
    fn normal_facility_is_not_observer() {
        assert!(!sample(3, "SY_APP").is_observer());
    }
}
