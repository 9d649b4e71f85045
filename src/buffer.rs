//! In-Memory Buffer (C4): bounded per-callsign caches for the latest pilot
//! and controller observations (§4.4).
//!
//! Exclusively owned by the Ingestion Coordinator — unlike the teacher's
//! `DashMap`-based aircraft state map (built for concurrent per-aircraft
//! locking across request handlers), this buffer has a single writer and a
//! single reader in the same task, so a plain `lru::LruCache` behind no
//! lock at all is both correct and simpler.

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::models::{ControllerObs, PilotObs};

const DEFAULT_PILOT_CAPACITY: usize = 5_000;
const DEFAULT_CONTROLLER_CAPACITY: usize = 1_000;

/// Coordinator-owned buffer of the most recent observation per callsign.
/// `LruCache::put`/`get` both refresh recency, matching §4.4's "access
/// updates `last_seen`"; eviction on overflow removes the least-recently
/// touched entry.
pub struct Buffer {
    pilots: LruCache<String, PilotObs>,
    controllers: LruCache<String, ControllerObs>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PILOT_CAPACITY, DEFAULT_CONTROLLER_CAPACITY)
    }

    pub fn with_capacity(pilot_capacity: usize, controller_capacity: usize) -> Self {
        Self {
            pilots: LruCache::new(NonZeroUsize::new(pilot_capacity).unwrap()),
            controllers: LruCache::new(NonZeroUsize::new(controller_capacity).unwrap()),
        }
    }

    pub fn put_pilot(&mut self, obs: PilotObs) {
        self.pilots.put(obs.callsign.clone(), obs);
    }

    pub fn put_controller(&mut self, obs: ControllerObs) {
        self.controllers.put(obs.callsign.clone(), obs);
    }

    pub fn get_pilot(&mut self, callsign: &str) -> Option<&PilotObs> {
        self.pilots.get(callsign)
    }

    pub fn get_controller(&mut self, callsign: &str) -> Option<&ControllerObs> {
        self.controllers.get(callsign)
    }

    /// Current pilot callsigns, used by the Coordinator to diff against the
    /// previous cycle's set (§4.6 step 4c).
    pub fn pilot_callsigns(&self) -> impl Iterator<Item = &String> {
        self.pilots.iter().map(|(k, _)| k)
    }

    pub fn controller_callsigns(&self) -> impl Iterator<Item = &String> {
        self.controllers.iter().map(|(k, _)| k)
    }

    pub fn pilots(&self) -> impl Iterator<Item = &PilotObs> {
        self.pilots.iter().map(|(_, v)| v)
    }

    pub fn controllers(&self) -> impl Iterator<Item = &ControllerObs> {
        self.controllers.iter().map(|(_, v)| v)
    }

    pub fn pilot_len(&self) -> usize {
        self.pilots.len()
    }

    pub fn controller_len(&self) -> usize {
        self.controllers.len()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pilot(callsign: &str) -> PilotObs {
        PilotObs {
            callsign: callsign.to_string(),
            cid: 1,
            logon_time: Utc::now(),
            aircraft_type: None,
            lat: 0.0,
            lon: 0.0,
            altitude_ft: 0.0,
            groundspeed_kt: 0.0,
            heading_deg: 0.0,
            transponder: None,
            departure: None,
            arrival: None,
            route: None,
            cruise_tas: None,
            planned_altitude: None,
            deptime: None,
            remarks: None,
            flight_rules: None,
            observation_time: Utc::now(),
        }
    }

    #[test]
    fn evicts_oldest_when_over_capacity() {
        let mut buf = Buffer::with_capacity(2, 1);
        buf.put_pilot(pilot("A"));
        buf.put_pilot(pilot("B"));
        buf.put_pilot(pilot("C"));
        assert_eq!(buf.pilot_len(), 2);
        assert!(buf.get_pilot("A").is_none());
        assert!(buf.get_pilot("B").is_some());
        assert!(buf.get_pilot("C").is_some());
    }

    #[test]
    fn get_refreshes_recency() {
        let mut buf = Buffer::with_capacity(2, 1);
        buf.put_pilot(pilot("A"));
        buf.put_pilot(pilot("B"));
        buf.get_pilot("A");
        buf.put_pilot(pilot("C"));
        assert!(buf.get_pilot("A").is_some());
        assert!(buf.get_pilot("B").is_none());
    }
}
