//! Landing Detector (C7): classifies an active pilot as landed using
//! position/speed/altitude against the nearest airport (§4.7).
//!
//! Synchronous and stateless apart from the per-pilot recent-landing table
//! used for the 5-minute dedup window.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use tracing::info;

use crate::airports::AirportStore;
use crate::config::Config;
use crate::error::CoreError;
use crate::models::{FlightState, PilotObs};
use crate::repo::FlightStatesRepository;

const DEDUP_WINDOW: Duration = Duration::minutes(5);

/// Recent landing events keyed by `(callsign, airport_icao)`, guarding
/// against re-emitting the same landing every cycle while a pilot idles on
/// the runway (§4.7 step 5). Process-local; acceptable to lose on restart
/// since a spurious duplicate only shortens the dedup window, never drops a
/// real landing.
static RECENT_LANDINGS: Lazy<Mutex<HashMap<(String, String), DateTime<Utc>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub struct LandingEvent {
    pub callsign: String,
    pub logon_time: DateTime<Utc>,
    pub airport_icao: String,
    pub detected_at: DateTime<Utc>,
    pub confidence: f64,
}

/// Evaluates every currently-active pilot observation and upserts a
/// `landed` flight state for each newly detected landing.
pub async fn run(
    config: &Config,
    airports: &AirportStore,
    flight_states: &FlightStatesRepository,
    pilots: &[PilotObs],
) -> Result<usize, CoreError> {
    let mut detected = 0usize;
    for pilot in pilots {
        if let Some(event) = detect(config, airports, pilot) {
            detected += 1;
            info!(
                callsign = %event.callsign,
                airport = %event.airport_icao,
                "landing detected"
            );
            let mut state = flight_states
                .find(event.callsign.clone(), event.logon_time)
                .await?
                .unwrap_or_else(|| {
                    FlightState::new_active(event.callsign.clone(), event.logon_time, pilot.cid, event.detected_at)
                });
            if state.status.is_terminal() {
                continue;
            }
            state.status = crate::models::FlightStatus::Landed;
            state.landed_at = Some(event.detected_at);
            state.landing_airport_icao = Some(event.airport_icao.clone());
            state.last_seen_at = event.detected_at;
            flight_states.upsert(state).await?;
        }
    }
    Ok(detected)
}

fn detect(config: &Config, airports: &AirportStore, pilot: &PilotObs) -> Option<LandingEvent> {
    let (airport, _distance) = airports.nearest_within(pilot.lat, pilot.lon, config.landing_radius_nm)?;

    let alt_above_airport = pilot.altitude_ft - airport.elevation_ft;
    if alt_above_airport > config.landing_alt_ft || pilot.groundspeed_kt > config.landing_speed_kt {
        return None;
    }

    let key = (pilot.callsign.clone(), airport.icao.clone());
    let now = pilot.observation_time;
    let mut recent = RECENT_LANDINGS.lock().unwrap();
    if let Some(last) = recent.get(&key) {
        if now - *last < DEDUP_WINDOW {
            return None;
        }
    }
    recent.insert(key, now);

    Some(LandingEvent {
        callsign: pilot.callsign.clone(),
        logon_time: pilot.logon_time,
        airport_icao: airport.icao.clone(),
        detected_at: now,
        confidence: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Airport;

    fn config() -> Config {
        Config {
            poll_interval: std::time::Duration::from_secs(60),
            write_interval: std::time::Duration::from_secs(30),
            boundary_enabled: false,
            boundary_path: None,
            landing_radius_nm: 15.0,
            landing_alt_ft: 1000.0,
            landing_speed_kt: 20.0,
            t_stale: std::time::Duration::from_secs(300),
            t_complete: std::time::Duration::from_secs(3600),
            match_max_dist_nm: 100.0,
            match_time_tol: std::time::Duration::from_secs(180),
            match_min_duration: std::time::Duration::from_secs(30),
            freq_tol_hz: 100,
            retention: std::time::Duration::from_secs(24 * 3600),
            db_pool_size: 20,
            db_max_overflow: 40,
            feed_base_url: "https://example.test".into(),
            database_url: "postgres://localhost/test".into(),
            airports_path: "data/airports.json".into(),
            metrics_bind_addr: "0.0.0.0:9090".into(),
        }
    }

    fn airports() -> AirportStore {
        AirportStore::from_airports(vec![Airport {
            icao: "YSSY".into(),
            lat: -33.9461,
            lon: 151.1772,
            elevation_ft: 21.0,
        }])
    }

    fn pilot(lat: f64, lon: f64, altitude_ft: f64, groundspeed_kt: f64) -> PilotObs {
        PilotObs {
            callsign: format!("TEST{}", (altitude_ft as i64)),
            cid: 1,
            logon_time: "2025-01-01T00:00:00Z".parse().unwrap(),
            aircraft_type: None,
            lat,
            lon,
            altitude_ft,
            groundspeed_kt,
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
    fn detects_landing_within_thresholds() {
        let p = pilot(-33.946, 151.177, 40.0, 5.0);
        let event = detect(&config(), &airports(), &p);
        assert!(event.is_some());
        assert_eq!(event.unwrap().airport_icao, "YSSY");
    }

    #[test]
    fn does_not_detect_when_too_fast() {
        let p = pilot(-33.946, 151.177, 40.0, 80.0);
        assert!(detect(&config(), &airports(), &p).is_none());
    }

    #[test]
    fn does_not_detect_when_too_high() {
        let p = pilot(-33.946, 151.177, 5000.0, 5.0);
        assert!(detect(&config(), &airports(), &p).is_none());
    }

    #[test]
    fn does_not_detect_outside_radius() {
        let p = pilot(0.0, 0.0, 40.0, 5.0);
        assert!(detect(&config(), &airports(), &p).is_none());
    }
}
