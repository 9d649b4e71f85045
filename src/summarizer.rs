//! Summarizer (C10): the two terminal entry points that turn detector
//! output into durable summary records (§4.10). Both consume the same
//! `frequency_matches` table through symmetric predicates, which is what
//! gives the bidirectional invariant between flight and controller
//! summaries (§3, §8 "summary_symmetry").

use tracing::warn;

use crate::error::CoreError;
use crate::models::{AircraftInteraction, ControllerInteraction, ControllerSummary, FlightState, FlightSummary};
use crate::repo::{ControllersRepository, MatchesRepository, PilotsRepository, SummariesRepository};

#[derive(Clone)]
pub struct Summarizer {
    pilots_repo: PilotsRepository,
    matches_repo: MatchesRepository,
    summaries_repo: SummariesRepository,
}

impl Summarizer {
    pub fn new(
        pilots_repo: PilotsRepository,
        matches_repo: MatchesRepository,
        summaries_repo: SummariesRepository,
    ) -> Self {
        Self {
            pilots_repo,
            matches_repo,
            summaries_repo,
        }
    }

    /// `flight(callsign, logon_time)` (§4.10): builds and persists a flight
    /// summary for a flight that has just reached a terminal state.
    pub async fn flight(&self, state: &FlightState) -> Result<(), CoreError> {
        let rows = self
            .pilots_repo
            .position_history(state.callsign.clone(), state.logon_time)
            .await?;

        let Some(first) = rows.first() else {
            warn!(callsign = %state.callsign, "flight completed with no persisted position history, skipping summary");
            return Ok(());
        };
        let last = rows.last().expect("non-empty checked above");

        let max_altitude_ft = rows
            .iter()
            .map(|r| r.altitude_ft)
            .fold(f64::MIN, f64::max);

        let match_rows = self
            .matches_repo
            .for_pilot_in_span(state.callsign.clone(), first.observation_time, last.observation_time)
            .await?;

        let controller_interactions: Vec<ControllerInteraction> = match_rows
            .into_iter()
            .map(|m| ControllerInteraction {
                controller_callsign: m.controller_callsign,
                frequency_hz: m.frequency_hz,
                first_seen: m.first_seen,
                last_seen: m.last_seen,
                duration_s: m.duration_s,
                communication_type: m.communication_type,
            })
            .collect();

        let summary = FlightSummary {
            callsign: state.callsign.clone(),
            logon_time: state.logon_time,
            cid: state.cid,
            aircraft_type: last.aircraft_type.clone(),
            departure: last.departure.clone(),
            arrival: last.arrival.clone(),
            route: last.route.clone(),
            flight_rules: last.flight_rules.clone(),
            first_lat: first.lat,
            first_lon: first.lon,
            first_altitude_ft: first.altitude_ft,
            first_observed_at: first.observation_time,
            last_lat: last.lat,
            last_lon: last.lon,
            last_altitude_ft: last.altitude_ft,
            last_observed_at: last.observation_time,
            max_altitude_ft,
            completion_method: state.completion_method.map(|m| m.as_str()).unwrap_or("timeout").to_string(),
            completion_confidence: state.completion_confidence.unwrap_or(0.0),
            landing_airport_icao: state.landing_airport_icao.clone(),
            controller_interactions,
        };

        self.summaries_repo.insert_flight_summary(&summary).await
    }

    /// `controller(callsign)` (§4.10): builds and persists a controller
    /// summary for a session that has just gone offline.
    pub async fn controller(
        &self,
        controllers_repo: &ControllersRepository,
        callsign: &str,
    ) -> Result<(), CoreError> {
        let Some(record) = controllers_repo.find_by_callsign(callsign.to_string()).await? else {
            warn!(callsign, "controller went offline but has no store record, skipping summary");
            return Ok(());
        };

        let online_at = record.online_at;
        let offline_at = record.offline_at.unwrap_or(record.last_seen);

        let match_rows = self
            .matches_repo
            .for_controller_in_span(callsign.to_string(), online_at, offline_at)
            .await?;

        let frequencies_held: Vec<i64> = {
            let mut freqs: Vec<i64> = match_rows.iter().map(|m| m.frequency_hz).collect();
            freqs.push(record.frequency_hz);
            freqs.sort_unstable();
            freqs.dedup();
            freqs
        };

        let aircraft_interactions: Vec<AircraftInteraction> = match_rows
            .into_iter()
            .map(|m| AircraftInteraction {
                pilot_callsign: m.pilot_callsign,
                frequency_hz: m.frequency_hz,
                first_seen: m.first_seen,
                last_seen: m.last_seen,
                duration_s: m.duration_s,
            })
            .collect();

        let summary = ControllerSummary {
            callsign: record.callsign,
            cid: record.cid,
            facility: record.facility,
            rating: record.rating,
            online_at,
            offline_at,
            frequencies_held,
            aircraft_interactions,
        };

        self.summaries_repo.insert_controller_summary(&summary).await
    }
}
