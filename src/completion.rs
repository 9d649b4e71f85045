//! Flight Completion (C8): the `active -> landed -> completed` /
//! `active -> stale -> completed(timeout)` state machine (§4.8).

use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, info};

use crate::config::Config;
use crate::error::CoreError;
use crate::models::{CompletionMethod, FlightKey, FlightState, FlightStatus, PilotObs};
use crate::repo::FlightStatesRepository;
use crate::summarizer::Summarizer;

/// Sweeps every non-terminal flight state, advancing it per the absence
/// timers in §4.8, and triggers `Summarizer.flight()` on every transition
/// into `completed`.
pub async fn run(
    config: &Config,
    flight_states: &FlightStatesRepository,
    summarizer: &Summarizer,
    current_pilots: &[PilotObs],
) -> Result<usize, CoreError> {
    let mut completed_count = 0usize;
    let present: HashMap<FlightKey, &PilotObs> =
        current_pilots.iter().map(|p| (p.flight_key(), p)).collect();

    let states = flight_states.active_and_stale().await?;
    let now = Utc::now();
    let t_stale = chrono::Duration::from_std(config.t_stale).unwrap_or(chrono::Duration::minutes(5));
    let t_complete = chrono::Duration::from_std(config.t_complete).unwrap_or(chrono::Duration::hours(1));

    for mut state in states {
        let key = state.key();
        if let Some(pilot) = present.get(&key) {
            // Still present: not absent, so a stale flight returns to
            // active; an already-landed flight just refreshes last_seen.
            state.last_seen_at = pilot.observation_time;
            if state.status == FlightStatus::Stale {
                state.status = FlightStatus::Active;
            }
            flight_states.upsert(state).await?;
            continue;
        }

        let absence = now - state.last_seen_at;

        let transitioned_to_completed = match state.status {
            FlightStatus::Landed => absence >= t_stale,
            FlightStatus::Active if absence >= t_stale => {
                state.status = FlightStatus::Stale;
                false
            }
            FlightStatus::Stale => absence >= t_complete,
            _ => false,
        };

        if transitioned_to_completed {
            let method = if state.landed_at.is_some() {
                CompletionMethod::Landing
            } else {
                CompletionMethod::Timeout
            };
            state.status = FlightStatus::Completed;
            state.completed_at = Some(now);
            state.completion_method = Some(method);
            state.completion_confidence = Some(if method == CompletionMethod::Landing { 1.0 } else { 0.0 });
            flight_states.upsert(state.clone()).await?;
            completed_count += 1;

            info!(callsign = %state.callsign, method = method.as_str(), "flight completed");
            if let Err(e) = summarizer.flight(&state).await {
                error!(callsign = %state.callsign, error = %e, "flight summarization failed");
            }
        } else {
            flight_states.upsert(state).await?;
        }
    }

    Ok(completed_count)
}

/// Administrative manual completion hook (§4.8 "Manual transitions").
pub async fn complete_flight_manually(
    flight_states: &FlightStatesRepository,
    summarizer: &Summarizer,
    callsign: String,
    logon_time: chrono::DateTime<Utc>,
) -> Result<(), CoreError> {
    let Some(mut state) = flight_states.find(callsign, logon_time).await? else {
        return Err(CoreError::RecordInvalid {
            reason: "no such flight state".to_string(),
        });
    };
    if state.status.is_terminal() {
        return Ok(());
    }
    state.status = FlightStatus::Completed;
    state.completed_at = Some(Utc::now());
    state.completion_method = Some(CompletionMethod::Manual);
    state.completion_confidence = Some(1.0);
    flight_states.upsert(state.clone()).await?;
    summarizer.flight(&state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: FlightStatus, last_seen_offset_min: i64) -> FlightState {
        let now = Utc::now();
        FlightState {
            callsign: "QFA1".into(),
            logon_time: now,
            cid: 1,
            status,
            landed_at: None,
            landing_airport_icao: None,
            completed_at: None,
            completion_method: None,
            completion_confidence: None,
            last_seen_at: now - chrono::Duration::minutes(last_seen_offset_min),
        }
    }

    #[test]
    fn active_absent_past_t_stale_becomes_stale() {
        let s = state(FlightStatus::Active, 10);
        let absence = Utc::now() - s.last_seen_at;
        assert!(absence >= chrono::Duration::minutes(5));
    }

    #[test]
    fn completed_is_terminal_and_never_revisited() {
        let s = state(FlightStatus::Completed, 1000);
        assert!(s.status.is_terminal());
    }
}
