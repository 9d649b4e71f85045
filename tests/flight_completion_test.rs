//! Flight Completion state machine invariants (§8 "terminal monotonicity")
//! and the frequency-match symmetry the two Summarizer entry points rely on
//! (§8 "summary_symmetry").

mod common;

use aerostat::completion;
use aerostat::models::{CompletionMethod, FlightState, FlightStatus, FrequencyMatch};
use aerostat::repo::{FlightStatesRepository, MatchesRepository, PilotsRepository, SummariesRepository};
use aerostat::summarizer::Summarizer;
use common::TestDatabase;

fn summarizer_for(db: &TestDatabase) -> Summarizer {
    Summarizer::new(
        PilotsRepository::new(db.pool()),
        MatchesRepository::new(db.pool()),
        SummariesRepository::new(db.pool()),
    )
}

#[tokio::test]
async fn completing_an_already_completed_flight_is_a_no_op() {
    let db = TestDatabase::new().await.expect("test database");
    let flight_states = FlightStatesRepository::new(db.pool());
    let summarizer = summarizer_for(&db);

    let now = chrono::Utc::now();
    let logon_time = now - chrono::Duration::hours(2);
    let mut state = FlightState::new_active("QFA1".into(), logon_time, 1, now);
    state.status = FlightStatus::Completed;
    state.completed_at = Some(now);
    state.completion_method = Some(CompletionMethod::Landing);
    state.completion_confidence = Some(1.0);
    flight_states.upsert(state.clone()).await.unwrap();

    completion::complete_flight_manually(&flight_states, &summarizer, "QFA1".into(), logon_time)
        .await
        .expect("completing an already-terminal flight must succeed as a no-op");

    let reloaded = flight_states.find("QFA1".into(), logon_time).await.unwrap().unwrap();
    assert_eq!(reloaded.status, FlightStatus::Completed);
    assert_eq!(reloaded.completion_method, Some(CompletionMethod::Landing), "a no-op must not overwrite the original completion method");
}

#[tokio::test]
async fn manual_completion_transitions_active_flight_to_completed() {
    let db = TestDatabase::new().await.expect("test database");
    let flight_states = FlightStatesRepository::new(db.pool());
    let summarizer = summarizer_for(&db);

    let now = chrono::Utc::now();
    let logon_time = now - chrono::Duration::hours(1);
    let state = FlightState::new_active("QFA2".into(), logon_time, 2, now);
    flight_states.upsert(state).await.unwrap();

    completion::complete_flight_manually(&flight_states, &summarizer, "QFA2".into(), logon_time)
        .await
        .unwrap();

    let reloaded = flight_states.find("QFA2".into(), logon_time).await.unwrap().unwrap();
    assert_eq!(reloaded.status, FlightStatus::Completed);
    assert_eq!(reloaded.completion_method, Some(CompletionMethod::Manual));
    assert!(reloaded.completed_at.is_some());
}

#[tokio::test]
async fn completing_an_unknown_flight_fails() {
    let db = TestDatabase::new().await.expect("test database");
    let flight_states = FlightStatesRepository::new(db.pool());
    let summarizer = summarizer_for(&db);

    let result = completion::complete_flight_manually(
        &flight_states,
        &summarizer,
        "GHOST1".into(),
        chrono::Utc::now(),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn pilot_and_controller_spans_see_the_same_match_symmetrically() {
    let db = TestDatabase::new().await.expect("test database");
    let matches_repo = MatchesRepository::new(db.pool());

    let first_seen = "2026-01-01T00:00:00Z".parse().unwrap();
    let last_seen = "2026-01-01T00:10:00Z".parse().unwrap();

    let m = FrequencyMatch {
        pilot_callsign: "QFA3".into(),
        controller_callsign: "SY_TWR".into(),
        frequency_hz: 120_500_000,
        pilot_pos: Some((-33.95, 151.18)),
        controller_pos: Some((-33.94, 151.17)),
        distance_nm: 1.2,
        first_seen,
        last_seen,
        duration_s: 600,
        confidence: 0.9,
        communication_type: "voice".into(),
    };
    matches_repo.insert_frequency_matches(vec![m]).await.unwrap();

    let for_pilot = matches_repo
        .for_pilot_in_span("QFA3".into(), first_seen, last_seen)
        .await
        .unwrap();
    let for_controller = matches_repo
        .for_controller_in_span("SY_TWR".into(), first_seen, last_seen)
        .await
        .unwrap();

    assert_eq!(for_pilot.len(), 1);
    assert_eq!(for_controller.len(), 1);
    assert_eq!(for_pilot[0].frequency_hz, for_controller[0].frequency_hz);
    assert_eq!(for_pilot[0].first_seen, for_controller[0].first_seen);
    assert_eq!(for_pilot[0].last_seen, for_controller[0].last_seen);
}

#[tokio::test]
async fn matches_outside_the_queried_span_are_excluded() {
    let db = TestDatabase::new().await.expect("test database");
    let matches_repo = MatchesRepository::new(db.pool());

    let m = FrequencyMatch {
        pilot_callsign: "QFA4".into(),
        controller_callsign: "ML_CTR".into(),
        frequency_hz: 132_000_000,
        pilot_pos: None,
        controller_pos: None,
        distance_nm: 5.0,
        first_seen: "2026-01-01T00:00:00Z".parse().unwrap(),
        last_seen: "2026-01-01T00:05:00Z".parse().unwrap(),
        duration_s: 300,
        confidence: 0.7,
        communication_type: "voice".into(),
    };
    matches_repo.insert_frequency_matches(vec![m]).await.unwrap();

    let outside_span_start = "2026-01-02T00:00:00Z".parse().unwrap();
    let outside_span_end = "2026-01-02T01:00:00Z".parse().unwrap();

    let for_pilot = matches_repo
        .for_pilot_in_span("QFA4".into(), outside_span_start, outside_span_end)
        .await
        .unwrap();

    assert!(for_pilot.is_empty());
}
