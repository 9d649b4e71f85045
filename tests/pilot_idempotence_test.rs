//! Replaying the same pilot snapshot must be a no-op against position
//! history and converge current state to the latest observation (§8
//! "idempotence").

mod common;

use aerostat::models::PilotObs;
use aerostat::repo::PilotsRepository;
use chrono::{DateTime, Utc};
use common::TestDatabase;

fn sample_pilot(observation_time: DateTime<Utc>) -> PilotObs {
    PilotObs {
        callsign: "QFA123".into(),
        cid: 100001,
        logon_time: "2026-01-01T00:00:00Z".parse().unwrap(),
        aircraft_type: Some("B738".into()),
        lat: -33.95,
        lon: 151.18,
        altitude_ft: 15_000.0,
        groundspeed_kt: 280.0,
        heading_deg: 90.0,
        transponder: Some("2000".into()),
        departure: Some("YSSY".into()),
        arrival: Some("YMML".into()),
        route: Some("DCT".into()),
        cruise_tas: Some("N450".into()),
        planned_altitude: Some("F350".into()),
        deptime: Some("0000".into()),
        remarks: None,
        flight_rules: Some("I".into()),
        observation_time,
    }
}

#[tokio::test]
async fn replaying_the_same_snapshot_does_not_duplicate_position_history() {
    let db = TestDatabase::new().await.expect("test database");
    let repo = PilotsRepository::new(db.pool());

    let obs_time = "2026-01-01T00:05:00Z".parse().unwrap();
    let pilot = sample_pilot(obs_time);

    let first = repo.insert_positions(vec![pilot.clone()]).await.unwrap();
    let second = repo.insert_positions(vec![pilot.clone()]).await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0, "replaying an identical observation must insert nothing new");

    let history = repo
        .position_history(pilot.callsign.clone(), pilot.logon_time)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn upsert_pilots_converges_to_latest_observation() {
    let db = TestDatabase::new().await.expect("test database");
    let repo = PilotsRepository::new(db.pool());

    let first = sample_pilot("2026-01-01T00:00:00Z".parse().unwrap());
    let mut second = sample_pilot("2026-01-01T00:01:00Z".parse().unwrap());
    second.altitude_ft = 16_000.0;

    repo.upsert_pilots(vec![first]).await.unwrap();
    repo.upsert_pilots(vec![second.clone()]).await.unwrap();

    let latest = repo.load_latest().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].altitude_ft, second.altitude_ft);
    assert_eq!(latest[0].observation_time, second.observation_time);
}
