//! `aerostat complete-flight`: the manual completion hook (§10.7) for an
//! operator to force a stuck flight to `completed` — e.g. a feed outage left
//! a flight state orphaned in `active`/`stale` well past `T_COMPLETE`.

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::completion;
use crate::config::Config;
use crate::db;
use crate::repo::{FlightStatesRepository, MatchesRepository, PilotsRepository, SummariesRepository};
use crate::summarizer::Summarizer;

pub async fn handle_complete_flight(callsign: String, logon_time: DateTime<Utc>) -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    let pool = db::build_pool(&config).context("building database pool")?;

    let flight_states_repo = FlightStatesRepository::new(pool.clone());
    let pilots_repo = PilotsRepository::new(pool.clone());
    let matches_repo = MatchesRepository::new(pool.clone());
    let summaries_repo = SummariesRepository::new(pool.clone());
    let summarizer = Summarizer::new(pilots_repo, matches_repo, summaries_repo);

    completion::complete_flight_manually(&flight_states_repo, &summarizer, callsign.clone(), logon_time)
        .await
        .with_context(|| format!("manually completing flight {callsign} @ {logon_time}"))?;

    println!("flight {callsign} @ {logon_time} marked completed");
    Ok(())
}
