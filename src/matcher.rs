//! ATC<->Flight Matcher (C9) — the hardest subsystem (§4.9). Builds
//! `FrequencyMatch` records from transceiver history alone: the pilot and
//! controller streams are joined purely on `(frequency, time, distance)`,
//! never by any prior knowledge of who is talking to whom.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::info;

use crate::config::Config;
use crate::error::CoreError;
use crate::geo_math::haversine_distance_nm;
use crate::models::{EntityType, FrequencyMatch, TransceiverRow};
use crate::repo::{ControllersRepository, MatchesRepository, TransceiversRepository};

/// Width of the detection window scanned on each run. Not independently
/// configurable by §4.9; sized to comfortably exceed `match_time_tol` plus
/// the step-4 collapse gap so no in-progress contact is cut off mid-window.
const LOOKBACK: Duration = Duration::from_secs(15 * 60);

/// Gap under which two consecutive matches for the same
/// `(pilot, controller, freq)` collapse into one interval (§4.9 step 4).
const COLLAPSE_GAP: chrono::Duration = chrono::Duration::seconds(60);

#[derive(Clone)]
pub struct Matcher {
    transceivers_repo: TransceiversRepository,
    controllers_repo: ControllersRepository,
    matches_repo: MatchesRepository,
    config: Config,
}

impl Matcher {
    pub fn new(
        transceivers_repo: TransceiversRepository,
        controllers_repo: ControllersRepository,
        matches_repo: MatchesRepository,
        config: Config,
    ) -> Self {
        Self {
            transceivers_repo,
            controllers_repo,
            matches_repo,
            config,
        }
    }

    /// Runs one detection pass over the lookback window and bulk-writes the
    /// resulting matches. Pure function of the transceiver stream: the same
    /// inputs always yield the same set of matches regardless of processing
    /// order (§4.9 "Ordering guarantee").
    pub async fn run(&self) -> Result<usize, CoreError> {
        let since = Utc::now()
            - chrono::Duration::from_std(LOOKBACK).unwrap_or(chrono::Duration::minutes(15));

        // Pre-loaded facility map, consulted before the detection query —
        // never by join, per §4.9 step 1's correctness lesson (§9).
        let facility_map = self.controllers_repo.facility_map().await?;

        let atc_obs = self
            .transceivers_repo
            .in_window(EntityType::Atc, since)
            .await?;
        let atc_obs: Vec<TransceiverRow> = atc_obs
            .into_iter()
            .filter(|o| facility_map.get(&o.callsign).copied().unwrap_or(0) != 0)
            .filter(|o| !o.callsign.ends_with("_OBS"))
            .collect();

        let pilot_obs = self
            .transceivers_repo
            .in_window(EntityType::Pilot, since)
            .await?;

        if atc_obs.is_empty() || pilot_obs.is_empty() {
            return Ok(0);
        }

        let max_dist_nm = self.config.match_max_dist_nm;
        let time_tol = chrono::Duration::from_std(self.config.match_time_tol)
            .unwrap_or(chrono::Duration::seconds(180));
        let min_duration_s = self.config.match_min_duration.as_secs() as i32;
        let freq_tol_hz = self.config.freq_tol_hz.max(1);

        // Bucket scan and collapse is CPU-bound (§5); run it off the async
        // executor so a long detection run never starves the Coordinator
        // tick.
        let matches = tokio::task::spawn_blocking(move || {
            detect(&atc_obs, &pilot_obs, freq_tol_hz, time_tol, max_dist_nm, min_duration_s)
        })
        .await
        .map_err(|e| CoreError::Detector(anyhow::anyhow!(e)))?;

        if matches.is_empty() {
            return Ok(0);
        }

        let count = self.matches_repo.insert_frequency_matches(matches).await?;
        info!(count, "frequency matches written");
        Ok(count)
    }
}

struct RawPair {
    pilot_callsign: String,
    controller_callsign: String,
    frequency_hz: i64,
    pilot_pos: (f64, f64),
    controller_pos: (f64, f64),
    distance_nm: f64,
    timestamp: DateTime<Utc>,
}

fn detect(
    atc_obs: &[TransceiverRow],
    pilot_obs: &[TransceiverRow],
    freq_tol_hz: i64,
    time_tol: chrono::Duration,
    max_dist_nm: f64,
    min_duration_s: i32,
) -> Vec<FrequencyMatch> {
    let bucket_of = |freq_hz: i64| freq_hz / freq_tol_hz;

    let mut atc_buckets: HashMap<i64, Vec<&TransceiverRow>> = HashMap::new();
    for o in atc_obs {
        atc_buckets.entry(bucket_of(o.frequency_hz)).or_default().push(o);
    }
    let mut pilot_buckets: HashMap<i64, Vec<&TransceiverRow>> = HashMap::new();
    for o in pilot_obs {
        pilot_buckets.entry(bucket_of(o.frequency_hz)).or_default().push(o);
    }

    let shared_buckets: Vec<i64> = pilot_buckets
        .keys()
        .copied()
        .filter(|b| atc_buckets.contains_key(b))
        .collect();

    // Independent buckets share no mutable state, so the scan parallelizes
    // cleanly across them (§5).
    let raw_pairs: Vec<RawPair> = shared_buckets
        .par_iter()
        .flat_map(|bucket| {
            let pilots = &pilot_buckets[bucket];
            let controllers = &atc_buckets[bucket];
            let mut pairs = Vec::new();
            for p in pilots {
                for c in controllers {
                    let dt = p.observation_time - c.observation_time;
                    let dt = if dt < chrono::Duration::zero() { -dt } else { dt };
                    if dt > time_tol {
                        continue;
                    }
                    let distance_nm = haversine_distance_nm(p.lat, p.lon, c.lat, c.lon);
                    if distance_nm > max_dist_nm {
                        continue;
                    }
                    pairs.push(RawPair {
                        pilot_callsign: p.callsign.clone(),
                        controller_callsign: c.callsign.clone(),
                        frequency_hz: p.frequency_hz,
                        pilot_pos: (p.lat, p.lon),
                        controller_pos: (c.lat, c.lon),
                        distance_nm,
                        timestamp: p.observation_time.max(c.observation_time),
                    });
                }
            }
            pairs
        })
        .collect();

    collapse_into_matches(raw_pairs, max_dist_nm, min_duration_s)
}

fn collapse_into_matches(
    mut pairs: Vec<RawPair>,
    max_dist_nm: f64,
    min_duration_s: i32,
) -> Vec<FrequencyMatch> {
    pairs.sort_by(|a, b| {
        (
            a.pilot_callsign.as_str(),
            a.controller_callsign.as_str(),
            a.frequency_hz,
            a.timestamp,
        )
            .cmp(&(
                b.pilot_callsign.as_str(),
                b.controller_callsign.as_str(),
                b.frequency_hz,
                b.timestamp,
            ))
    });

    let mut matches = Vec::new();
    let mut iter = pairs.into_iter().peekable();
    while let Some(first) = iter.next() {
        let pilot_callsign = first.pilot_callsign.clone();
        let controller_callsign = first.controller_callsign.clone();
        let frequency_hz = first.frequency_hz;
        let first_seen = first.timestamp;
        let mut last_seen = first.timestamp;
        let mut best_distance_nm = first.distance_nm;
        let mut pilot_pos = first.pilot_pos;
        let mut controller_pos = first.controller_pos;

        while let Some(next) = iter.peek() {
            if next.pilot_callsign != pilot_callsign
                || next.controller_callsign != controller_callsign
                || next.frequency_hz != frequency_hz
            {
                break;
            }
            if next.timestamp - last_seen > COLLAPSE_GAP {
                break;
            }
            last_seen = next.timestamp;
            if next.distance_nm < best_distance_nm {
                best_distance_nm = next.distance_nm;
                pilot_pos = next.pilot_pos;
                controller_pos = next.controller_pos;
            }
            iter.next();
        }

        let duration_s = (last_seen - first_seen).num_seconds().max(0) as i32;
        if duration_s < min_duration_s {
            continue;
        }

        matches.push(FrequencyMatch {
            pilot_callsign,
            controller_callsign,
            frequency_hz,
            pilot_pos: Some(pilot_pos),
            controller_pos: Some(controller_pos),
            distance_nm: best_distance_nm,
            first_seen,
            last_seen,
            duration_s,
            confidence: match_confidence(best_distance_nm, duration_s, max_dist_nm),
            communication_type: communication_type(frequency_hz).to_string(),
        });
    }

    matches
}

/// Monotone in both inverse distance and duration, normalized to `[0, 1]`.
/// Deterministic and order-independent, as required by §4.9 step 7 — the
/// exact weighting is an implementation choice, not a contract.
fn match_confidence(distance_nm: f64, duration_s: i32, max_dist_nm: f64) -> f64 {
    let proximity = if max_dist_nm > 0.0 {
        (1.0 - (distance_nm / max_dist_nm)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let persistence = duration_s as f64 / (duration_s as f64 + 60.0);
    (0.6 * proximity + 0.4 * persistence).clamp(0.0, 1.0)
}

fn communication_type(frequency_hz: i64) -> &'static str {
    let mhz = frequency_hz as f64 / 1_000_000.0;
    if (118.0..121.0).contains(&mhz) {
        "approach"
    } else if (121.0..123.0).contains(&mhz) {
        "departure"
    } else if (123.0..125.0).contains(&mhz) {
        "tower"
    } else if (125.0..127.0).contains(&mhz) {
        "ground"
    } else if (127.0..136.0).contains(&mhz) {
        "enroute"
    } else if (20.0..30.0).contains(&mhz) {
        "hf_enroute"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        entity_type: &str,
        callsign: &str,
        frequency_hz: i64,
        lat: f64,
        lon: f64,
        t: DateTime<Utc>,
    ) -> TransceiverRow {
        TransceiverRow {
            id: 0,
            entity_type: entity_type.to_string(),
            callsign: callsign.to_string(),
            transceiver_index: 0,
            frequency_hz,
            lat,
            lon,
            height_msl_m: None,
            height_agl_m: None,
            observation_time: t,
            created_at: t,
        }
    }

    #[test]
    fn communication_type_bands_match_spec_table() {
        assert_eq!(communication_type(119_500_000), "approach");
        assert_eq!(communication_type(122_000_000), "departure");
        assert_eq!(communication_type(124_000_000), "tower");
        assert_eq!(communication_type(126_000_000), "ground");
        assert_eq!(communication_type(130_000_000), "enroute");
        assert_eq!(communication_type(25_000_000), "hf_enroute");
        assert_eq!(communication_type(400_000_000), "unknown");
    }

    #[test]
    fn confidence_increases_with_proximity_and_duration() {
        let near_long = match_confidence(1.0, 600, 100.0);
        let far_short = match_confidence(90.0, 5, 100.0);
        assert!(near_long > far_short);
        assert!((0.0..=1.0).contains(&near_long));
    }

    #[test]
    fn close_observations_collapse_into_one_interval() {
        let base = Utc::now();
        let pairs = vec![
            RawPair {
                pilot_callsign: "QFA1".into(),
                controller_callsign: "SY_TWR".into(),
                frequency_hz: 120_500_000,
                pilot_pos: (-33.9, 151.1),
                controller_pos: (-33.9, 151.1),
                distance_nm: 1.0,
                timestamp: base,
            },
            RawPair {
                pilot_callsign: "QFA1".into(),
                controller_callsign: "SY_TWR".into(),
                frequency_hz: 120_500_000,
                pilot_pos: (-33.9, 151.1),
                controller_pos: (-33.9, 151.1),
                distance_nm: 1.0,
                timestamp: base + chrono::Duration::seconds(90),
            },
        ];
        let matches = collapse_into_matches(pairs, 100.0, 30);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].duration_s, 90);
    }

    #[test]
    fn short_intervals_are_discarded_as_noise() {
        let base = Utc::now();
        let pairs = vec![RawPair {
            pilot_callsign: "QFA1".into(),
            controller_callsign: "SY_TWR".into(),
            frequency_hz: 120_500_000,
            pilot_pos: (-33.9, 151.1),
            controller_pos: (-33.9, 151.1),
            distance_nm: 1.0,
            timestamp: base,
        }];
        let matches = collapse_into_matches(pairs, 100.0, 30);
        assert!(matches.is_empty());
    }

    #[test]
    fn detect_joins_pilot_and_atc_streams_on_freq_time_and_distance() {
        let base = Utc::now();
        let atc = vec![row("atc", "SY_TWR", 120_500_000, -33.9461, 151.1772, base)];
        let pilot = vec![row(
            "pilot",
            "QFA1",
            120_500_050,
            -33.95,
            151.18,
            base + chrono::Duration::seconds(120),
        )];
        let matches = detect(&atc, &pilot, 100, chrono::Duration::seconds(180), 100.0, 0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pilot_callsign, "QFA1");
        assert_eq!(matches[0].controller_callsign, "SY_TWR");
    }
}
