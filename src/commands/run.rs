//! `aerostat run`: the composition root. Builds every component named in
//! §2/§5, warm-starts the Coordinator (C6) from persisted state, and drives
//! its polling loop until `SIGINT`/`SIGTERM` (§10.1).

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::airports::AirportStore;
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::db;
use crate::feed::FeedClient;
use crate::geo_filter::GeoFilter;
use crate::instance_lock::InstanceLock;
use crate::metrics;
use crate::repo::{
    ControllersRepository, FlightStatesRepository, MatchesRepository, PilotsRepository,
    SummariesRepository, TransceiversRepository,
};

pub async fn handle_run() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    let _lock = InstanceLock::new("aerostat").context("acquiring instance lock")?;

    let pool = db::build_pool(&config).context("building database pool")?;
    db::validate_schema(&pool).context("validating schema")?;

    let airports =
        AirportStore::load(Path::new(&config.airports_path)).context("loading airport reference data")?;
    info!(count = airports.len(), "loaded airport reference data");

    let geo_filter = GeoFilter::new();
    let boundary = if config.boundary_enabled {
        let path = config
            .boundary_path
            .as_ref()
            .expect("Config::from_env validates BOUNDARY_PATH is set when BOUNDARY_ENABLED=true");
        Some(geo_filter.load(Path::new(path))?)
    } else {
        None
    };

    let pilots_repo = PilotsRepository::new(pool.clone());
    let controllers_repo = ControllersRepository::new(pool.clone());
    let transceivers_repo = TransceiversRepository::new(pool.clone());
    let flight_states_repo = FlightStatesRepository::new(pool.clone());
    let matches_repo = MatchesRepository::new(pool.clone());
    let summaries_repo = SummariesRepository::new(pool.clone());

    let feed = FeedClient::new(
        format!("{}/vatsim-data.json", config.feed_base_url),
        format!("{}/transceivers-data.json", config.feed_base_url),
    );

    let metrics_handle = metrics::init_metrics();
    metrics::initialize_core_metrics();

    let mut coordinator = Coordinator::new(
        config.clone(),
        feed,
        geo_filter,
        boundary,
        airports,
        pilots_repo,
        controllers_repo,
        transceivers_repo,
        flight_states_repo,
        matches_repo,
        summaries_repo,
    );
    coordinator.warm_start().await.context("warm-starting from persisted state")?;

    let cancel = CancellationToken::new();
    let reload = Arc::new(Notify::new());
    let health = coordinator.health_handle();

    let metrics_bind: SocketAddr = config
        .metrics_bind_addr
        .parse()
        .with_context(|| format!("parsing METRICS_BIND_ADDR {:?}", config.metrics_bind_addr))?;

    let metrics_cancel = cancel.clone();
    let metrics_task = tokio::spawn(async move {
        if let Err(e) = metrics::serve(metrics_bind, metrics_handle, health, metrics_cancel).await {
            error!(error = %e, "metrics server exited with error");
        }
    });

    let signal_cancel = cancel.clone();
    let signal_reload = reload.clone();
    tokio::spawn(async move {
        wait_for_shutdown_or_reload(signal_cancel, signal_reload).await;
    });

    coordinator.run(cancel, reload).await;
    let _ = metrics_task.await;
    Ok(())
}

/// Waits for `SIGINT`/`SIGTERM` (cancels the run loop) or `SIGHUP` (requests
/// a boundary reload and keeps waiting) — the Unix half of §10.1's signal
/// contract. Non-Unix targets only watch `ctrl_c`.
#[cfg(unix)]
async fn wait_for_shutdown_or_reload(cancel: CancellationToken, reload: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("installing SIGTERM handler");
    let mut sighup = signal(SignalKind::hangup()).expect("installing SIGHUP handler");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT");
                cancel.cancel();
                return;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM");
                cancel.cancel();
                return;
            }
            _ = sighup.recv() => {
                info!("received SIGHUP, requesting boundary reload");
                reload.notify_one();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_or_reload(cancel: CancellationToken, _reload: Arc<Notify>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("received ctrl-c");
    cancel.cancel();
}
