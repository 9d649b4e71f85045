use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser)]
#[command(name = "aerostat", about = "VATSIM/IVAO network data ingestion and summarization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion pipeline until SIGINT/SIGTERM.
    Run,
    /// Run pending embedded migrations and exit.
    ValidateSchema,
    /// Delete position/transceiver history older than the retention window.
    Cleanup {
        /// Override RETENTION_H for this run only.
        #[arg(long)]
        retention_hours: Option<u64>,
    },
    /// Signal the running instance to re-read its boundary polygon.
    ReloadBoundary,
    /// Force a flight into `completed`, bypassing the landing/timeout detectors.
    CompleteFlight {
        #[arg(long)]
        callsign: String,
        #[arg(long)]
        logon_time: DateTime<Utc>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    aerostat::telemetry::init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => aerostat::commands::handle_run().await,
        Commands::ValidateSchema => aerostat::commands::handle_validate_schema().await,
        Commands::Cleanup { retention_hours } => aerostat::commands::handle_cleanup(retention_hours).await,
        Commands::ReloadBoundary => aerostat::commands::handle_reload_boundary().await,
        Commands::CompleteFlight { callsign, logon_time } => {
            aerostat::commands::handle_complete_flight(callsign, logon_time).await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "command failed");
        let exit_code = e
            .downcast_ref::<aerostat::error::CoreError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(exit_code);
    }

    Ok(())
}
