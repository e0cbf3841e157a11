//! Intercom simulator
//!
//! Runs the control core on a workstation:
//! 1. `device` boots a simulated board from a scenario file and drives the
//!    supervisor loop against real monitoring servers
//! 2. `monitor` runs a monitoring server stub with an HTTP status API
//!
//! Usage:
//!   intercom-sim monitor --port 7700
//!   intercom-sim device sim/scenarios/lobby.toml --ticks 1200

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intercom_core::call::CallRecord;
use intercom_net::TcpTransport;
use intercom_sim::monitor::{MonitorState, build_router, serve_devices};
use intercom_sim::run_device;
use intercom_sim::scenario::Scenario;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "intercom-sim")]
#[command(about = "Intercom control core simulator")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulated device
    Device {
        /// Scenario file
        scenario: PathBuf,

        /// Ticks to run; defaults to just past the last scripted event
        #[arg(short, long)]
        ticks: Option<u64>,
    },
    /// Run a monitoring server stub
    Monitor {
        /// Port devices connect to
        #[arg(short, long, default_value = "7700")]
        port: u16,

        /// HTTP status API port
        #[arg(long, default_value = "7780")]
        http_port: u16,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    // The supervisor is single-threaded by construction.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    match args.command {
        Command::Device { scenario, ticks } => runtime.block_on(device(scenario, ticks)),
        Command::Monitor { port, http_port } => runtime.block_on(monitor(port, http_port)),
    }
}

async fn device(path: PathBuf, ticks: Option<u64>) -> Result<()> {
    let scenario = Scenario::load(&path)?;
    let ticks = ticks.unwrap_or_else(|| scenario.last_tick() + 50);
    info!("Running {:?} for {} ticks", path, ticks);

    let (supervisor, _device) = run_device(scenario, Arc::new(TcpTransport), ticks).await?;

    println!("\n========================================");
    println!("  Simulation finished");
    println!("========================================");
    println!("  Status:       {:?}", supervisor.status());
    for warning in supervisor.warnings() {
        println!("  Warning:      {}", warning);
    }
    println!("  Registration: {}", supervisor.registration());
    println!("  Ticks:        {}", supervisor.context().clock.now());
    println!("\n  Call log:");
    for record in supervisor.context().calls.log().records() {
        println!("  - {}", describe(record));
    }
    if let Some(outcome) = supervisor.last_emergency() {
        println!("\n  Last emergency: {}", outcome.display_text());
    }
    println!("========================================\n");
    Ok(())
}

fn describe(record: &CallRecord) -> String {
    match record {
        CallRecord::Missed { caller, at } => format!("{at} missed call from {caller}"),
        CallRecord::Completed {
            kind,
            number,
            duration_ms,
            ended_at,
        } => format!("{ended_at} {kind} call with {number}, {duration_ms} ms"),
        CallRecord::Failed {
            kind,
            number,
            reason,
            at,
        } => format!("{at} {kind} call to {number} failed: {reason}"),
        CallRecord::Rejected { caller, at } => format!("{at} rejected call from {caller}"),
        CallRecord::Preempted { kind, number, at } => {
            format!("{at} {kind} call with {number} dropped for emergency")
        }
    }
}

async fn monitor(port: u16, http_port: u16) -> Result<()> {
    let state = MonitorState::new();

    let devices = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind device port {port}"))?;
    let http = tokio::net::TcpListener::bind(("0.0.0.0", http_port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {http_port}"))?;

    println!("\n========================================");
    println!("  Monitoring Server Running");
    println!("========================================");
    println!("  Device Port: {}", port);
    println!("  HTTP Port:   {}", http_port);
    println!("  Status API:  http://localhost:{}/api/v1/devices", http_port);
    println!("========================================\n");

    let app = build_router(state.clone());
    futures::future::try_join(
        async { serve_devices(devices, state).await.context("Device listener failed") },
        async { axum::serve(http, app).await.context("HTTP server failed") },
    )
    .await?;
    Ok(())
}
