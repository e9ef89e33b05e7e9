#![allow(dead_code)]
mod config;
mod flight_control;
mod http_handler;
mod keychain;
mod logger;
mod vehicle;

use crate::config::MissionConfig;
use crate::flight_control::{StatusReporter, WaypointGenerator, run_preflight};
use crate::keychain::Keychain;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> ExitCode {
    let config = match MissionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    config.log_effective();

    let keychain = match Keychain::connect(config).await {
        Ok(keychain) => keychain,
        Err(e) => {
            error!("Could not connect to the vehicle: {e}");
            return ExitCode::FAILURE;
        }
    };
    let config = keychain.config();
    let supervisor = keychain.supervisor();

    let interrupt = CancellationToken::new();
    spawn_interrupt_listener(interrupt.clone());

    if let Err(e) = run_preflight(keychain.link().as_ref(), &config, &interrupt).await {
        error!("{e}");
        if e.is_airborne() {
            supervisor.emergency_abort("pre-flight did not complete while airborne").await;
        }
        return ExitCode::FAILURE;
    }

    let reporter = StatusReporter::new(keychain.status(), config.status_interval).spawn();
    let gen_tok = CancellationToken::new();
    let (feed, generator) = WaypointGenerator::new(&config).spawn(gen_tok.clone());

    let report = supervisor.run(feed, interrupt).await;
    gen_tok.cancel();
    match generator.await {
        Ok(produced) => info!("Waypoint generator stopped after {produced} targets."),
        Err(e) => warn!("Waypoint generator terminated abnormally: {e}"),
    }
    if let Err(e) = reporter.await {
        warn!("Status reporter terminated abnormally: {e}");
    }

    report.log();
    if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Cancels `interrupt` on the first Ctrl-C.
fn spawn_interrupt_listener(interrupt: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Ctrl-C received, interrupting the mission.");
                interrupt.cancel();
            }
            Err(e) => error!("Could not listen for Ctrl-C: {e}"),
        }
    });
}
