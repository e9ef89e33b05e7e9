use super::{
    AbortOutcome, EmergencyAbort, MissionExit, MissionLoop, MissionStatus, WaypointFeed,
    power::{PowerEstimator, PowerExit, PowerLoop, PowerState, PowerStats},
};
use crate::config::MissionConfig;
use crate::vehicle::{MissionError, VehicleLink};
use crate::{error, info, log, warn};
use chrono::{DateTime, TimeDelta, Utc};
use std::{sync::Arc, time::Duration};
use strum_macros::Display;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const MISSION_UNIT: &str = "mission loop";
const POWER_UNIT: &str = "power loop";

/// Why a mission run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationCause {
    /// The waypoint feed closed. Clean end unless something else went wrong.
    Exhausted,
    CriticalBattery,
    /// A position command failed.
    CommandFailed,
    /// The battery telemetry stream ended.
    TelemetryLost,
    /// External interrupt (Ctrl-C).
    Interrupted,
    /// A control loop panicked.
    Fault,
}

/// Summary of a finished mission run.
#[derive(Debug, Clone)]
pub struct MissionReport {
    pub cause: TerminationCause,
    /// First error recorded during the run.
    pub error: Option<MissionError>,
    /// `None` if the emergency abort was not required.
    pub abort: Option<AbortOutcome>,
    pub waypoints: usize,
    pub power_stats: Option<PowerStats>,
    pub final_power: Option<PowerState>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl MissionReport {
    pub fn aborted(&self) -> bool { self.abort.is_some() }

    pub fn duration(&self) -> TimeDelta { self.ended_at - self.started_at }

    /// A run is clean when no abort was needed and no fatal error was recorded.
    pub fn is_clean(&self) -> bool {
        !self.aborted() && !self.error.as_ref().is_some_and(MissionError::is_fatal)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn log(&self) {
        let secs = self.duration().num_milliseconds() as f64 / 1000.0;
        info!(
            "Mission ended: {} after {secs:.1}s with {} waypoints commanded.",
            self.cause, self.waypoints
        );
        if let Some(err) = &self.error {
            warn!("First recorded error: {err}");
        }
        if let Some(stats) = self.power_stats {
            log!(
                "Power monitor: {} samples, {} glitches, {} timeouts.",
                stats.samples, stats.glitches, stats.timeouts
            );
        }
        if let Some(power) = self.final_power {
            log!(
                "Final battery state: {:.1}% ({:.0} J), {:.1} min left.",
                power.percent_remaining(),
                power.energy_remaining_j(),
                power.est_minutes_remaining()
            );
        }
        match self.abort {
            Some(AbortOutcome::Executed { offboard_stopped, landed }) => {
                warn!("Emergency abort executed: offboard stopped: {offboard_stopped}, landed: {landed}.");
            }
            Some(AbortOutcome::AlreadyTriggered) => {
                warn!("Emergency abort had already been executed before the mission ended.");
            }
            None => info!("No emergency abort required."),
        }
    }
}

enum FirstDone {
    Interrupt,
    Mission(Result<MissionExit, JoinError>),
    Power(Result<PowerExit, JoinError>),
}

/// Runs the mission and power loops side by side and decides how the mission ends.
pub struct MissionSupervisor {
    link: Arc<dyn VehicleLink>,
    status: Arc<MissionStatus>,
    config: Arc<MissionConfig>,
    abort: EmergencyAbort,
}

impl MissionSupervisor {
    pub fn new(link: Arc<dyn VehicleLink>, status: Arc<MissionStatus>, config: Arc<MissionConfig>) -> Self {
        let abort = EmergencyAbort::new(Arc::clone(&link));
        Self { link, status, config, abort }
    }

    pub fn status(&self) -> Arc<MissionStatus> { Arc::clone(&self.status) }

    /// Runs the emergency abort sequence directly, e.g. when pre-flight fails while airborne.
    pub async fn emergency_abort(&self, reason: &str) -> AbortOutcome {
        self.status.mark_terminated();
        self.abort.trigger(reason).await
    }

    /// Races both loops to first completion, stops the other and aborts if required.
    ///
    /// The abort runs on critical battery, on any fatal recorded error (including a loop that
    /// missed its stop grace period) and on an interrupt.
    ///
    /// # Arguments
    /// * `feed` - Relative targets for the mission loop.
    /// * `interrupt` - External interrupt. Cancelling it stops both loops and always aborts.
    ///
    /// # Returns
    /// A [`MissionReport`] with the termination cause, the first recorded error and the abort
    /// outcome, if any.
    pub async fn run(&self, feed: WaypointFeed, interrupt: CancellationToken) -> MissionReport {
        let started_at = Utc::now();
        let mission_tok = CancellationToken::new();
        let power_tok = CancellationToken::new();
        let mission = MissionLoop::new(Arc::clone(&self.link), Arc::clone(&self.status), feed, &self.config);
        let power = PowerLoop::new(
            Arc::clone(&self.link),
            Arc::clone(&self.status),
            PowerEstimator::from_config(&self.config),
            self.config.battery_poll_interval,
        );
        let mut mission_h = tokio::spawn(mission.run(mission_tok.clone()));
        let mut power_h = tokio::spawn(power.run(power_tok.clone()));
        info!("Mission supervisor started both control loops.");

        let first = tokio::select! {
            biased;
            () = interrupt.cancelled() => FirstDone::Interrupt,
            res = &mut mission_h => FirstDone::Mission(res),
            res = &mut power_h => FirstDone::Power(res),
        };

        let grace = self.config.stop_grace;
        let (cause, power_stats) = match first {
            FirstDone::Interrupt => {
                warn!("Interrupt received, stopping both control loops.");
                let mission_res = stop_unit(MISSION_UNIT, mission_h, &mission_tok, grace).await;
                let power_res = stop_unit(POWER_UNIT, power_h, &power_tok, grace).await;
                self.absorb(mission_res).await;
                let stats = self.absorb(power_res).await.map(|exit| exit.stats());
                (TerminationCause::Interrupted, stats)
            }
            FirstDone::Mission(res) => {
                let cause = match self.absorb(joined(MISSION_UNIT, res)).await {
                    Some(MissionExit::Exhausted) => TerminationCause::Exhausted,
                    Some(MissionExit::Aborted) => TerminationCause::CriticalBattery,
                    Some(MissionExit::Failed(_)) => TerminationCause::CommandFailed,
                    Some(MissionExit::Cancelled) => TerminationCause::Interrupted,
                    None => TerminationCause::Fault,
                };
                info!("Mission loop finished first ({cause}), stopping power loop.");
                let power_res = stop_unit(POWER_UNIT, power_h, &power_tok, grace).await;
                (cause, self.absorb(power_res).await.map(|exit| exit.stats()))
            }
            FirstDone::Power(res) => {
                let exit = self.absorb(joined(POWER_UNIT, res)).await;
                let cause = match exit {
                    Some(PowerExit::TelemetryLost(_)) => TerminationCause::TelemetryLost,
                    Some(PowerExit::Cancelled(_)) => TerminationCause::Interrupted,
                    None => TerminationCause::Fault,
                };
                warn!("Power loop finished first ({cause}), stopping mission loop.");
                let mission_res = stop_unit(MISSION_UNIT, mission_h, &mission_tok, grace).await;
                self.absorb(mission_res).await;
                (cause, exit.map(|e| e.stats()))
            }
        };
        self.status.mark_terminated();

        let error = self.status.last_error().await;
        let abort_reason = if self.status.is_critical_battery() {
            Some(String::from("critical battery"))
        } else if let Some(err) = error.as_ref().filter(|e| e.is_fatal()) {
            Some(format!("fatal error: {err}"))
        } else if cause == TerminationCause::Interrupted {
            Some(String::from("external interrupt"))
        } else {
            None
        };
        let abort = match abort_reason {
            Some(reason) => Some(self.abort.trigger(&reason).await),
            None => None,
        };

        MissionReport {
            cause,
            error,
            abort,
            waypoints: self.status.progress().waypoints,
            power_stats,
            final_power: self.status.power(),
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Records the error of a failed unit and passes on its output otherwise.
    async fn absorb<T>(&self, res: Result<T, MissionError>) -> Option<T> {
        match res {
            Ok(out) => Some(out),
            Err(err) => {
                self.status.record_error(err).await;
                None
            }
        }
    }
}

fn joined<T>(unit: &'static str, res: Result<T, JoinError>) -> Result<T, MissionError> {
    res.map_err(|e| {
        error!("The {unit} terminated abnormally: {e}");
        MissionError::Panicked(unit)
    })
}

/// Cancels a unit and waits for it to acknowledge within `grace`. A unit missing its grace period
/// is forcibly aborted.
pub(crate) async fn stop_unit<T>(
    unit: &'static str,
    handle: JoinHandle<T>,
    c_tok: &CancellationToken,
    grace: Duration,
) -> Result<T, MissionError> {
    c_tok.cancel();
    let abort_handle = handle.abort_handle();
    match timeout(grace, handle).await {
        Ok(res) => joined(unit, res),
        Err(_) => {
            abort_handle.abort();
            error!("The {unit} did not stop within {}ms, aborted it.", grace.as_millis());
            Err(MissionError::StopTimeout(unit))
        }
    }
}
