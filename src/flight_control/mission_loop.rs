use super::{
    MissionProgress, MissionState, MissionStatus, WaypointFeed,
    common::{Vec2D, transform},
};
use crate::config::MissionConfig;
use crate::vehicle::{Attitude, OffboardError, PositionNedYaw, TelemetryReader, VehicleLink};
use crate::{error, event, info, log, warn};
use std::{future::Future, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

/// Why the mission loop stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum MissionExit {
    /// Critical battery observed, no further commands were issued.
    Aborted,
    /// A position command was rejected or not delivered.
    Failed(OffboardError),
    /// The waypoint feed closed.
    Exhausted,
    /// Stopped by the supervisor.
    Cancelled,
}

impl MissionExit {
    pub fn state(&self) -> MissionState {
        match self {
            MissionExit::Aborted => MissionState::Aborted,
            MissionExit::Failed(_) => MissionState::Failed,
            MissionExit::Exhausted => MissionState::Exhausted,
            MissionExit::Cancelled => MissionState::Cancelled,
        }
    }
}

/// Accumulated navigation-frame target. Owned by the mission loop only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NavigationTarget {
    pub position: Vec2D<f64>,
    pub heading_deg: f64,
}

/// Consumes relative targets, maps them into the navigation frame and commands the vehicle.
pub struct MissionLoop {
    link: Arc<dyn VehicleLink>,
    status: Arc<MissionStatus>,
    feed: WaypointFeed,
    altitude_m: f64,
    command_interval: Duration,
    heading_timeout: Duration,
    state: MissionState,
    target: NavigationTarget,
    last_heading: Option<f64>,
    waypoints: usize,
}

impl MissionLoop {
    /// Creates a mission loop in [`MissionState::Init`] with its target at the origin.
    ///
    /// # Arguments
    /// * `link` - Vehicle used for attitude reads and position commands.
    /// * `status` - Shared status, read for the critical flag and written with progress.
    /// * `feed` - Source of relative targets. Closing it ends the mission as exhausted.
    /// * `config` - Altitude, command interval and heading timeout are taken from here.
    pub fn new(
        link: Arc<dyn VehicleLink>,
        status: Arc<MissionStatus>,
        feed: WaypointFeed,
        config: &MissionConfig,
    ) -> Self {
        Self {
            link,
            status,
            feed,
            altitude_m: config.flight_altitude_m,
            command_interval: config.command_interval,
            heading_timeout: config.heading_timeout,
            state: MissionState::Init,
            target: NavigationTarget::default(),
            last_heading: None,
            waypoints: 0,
        }
    }

    /// Drives the vehicle through the waypoint feed until it closes, a command fails, the battery
    /// turns critical or `c_tok` is cancelled.
    ///
    /// # Arguments
    /// * `c_tok` - Cancellation from the supervisor. It wins over every other event.
    ///
    /// # Returns
    /// The [`MissionExit`] matching the terminal state that was reached.
    pub async fn run(mut self, c_tok: CancellationToken) -> MissionExit {
        let status = Arc::clone(&self.status);
        let link = Arc::clone(&self.link);
        let mut attitude = TelemetryReader::new(move || link.attitude_stream());
        self.target = NavigationTarget::default();
        info!("Mission loop started at {} m altitude.", self.altitude_m);

        loop {
            self.transition(MissionState::AwaitTarget);
            let next = match interruptible(&c_tok, &status, self.feed.next()).await {
                Ok(next) => next,
                Err(stop) => return self.finish(stop),
            };
            let Some(rel) = next else {
                return self.finish(MissionExit::Exhausted);
            };
            if status.is_critical_battery() {
                return self.finish(MissionExit::Aborted);
            }

            self.transition(MissionState::Transform);
            let heading = match interruptible(&c_tok, &status, self.read_heading(&mut attitude)).await {
                Ok(heading) => heading,
                Err(stop) => return self.finish(stop),
            };
            let step = transform(rel.body(), heading);
            self.target.position += step.delta;
            self.target.heading_deg = step.target_heading_deg;
            event!(
                "Target dx={:.2}, dy={:.2} at heading {heading:.1}° -> nav delta {:.2}",
                rel.dx(),
                rel.dy(),
                step.delta
            );

            self.transition(MissionState::Command);
            let setpoint = PositionNedYaw::at_altitude(
                self.target.position.x(),
                self.target.position.y(),
                self.altitude_m,
                self.target.heading_deg,
            );
            let sent = match interruptible(&c_tok, &status, self.link.send_position(setpoint)).await {
                Ok(sent) => sent,
                Err(stop) => return self.finish(stop),
            };
            if let Err(e) = sent {
                error!("Position command {} failed: {e}", self.waypoints + 1);
                status.record_error(e.clone().into()).await;
                return self.finish(MissionExit::Failed(e));
            }
            self.waypoints += 1;
            log!(
                "Waypoint {}: target {:.2} at {:.1}°, step {:.2} m",
                self.waypoints,
                self.target.position,
                self.target.heading_deg,
                rel.distance()
            );
            status.publish_progress(MissionProgress {
                waypoints: self.waypoints,
                target: self.target.position,
                target_heading_deg: self.target.heading_deg,
            });

            let wait = tokio::time::sleep(self.command_interval);
            if let Err(stop) = interruptible(&c_tok, &status, wait).await {
                return self.finish(stop);
            }
        }
    }

    /// Latest heading, bounded by the heading timeout. Falls back to the last observed heading,
    /// or 0 if none was ever observed.
    async fn read_heading(&mut self, attitude: &mut TelemetryReader<Attitude>) -> f64 {
        match attitude.read(self.heading_timeout).await {
            Ok(att) => {
                self.last_heading = Some(att.heading_deg());
                att.heading_deg()
            }
            Err(why) => {
                if let Some(last) = self.last_heading {
                    warn!("{why}, reusing last heading {last:.1}°.");
                    last
                } else {
                    warn!("{why} and no heading observed yet, DEGRADED: assuming 0°.");
                    0.0
                }
            }
        }
    }

    fn transition(&mut self, next: MissionState) {
        if !self.state.can_transition_to(next) {
            warn!("Unexpected mission transition {} -> {next}.", self.state);
        }
        event!("Mission state {} -> {next}", self.state);
        self.state = next;
    }

    fn finish(&mut self, exit: MissionExit) -> MissionExit {
        self.transition(exit.state());
        match &exit {
            MissionExit::Aborted => {
                warn!("Mission loop ABORTED on critical battery after {} waypoints.", self.waypoints);
            }
            MissionExit::Failed(e) => {
                error!("Mission loop FAILED after {} waypoints: {e}", self.waypoints);
            }
            MissionExit::Exhausted => {
                info!("Mission loop EXHAUSTED its waypoint feed after {} waypoints.", self.waypoints);
            }
            MissionExit::Cancelled => {
                info!("Mission loop cancelled after {} waypoints.", self.waypoints);
            }
        }
        exit
    }
}

/// Races `fut` against cancellation and the critical battery signal. Cancellation wins ties so a
/// cancelled loop never starts another command.
async fn interruptible<F: Future>(
    c_tok: &CancellationToken,
    status: &MissionStatus,
    fut: F,
) -> Result<F::Output, MissionExit> {
    tokio::select! {
        biased;
        () = c_tok.cancelled() => Err(MissionExit::Cancelled),
        () = status.critical_battery_signal() => Err(MissionExit::Aborted),
        out = fut => Ok(out),
    }
}
