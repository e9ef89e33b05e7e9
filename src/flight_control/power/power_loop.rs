use super::estimator::{PowerEstimator, PowerUpdate};
use crate::flight_control::MissionStatus;
use crate::vehicle::{BatterySample, MissionError, TelemetryError, TelemetryReader, VehicleLink};
use crate::{error, event, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Counters kept by the power loop over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerStats {
    pub samples: usize,
    /// Samples with non-positive power, reported as zero.
    pub glitches: usize,
    /// Poll ticks without any sample.
    pub timeouts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerExit {
    /// Stopped by the supervisor.
    Cancelled(PowerStats),
    /// The battery telemetry stream ended. Fatal: reserves can no longer be tracked.
    TelemetryLost(PowerStats),
}

impl PowerExit {
    pub fn stats(&self) -> PowerStats {
        match self {
            PowerExit::Cancelled(stats) | PowerExit::TelemetryLost(stats) => *stats,
        }
    }
}

/// Polls battery telemetry at a fixed cadence and feeds the [`PowerEstimator`].
pub struct PowerLoop {
    link: Arc<dyn VehicleLink>,
    status: Arc<MissionStatus>,
    estimator: PowerEstimator,
    poll_interval: Duration,
    stats: PowerStats,
}

impl PowerLoop {
    pub fn new(
        link: Arc<dyn VehicleLink>,
        status: Arc<MissionStatus>,
        estimator: PowerEstimator,
        poll_interval: Duration,
    ) -> Self {
        Self { link, status, estimator, poll_interval, stats: PowerStats::default() }
    }

    /// Polls one battery sample per tick until cancelled or the battery stream ends.
    ///
    /// A poll without a reply within the interval is counted and skipped, the late reply is
    /// discarded. The critical flag in [`MissionStatus`] is raised at most once.
    ///
    /// # Arguments
    /// * `c_tok` - Cancellation from the supervisor.
    ///
    /// # Returns
    /// * `PowerExit::Cancelled` - Stopped through `c_tok`.
    /// * `PowerExit::TelemetryLost` - The stream ended, the error is recorded in the status.
    pub async fn run(mut self, c_tok: CancellationToken) -> PowerExit {
        let link = Arc::clone(&self.link);
        let mut battery = TelemetryReader::new(move || link.battery_stream());
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Power monitor started, polling every {:?}.", self.poll_interval);
        loop {
            tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let sample = tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                res = battery.read(self.poll_interval) => res,
            };
            match sample {
                Ok(sample) => self.ingest(sample),
                Err(TelemetryError::Unavailable(_)) => {
                    error!("Battery telemetry stream closed, reserves can no longer be tracked!");
                    let err = TelemetryError::Unavailable(String::from("battery stream closed"));
                    self.status.record_error(MissionError::Telemetry(err)).await;
                    return PowerExit::TelemetryLost(self.stats);
                }
                Err(TelemetryError::Timeout(_)) => {
                    self.stats.timeouts += 1;
                    warn!(
                        "No battery sample within {}ms, skipping this poll.",
                        self.poll_interval.as_millis()
                    );
                }
            }
        }
        info!(
            "Power monitor stopped after {} samples ({} glitches).",
            self.stats.samples, self.stats.glitches
        );
        PowerExit::Cancelled(self.stats)
    }

    fn ingest(&mut self, sample: BatterySample) {
        self.stats.samples += 1;
        let PowerUpdate { state, glitch, crossed_critical } = self.estimator.update(sample.voltage_v());
        if glitch {
            self.stats.glitches += 1;
            warn!(
                "Non-positive battery power ({:.2} W at {:.2} V), reporting 0% for this sample.",
                state.instantaneous_power_w(),
                sample.voltage_v()
            );
        } else {
            event!(
                "Battery: {:.2} V, {:.1} W, {:.1}%, {:.1} min left",
                sample.voltage_v(),
                state.instantaneous_power_w(),
                state.percent_remaining(),
                state.est_minutes_remaining()
            );
        }
        self.status.publish_power(state);
        if crossed_critical && self.status.set_critical_battery() {
            error!(
                "CRITICAL BATTERY: {:.1}% remaining, mission abort requested!",
                state.percent_remaining()
            );
        }
    }
}
