use super::MissionStatus;
use crate::status;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Periodically prints the latest power state and mission progress until the mission terminates.
pub struct StatusReporter {
    status: Arc<MissionStatus>,
    period: Duration,
}

impl StatusReporter {
    pub fn new(status: Arc<MissionStatus>, period: Duration) -> Self { Self { status, period } }

    pub fn spawn(self) -> JoinHandle<usize> { tokio::spawn(self.run()) }

    /// Prints one status line per period until the status is marked terminated.
    ///
    /// # Returns
    /// The number of lines printed.
    pub async fn run(self) -> usize {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut power_rx = self.status.subscribe_power();
        let mut progress_rx = self.status.subscribe_progress();
        let mut printed = 0;
        loop {
            ticker.tick().await;
            if self.status.is_terminated() {
                break;
            }
            let power = *power_rx.borrow_and_update();
            let progress = *progress_rx.borrow_and_update();
            let battery = power.map_or_else(
                || String::from("battery: n/a"),
                |p| {
                    format!(
                        "battery: {:.1}% ({:.1} min, {:.0} W)",
                        p.percent_remaining(),
                        p.est_minutes_remaining(),
                        p.instantaneous_power_w()
                    )
                },
            );
            let critical = if self.status.is_critical_battery() { " CRITICAL" } else { "" };
            status!(
                "{battery}{critical} | waypoints: {} | target: {:.2} @ {:.1}°",
                progress.waypoints,
                progress.target,
                progress.target_heading_deg
            );
            printed += 1;
        }
        printed
    }
}
