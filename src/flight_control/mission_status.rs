use super::{common::Vec2D, power::PowerState};
use crate::vehicle::MissionError;
use crate::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, watch};

/// Snapshot of the mission loop's progress, published after every accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MissionProgress {
    /// Number of position commands the vehicle accepted.
    pub waypoints: usize,
    /// Accumulated navigation-frame target (x = north, y = east).
    pub target: Vec2D<f64>,
    pub target_heading_deg: f64,
}

/// Mission state shared between the control loops and the supervisor.
///
/// Each field has exactly one writer:
/// - `critical_battery`: the power loop (latched, never cleared)
/// - `last_error`: whichever loop terminated with an error, then the supervisor
/// - `terminated`: the supervisor
/// - `power` / `progress`: the power loop and the mission loop respectively (status only)
pub struct MissionStatus {
    critical_battery: watch::Sender<bool>,
    last_error: RwLock<Option<MissionError>>,
    terminated: AtomicBool,
    power: watch::Sender<Option<PowerState>>,
    progress: watch::Sender<MissionProgress>,
}

impl MissionStatus {
    pub fn new() -> Self {
        Self {
            critical_battery: watch::Sender::new(false),
            last_error: RwLock::new(None),
            terminated: AtomicBool::new(false),
            power: watch::Sender::new(None),
            progress: watch::Sender::new(MissionProgress::default()),
        }
    }

    /// Latches the critical battery flag and wakes every waiter on
    /// [`critical_battery_signal`](Self::critical_battery_signal).
    ///
    /// # Returns
    /// `true` only for the call that set the flag, `false` if it was already latched.
    pub fn set_critical_battery(&self) -> bool {
        self.critical_battery.send_if_modified(|critical| {
            if *critical {
                false
            } else {
                *critical = true;
                true
            }
        })
    }

    pub fn is_critical_battery(&self) -> bool { *self.critical_battery.borrow() }

    /// Resolves once the critical battery flag is (or already was) set.
    pub async fn critical_battery_signal(&self) {
        let mut rx = self.critical_battery.subscribe();
        // the sender lives in `self`, so the channel cannot close while we wait
        if rx.wait_for(|critical| *critical).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Stores `err` unless an earlier error is already recorded.
    ///
    /// # Arguments
    /// * `err` - The error to record. A later error is logged and dropped, the first cause wins.
    pub async fn record_error(&self, err: MissionError) {
        let mut last = self.last_error.write().await;
        if let Some(prev) = last.as_ref() {
            warn!("Additional error after {prev}: {err}");
        } else {
            *last = Some(err);
        }
    }

    pub async fn last_error(&self) -> Option<MissionError> { self.last_error.read().await.clone() }

    pub(crate) fn mark_terminated(&self) { self.terminated.store(true, Ordering::Release); }

    pub fn is_terminated(&self) -> bool { self.terminated.load(Ordering::Acquire) }

    pub(crate) fn publish_power(&self, state: PowerState) { self.power.send_replace(Some(state)); }

    pub fn power(&self) -> Option<PowerState> { *self.power.borrow() }

    pub fn subscribe_power(&self) -> watch::Receiver<Option<PowerState>> { self.power.subscribe() }

    pub(crate) fn publish_progress(&self, progress: MissionProgress) { self.progress.send_replace(progress); }

    pub fn progress(&self) -> MissionProgress { *self.progress.borrow() }

    pub fn subscribe_progress(&self) -> watch::Receiver<MissionProgress> { self.progress.subscribe() }
}

impl Default for MissionStatus {
    fn default() -> Self { Self::new() }
}
