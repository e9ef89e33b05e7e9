use crate::vehicle::VehicleLink;
use crate::{error, info, warn};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// What a call to [`EmergencyAbort::trigger`] actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortOutcome {
    /// This call ran the sequence. Each flag tells whether that sub-step succeeded.
    Executed { offboard_stopped: bool, landed: bool },
    /// An earlier call already ran the sequence, nothing was sent.
    AlreadyTriggered,
}

impl AbortOutcome {
    pub fn executed(&self) -> bool { matches!(self, AbortOutcome::Executed { .. }) }
}

/// Stop-offboard then land, at most once per mission.
pub struct EmergencyAbort {
    link: Arc<dyn VehicleLink>,
    triggered: AtomicBool,
}

impl EmergencyAbort {
    pub fn new(link: Arc<dyn VehicleLink>) -> Self { Self { link, triggered: AtomicBool::new(false) } }

    pub fn is_triggered(&self) -> bool { self.triggered.load(Ordering::Acquire) }

    /// Runs the abort sequence unless it already ran. A failing sub-step is logged and never
    /// keeps the next one from being attempted.
    ///
    /// # Arguments
    /// * `reason` - Logged with the abort.
    ///
    /// # Returns
    /// [`AbortOutcome::Executed`] with the per-step results for the one call that ran the
    /// sequence, [`AbortOutcome::AlreadyTriggered`] for every other call.
    pub async fn trigger(&self, reason: &str) -> AbortOutcome {
        if self.triggered.swap(true, Ordering::AcqRel) {
            warn!("Emergency abort requested again ({reason}), already executed.");
            return AbortOutcome::AlreadyTriggered;
        }
        error!("EMERGENCY ABORT: {reason}");

        let offboard_stopped = match self.link.stop_offboard().await {
            Ok(()) => {
                info!("Offboard control stopped.");
                true
            }
            Err(e) => {
                error!("Stopping offboard control failed: {e}. Landing anyway.");
                false
            }
        };
        let landed = match self.link.land().await {
            Ok(()) => {
                info!("Land command accepted.");
                true
            }
            Err(e) => {
                error!("Land command failed: {e}");
                false
            }
        };
        AbortOutcome::Executed { offboard_stopped, landed }
    }
}
