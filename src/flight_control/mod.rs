pub(crate) mod common;
mod emergency;
mod mission_loop;
mod mission_state;
mod mission_status;
pub(crate) mod power;
mod preflight;
mod status_report;
mod supervisor;
#[cfg(test)]
mod tests;
mod waypoint_generator;

pub use emergency::{AbortOutcome, EmergencyAbort};
pub use mission_loop::{MissionExit, MissionLoop};
pub use mission_state::MissionState;
pub use mission_status::{MissionProgress, MissionStatus};
pub use preflight::run_preflight;
pub use status_report::StatusReporter;
pub use supervisor::MissionSupervisor;
pub use waypoint_generator::{WaypointFeed, WaypointGenerator};
