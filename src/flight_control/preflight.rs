use crate::config::MissionConfig;
use crate::vehicle::{ActionError, MissionError, OffboardError, PositionNedYaw, VehicleLink};
use crate::{info, log, warn};
use std::{future::Future, time::Duration};
use tokio_util::sync::CancellationToken;

const ARM_PAUSE: Duration = Duration::from_secs(1);

/// How far the pre-flight sequence got before failing.
#[derive(Debug, Clone, PartialEq)]
pub enum PreflightError {
    /// Failed on the ground, nothing to undo.
    Grounded(ActionError),
    /// Failed after takeoff was commanded, the vehicle has to be brought down.
    Airborne(MissionError),
    /// Interrupted by the operator. `airborne` is set once takeoff was commanded.
    Interrupted { airborne: bool },
}

impl PreflightError {
    pub fn is_airborne(&self) -> bool {
        matches!(self, PreflightError::Airborne(_) | PreflightError::Interrupted { airborne: true })
    }
}

impl std::fmt::Display for PreflightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreflightError::Grounded(e) => write!(f, "pre-flight failed on the ground: {e}"),
            PreflightError::Airborne(e) => write!(f, "pre-flight failed while airborne: {e}"),
            PreflightError::Interrupted { airborne: true } => {
                write!(f, "pre-flight interrupted after takeoff was commanded")
            }
            PreflightError::Interrupted { airborne: false } => {
                write!(f, "pre-flight interrupted on the ground")
            }
        }
    }
}

impl std::error::Error for PreflightError {}

impl From<OffboardError> for PreflightError {
    fn from(value: OffboardError) -> Self { PreflightError::Airborne(value.into()) }
}

/// Brings a connected vehicle from the ground into offboard control at mission altitude.
///
/// Hold, arm, takeoff, settle, then an initial setpoint above the origin before offboard mode is
/// started, as offboard mode refuses to start without a setpoint. Every step races `interrupt`,
/// an interrupt stops the sequence before the next command goes out.
///
/// # Arguments
/// * `link` - The connected vehicle.
/// * `config` - Flight altitude and takeoff settle time.
/// * `interrupt` - Operator interrupt, installed before the first command.
///
/// # Returns
/// `Ok(())` once offboard control is active. On error, [`PreflightError::is_airborne`] tells
/// whether the caller has to bring the vehicle down.
pub async fn run_preflight(
    link: &dyn VehicleLink,
    config: &MissionConfig,
    interrupt: &CancellationToken,
) -> Result<(), PreflightError> {
    match guarded(interrupt, false, link.position()).await? {
        Ok(pose) => info!(
            "Initial position: north {:.2} m, east {:.2} m, heading {:.1}°.",
            pose.north_m(),
            pose.east_m(),
            pose.heading_deg()
        ),
        Err(e) => warn!("Initial position unavailable: {e}"),
    }

    guarded(interrupt, false, link.hold()).await?.map_err(PreflightError::Grounded)?;
    guarded(interrupt, false, tokio::time::sleep(ARM_PAUSE)).await?;
    log!("Arming.");
    guarded(interrupt, false, link.arm()).await?.map_err(PreflightError::Grounded)?;
    log!("Taking off.");
    // from here on an interrupt leaves a vehicle that may be climbing
    guarded(interrupt, true, link.takeoff())
        .await?
        .map_err(|e| PreflightError::Airborne(e.into()))?;
    guarded(interrupt, true, tokio::time::sleep(config.takeoff_settle)).await?;

    let initial = PositionNedYaw::at_altitude(0.0, 0.0, config.flight_altitude_m, 0.0);
    guarded(interrupt, true, link.send_position(initial)).await??;
    log!("Starting offboard control.");
    guarded(interrupt, true, link.start_offboard()).await??;
    info!("Offboard control active at {} m.", config.flight_altitude_m);
    Ok(())
}

async fn guarded<F: Future>(
    interrupt: &CancellationToken,
    airborne: bool,
    fut: F,
) -> Result<F::Output, PreflightError> {
    tokio::select! {
        biased;
        () = interrupt.cancelled() => {
            warn!("Pre-flight interrupted.");
            Err(PreflightError::Interrupted { airborne })
        }
        out = fut => Ok(out),
    }
}
