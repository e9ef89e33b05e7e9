use std::fmt;
use std::time::Duration;

/// Failure to establish the vehicle link. Fatal at startup and never retried by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// The link did not report a connection within the given time.
    Timeout(Duration),
    /// The transport could not reach the vehicle endpoint at all.
    Unreachable(String),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Timeout(dt) => {
                write!(f, "vehicle not connected after {:.1}s", dt.as_secs_f64())
            }
            ConnectionError::Unreachable(why) => write!(f, "vehicle unreachable: {why}"),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Failure of a discrete vehicle action (hold, arm, takeoff, land).
#[derive(Debug, Clone, PartialEq)]
pub enum ActionError {
    /// The vehicle answered but refused the action.
    Rejected { action: &'static str, reason: String },
    /// The action could not be delivered.
    LinkDown { action: &'static str, reason: String },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Rejected { action, reason } => write!(f, "{action} rejected: {reason}"),
            ActionError::LinkDown { action, reason } => {
                write!(f, "{action} not delivered: {reason}")
            }
        }
    }
}

impl std::error::Error for ActionError {}

/// Failure of an offboard-mode operation. Ends the mission loop when it hits a position command.
#[derive(Debug, Clone, PartialEq)]
pub enum OffboardError {
    /// The vehicle refused the command or the mode switch.
    Rejected(String),
    /// The command could not be delivered.
    LinkDown(String),
}

impl fmt::Display for OffboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffboardError::Rejected(why) => write!(f, "offboard command rejected: {why}"),
            OffboardError::LinkDown(why) => write!(f, "offboard link down: {why}"),
        }
    }
}

impl std::error::Error for OffboardError {}

/// Telemetry problems. These are absorbed locally with degraded-mode fallbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryError {
    Timeout(Duration),
    Unavailable(String),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Timeout(dt) => {
                write!(f, "no telemetry within {}ms", dt.as_millis())
            }
            TelemetryError::Unavailable(why) => write!(f, "telemetry unavailable: {why}"),
        }
    }
}

impl std::error::Error for TelemetryError {}

/// Everything that can end a mission run with an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MissionError {
    Connection(ConnectionError),
    Action(ActionError),
    Offboard(OffboardError),
    Telemetry(TelemetryError),
    /// A control loop did not acknowledge cancellation within its grace period.
    StopTimeout(&'static str),
    /// A control loop task panicked or was aborted.
    Panicked(&'static str),
}

impl MissionError {
    /// Fatal errors force the emergency abort path.
    pub fn is_fatal(&self) -> bool { !matches!(self, MissionError::Telemetry(TelemetryError::Timeout(_))) }
}

impl fmt::Display for MissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionError::Connection(e) => write!(f, "connection error: {e}"),
            MissionError::Action(e) => write!(f, "action error: {e}"),
            MissionError::Offboard(e) => write!(f, "offboard error: {e}"),
            MissionError::Telemetry(e) => write!(f, "telemetry error: {e}"),
            MissionError::StopTimeout(unit) => {
                write!(f, "{unit} did not stop within its grace period")
            }
            MissionError::Panicked(unit) => write!(f, "{unit} terminated abnormally"),
        }
    }
}

impl std::error::Error for MissionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MissionError::Connection(e) => Some(e),
            MissionError::Action(e) => Some(e),
            MissionError::Offboard(e) => Some(e),
            MissionError::Telemetry(e) => Some(e),
            MissionError::StopTimeout(_) | MissionError::Panicked(_) => None,
        }
    }
}

impl From<ConnectionError> for MissionError {
    fn from(value: ConnectionError) -> Self { MissionError::Connection(value) }
}

impl From<ActionError> for MissionError {
    fn from(value: ActionError) -> Self { MissionError::Action(value) }
}

impl From<OffboardError> for MissionError {
    fn from(value: OffboardError) -> Self { MissionError::Offboard(value) }
}

impl From<TelemetryError> for MissionError {
    fn from(value: TelemetryError) -> Self { MissionError::Telemetry(value) }
}
