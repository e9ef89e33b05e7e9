use super::command_result::CommandResultResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType};
use strum_macros::IntoStaticStr;

/// Discrete flight actions exposed under /action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum VehicleAction {
    Hold,
    Arm,
    Takeoff,
    Land,
}

impl VehicleAction {
    /// Action name as reported in [`crate::vehicle::ActionError`].
    pub(crate) fn name(self) -> &'static str { self.into() }
}

/// Request type for the /action/{hold,arm,takeoff,land} endpoints.
#[derive(Debug)]
pub(crate) struct ActionRequest {
    pub(crate) action: VehicleAction,
}

impl HTTPRequestType for ActionRequest {
    type Response = CommandResultResponse;
    type Body = ();
    fn endpoint(&self) -> &'static str {
        match self.action {
            VehicleAction::Hold => "/action/hold",
            VehicleAction::Arm => "/action/arm",
            VehicleAction::Takeoff => "/action/takeoff",
            VehicleAction::Land => "/action/land",
        }
    }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
