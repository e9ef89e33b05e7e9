use super::request_common::{HTTPRequestMethod, HTTPRequestType};
use super::telemetry::{AttitudeResponse, BatteryResponse, PositionResponse};

/// Request type for the /telemetry/attitude endpoint.
#[derive(Debug)]
pub(crate) struct AttitudeRequest {}

impl HTTPRequestType for AttitudeRequest {
    type Response = AttitudeResponse;
    type Body = ();
    fn endpoint(&self) -> &'static str { "/telemetry/attitude" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
}

/// Request type for the /telemetry/battery endpoint.
#[derive(Debug)]
pub(crate) struct BatteryRequest {}

impl HTTPRequestType for BatteryRequest {
    type Response = BatteryResponse;
    type Body = ();
    fn endpoint(&self) -> &'static str { "/telemetry/battery" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
}

/// Request type for the /telemetry/position_ned endpoint.
#[derive(Debug)]
pub(crate) struct PositionRequest {}

impl HTTPRequestType for PositionRequest {
    type Response = PositionResponse;
    type Body = ();
    fn endpoint(&self) -> &'static str { "/telemetry/position_ned" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
}
