use super::command_result::CommandResultResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType};
use crate::vehicle::PositionNedYaw;

/// Request type for the /offboard/position_ned endpoint.
#[derive(serde::Serialize, Debug)]
pub(crate) struct PositionNedRequest {
    /// Target north offset from the origin in meters.
    pub(crate) north_m: f64,
    /// Target east offset from the origin in meters.
    pub(crate) east_m: f64,
    /// Target down offset, negative above the origin.
    pub(crate) down_m: f64,
    /// Target yaw in degrees, clockwise from north.
    pub(crate) yaw_deg: f64,
}

impl From<PositionNedYaw> for PositionNedRequest {
    fn from(value: PositionNedYaw) -> Self {
        Self { north_m: value.north_m, east_m: value.east_m, down_m: value.down_m, yaw_deg: value.yaw_deg }
    }
}

impl HTTPRequestType for PositionNedRequest {
    type Response = CommandResultResponse;
    type Body = PositionNedRequest;
    fn endpoint(&self) -> &'static str { "/offboard/position_ned" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Put }
    fn body(&self) -> Option<&Self::Body> { Some(self) }
}
