use super::command_result::CommandResultResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType};

/// Request type for the /offboard/start and /offboard/stop endpoints.
#[derive(Debug)]
pub(crate) struct OffboardModeRequest {
    /// `true` enters offboard mode, `false` leaves it.
    pub(crate) start: bool,
}

impl HTTPRequestType for OffboardModeRequest {
    type Response = CommandResultResponse;
    type Body = ();
    fn endpoint(&self) -> &'static str {
        if self.start { "/offboard/start" } else { "/offboard/stop" }
    }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Post }
}
