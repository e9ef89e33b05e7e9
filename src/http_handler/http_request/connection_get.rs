use super::connection::ConnectionResponse;
use super::request_common::{HTTPRequestMethod, HTTPRequestType};

/// Request type for the /connection endpoint.
#[derive(Debug)]
pub(crate) struct ConnectionRequest {}

impl HTTPRequestType for ConnectionRequest {
    type Response = ConnectionResponse;
    type Body = ();
    fn endpoint(&self) -> &'static str { "/connection" }
    fn request_method(&self) -> HTTPRequestMethod { HTTPRequestMethod::Get }
}
