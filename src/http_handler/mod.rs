//! REST bridge to the vehicle autopilot.

pub(crate) mod http_client;
pub(crate) mod http_request;
pub(crate) mod http_response;
mod http_vehicle;

pub use http_vehicle::HttpVehicleLink;
