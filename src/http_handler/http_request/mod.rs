use super::http_response::{command_result, connection, telemetry};

pub mod action_post;
pub mod connection_get;
pub mod offboard_post;
pub mod position_ned_put;
pub mod request_common;
pub mod telemetry_get;
