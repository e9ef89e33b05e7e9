pub mod command_result;
pub mod connection;
pub mod response_common;
pub mod telemetry;
