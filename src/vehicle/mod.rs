//! The narrow interface through which the mission core talks to the vehicle.
//!
//! Everything behind [`VehicleLink`] (transport, autopilot, telemetry plumbing) is a black box
//! to the control loops. The binary wires in [`crate::http_handler::HttpVehicleLink`], tests use
//! the scripted mock.

mod error;
#[cfg(test)]
pub(crate) mod mock;
mod telemetry;

pub use error::{ActionError, ConnectionError, MissionError, OffboardError, TelemetryError};
pub use telemetry::TelemetryReader;

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Latest attitude sample. Only the heading is consumed by the core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    heading_deg: f64,
}

impl Attitude {
    /// Creates an attitude sample, normalizing the heading into `[0, 360)`.
    pub fn new(heading_deg: f64) -> Self { Self { heading_deg: heading_deg.rem_euclid(360.0) } }
    pub fn heading_deg(&self) -> f64 { self.heading_deg }
}

/// A single battery telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatterySample {
    voltage_v: f64,
}

impl BatterySample {
    pub fn new(voltage_v: f64) -> Self { Self { voltage_v } }
    pub fn voltage_v(&self) -> f64 { self.voltage_v }
}

/// Vehicle pose in the navigation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    north_m: f64,
    east_m: f64,
    heading_deg: f64,
}

impl Pose {
    pub fn new(north_m: f64, east_m: f64, heading_deg: f64) -> Self {
        Self { north_m, east_m, heading_deg: heading_deg.rem_euclid(360.0) }
    }
    pub fn north_m(&self) -> f64 { self.north_m }
    pub fn east_m(&self) -> f64 { self.east_m }
    pub fn heading_deg(&self) -> f64 { self.heading_deg }
}

/// Offboard position setpoint in the north/east/down frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionNedYaw {
    pub north_m: f64,
    pub east_m: f64,
    pub down_m: f64,
    pub yaw_deg: f64,
}

impl PositionNedYaw {
    /// Builds a setpoint holding `altitude_m` above the origin (down is negative altitude).
    pub fn at_altitude(north_m: f64, east_m: f64, altitude_m: f64, yaw_deg: f64) -> Self {
        Self { north_m, east_m, down_m: -altitude_m, yaw_deg }
    }
}

/// Black-box vehicle services used by the mission core.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call from multiple tasks.
/// Telemetry streams are infinite and lazy: each item is the latest value at the time it is
/// polled, never a buffered historical one. Consumers read them through [`TelemetryReader`] so a
/// timed-out request is never resumed later.
#[async_trait]
pub trait VehicleLink: Send + Sync {
    async fn hold(&self) -> Result<(), ActionError>;
    async fn arm(&self) -> Result<(), ActionError>;
    async fn takeoff(&self) -> Result<(), ActionError>;
    async fn land(&self) -> Result<(), ActionError>;
    async fn start_offboard(&self) -> Result<(), OffboardError>;
    async fn stop_offboard(&self) -> Result<(), OffboardError>;
    async fn send_position(&self, setpoint: PositionNedYaw) -> Result<(), OffboardError>;
    async fn position(&self) -> Result<Pose, TelemetryError>;
    fn attitude_stream(&self) -> BoxStream<'static, Attitude>;
    fn battery_stream(&self) -> BoxStream<'static, BatterySample>;
}
