/// Response type for the /telemetry/attitude endpoint.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct AttitudeResponse {
    /// Yaw in degrees, clockwise from north. May be reported in (-180, 180].
    yaw_deg: f64,
}

impl AttitudeResponse {
    pub(crate) fn yaw_deg(&self) -> f64 { self.yaw_deg }
}

/// Response type for the /telemetry/battery endpoint.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct BatteryResponse {
    voltage_v: f64,
}

impl BatteryResponse {
    pub(crate) fn voltage_v(&self) -> f64 { self.voltage_v }
}

/// Response type for the /telemetry/position_ned endpoint.
#[derive(serde::Deserialize, Debug)]
pub(crate) struct PositionResponse {
    north_m: f64,
    east_m: f64,
}

impl PositionResponse {
    pub(crate) fn north_m(&self) -> f64 { self.north_m }
    pub(crate) fn east_m(&self) -> f64 { self.east_m }
}
