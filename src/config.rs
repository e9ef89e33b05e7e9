//! Mission configuration.
//!
//! Every tunable has a compiled-in default that can be overridden through an environment variable
//! named after its [`ConfigKey`].

use crate::{info, warn};
use std::{env, fmt, ops::RangeInclusive, str::FromStr, time::Duration};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigKey {
    VehicleBaseUrl,
    FlightAltitude,
    DataRate,
    CommandInterval,
    BatteryPollInterval,
    CriticalBatteryPercent,
    BatteryCapacityAh,
    BatteryNominalVoltage,
    DrawCurrentA,
    HeadingTimeoutMs,
    StopGraceMs,
    ConnectionTimeout,
    TakeoffSettle,
    StatusInterval,
    MaxWaypoints,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositive(ConfigKey),
    OutOfRange { key: ConfigKey, value: f64 },
    EmptyRange(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositive(key) => write!(f, "{key} must be strictly positive"),
            ConfigError::OutOfRange { key, value } => write!(f, "{key}={value} is out of range"),
            ConfigError::EmptyRange(name) => write!(f, "{name} range is empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct MissionConfig {
    pub vehicle_url: String,
    pub flight_altitude_m: f64,
    /// Period at which the waypoint generator produces targets.
    pub data_rate: Duration,
    /// Wait after each successful position command.
    pub command_interval: Duration,
    pub battery_poll_interval: Duration,
    pub critical_battery_percent: f64,
    pub battery_capacity_ah: f64,
    pub battery_nominal_voltage_v: f64,
    pub draw_current_a: f64,
    pub heading_timeout: Duration,
    pub stop_grace: Duration,
    pub connection_timeout: Duration,
    pub takeoff_settle: Duration,
    pub status_interval: Duration,
    pub max_waypoints: Option<usize>,
    pub dx_range: RangeInclusive<f64>,
    pub dy_range: RangeInclusive<f64>,
}

impl MissionConfig {
    const DEF_VEHICLE_URL: &'static str = "http://localhost:8080";
    const DEF_ALTITUDE_M: f64 = 20.0;
    const DEF_DATA_RATE: Duration = Duration::from_millis(500);
    const DEF_COMMAND_INTERVAL: Duration = Duration::from_secs(3);
    const DEF_BATTERY_POLL: Duration = Duration::from_secs(1);
    const DEF_CRITICAL_PERCENT: f64 = 15.0;
    const DEF_CAPACITY_AH: f64 = 16.0;
    const DEF_NOMINAL_V: f64 = 22.2;
    const DEF_DRAW_CURRENT_A: f64 = 70.0;
    const DEF_HEADING_TIMEOUT: Duration = Duration::from_millis(500);
    const DEF_STOP_GRACE: Duration = Duration::from_secs(2);
    const DEF_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
    const DEF_TAKEOFF_SETTLE: Duration = Duration::from_secs(5);
    const DEF_STATUS_INTERVAL: Duration = Duration::from_secs(2);
    const DEF_DX_RANGE: RangeInclusive<f64> = 1.5..=2.5;
    const DEF_DY_RANGE: RangeInclusive<f64> = -1.5..=1.5;

    /// Builds the configuration from defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key.to_string()).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(ConfigKey) -> Option<String> {
        let def = Self::default();
        let cfg = Self {
            vehicle_url: lookup(ConfigKey::VehicleBaseUrl).unwrap_or(def.vehicle_url),
            flight_altitude_m: parse_or(&lookup, ConfigKey::FlightAltitude, def.flight_altitude_m),
            data_rate: parse_secs(&lookup, ConfigKey::DataRate, def.data_rate)?,
            command_interval: parse_secs(&lookup, ConfigKey::CommandInterval, def.command_interval)?,
            battery_poll_interval: parse_secs(
                &lookup,
                ConfigKey::BatteryPollInterval,
                def.battery_poll_interval,
            )?,
            critical_battery_percent: parse_or(
                &lookup,
                ConfigKey::CriticalBatteryPercent,
                def.critical_battery_percent,
            ),
            battery_capacity_ah: parse_or(&lookup, ConfigKey::BatteryCapacityAh, def.battery_capacity_ah),
            battery_nominal_voltage_v: parse_or(
                &lookup,
                ConfigKey::BatteryNominalVoltage,
                def.battery_nominal_voltage_v,
            ),
            draw_current_a: parse_or(&lookup, ConfigKey::DrawCurrentA, def.draw_current_a),
            heading_timeout: parse_millis(&lookup, ConfigKey::HeadingTimeoutMs, def.heading_timeout),
            stop_grace: parse_millis(&lookup, ConfigKey::StopGraceMs, def.stop_grace),
            connection_timeout: parse_secs(&lookup, ConfigKey::ConnectionTimeout, def.connection_timeout)?,
            takeoff_settle: parse_secs(&lookup, ConfigKey::TakeoffSettle, def.takeoff_settle)?,
            status_interval: parse_secs(&lookup, ConfigKey::StatusInterval, def.status_interval)?,
            max_waypoints: lookup(ConfigKey::MaxWaypoints).and_then(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .inspect_err(|_| {
                        warn!("Ignoring {}={raw:?}, running without waypoint cap.", ConfigKey::MaxWaypoints);
                    })
                    .ok()
            }),
            dx_range: def.dx_range,
            dy_range: def.dy_range,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks value ranges that would make the control loops meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive_f = [
            (ConfigKey::FlightAltitude, self.flight_altitude_m),
            (ConfigKey::BatteryCapacityAh, self.battery_capacity_ah),
            (ConfigKey::BatteryNominalVoltage, self.battery_nominal_voltage_v),
            (ConfigKey::DrawCurrentA, self.draw_current_a),
        ];
        for (key, val) in positive_f {
            if !(val > 0.0) {
                return Err(ConfigError::NonPositive(key));
            }
        }
        let positive_d = [
            (ConfigKey::DataRate, self.data_rate),
            (ConfigKey::CommandInterval, self.command_interval),
            (ConfigKey::BatteryPollInterval, self.battery_poll_interval),
            (ConfigKey::HeadingTimeoutMs, self.heading_timeout),
            (ConfigKey::StopGraceMs, self.stop_grace),
            (ConfigKey::ConnectionTimeout, self.connection_timeout),
            (ConfigKey::StatusInterval, self.status_interval),
        ];
        if let Some((key, _)) = positive_d.iter().find(|(_, d)| d.is_zero()) {
            return Err(ConfigError::NonPositive(*key));
        }
        if !(0.0..=100.0).contains(&self.critical_battery_percent) {
            return Err(ConfigError::OutOfRange {
                key: ConfigKey::CriticalBatteryPercent,
                value: self.critical_battery_percent,
            });
        }
        if self.dx_range.is_empty() {
            return Err(ConfigError::EmptyRange("dx"));
        }
        if self.dy_range.is_empty() {
            return Err(ConfigError::EmptyRange("dy"));
        }
        Ok(())
    }

    /// Total usable battery energy in joules.
    pub fn battery_capacity_j(&self) -> f64 {
        self.battery_capacity_ah * self.battery_nominal_voltage_v * 3600.0
    }

    fn value_of(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::VehicleBaseUrl => self.vehicle_url.clone(),
            ConfigKey::FlightAltitude => format!("{} m", self.flight_altitude_m),
            ConfigKey::DataRate => format!("{:?}", self.data_rate),
            ConfigKey::CommandInterval => format!("{:?}", self.command_interval),
            ConfigKey::BatteryPollInterval => format!("{:?}", self.battery_poll_interval),
            ConfigKey::CriticalBatteryPercent => format!("{}%", self.critical_battery_percent),
            ConfigKey::BatteryCapacityAh => format!("{} Ah", self.battery_capacity_ah),
            ConfigKey::BatteryNominalVoltage => format!("{} V", self.battery_nominal_voltage_v),
            ConfigKey::DrawCurrentA => format!("{} A", self.draw_current_a),
            ConfigKey::HeadingTimeoutMs => format!("{:?}", self.heading_timeout),
            ConfigKey::StopGraceMs => format!("{:?}", self.stop_grace),
            ConfigKey::ConnectionTimeout => format!("{:?}", self.connection_timeout),
            ConfigKey::TakeoffSettle => format!("{:?}", self.takeoff_settle),
            ConfigKey::StatusInterval => format!("{:?}", self.status_interval),
            ConfigKey::MaxWaypoints => {
                self.max_waypoints.map_or(String::from("unbounded"), |n| n.to_string())
            }
        }
    }

    /// Prints the effective configuration, one key per line.
    pub fn log_effective(&self) {
        info!("Effective mission configuration:");
        for key in ConfigKey::iter() {
            info!("  {key:<26} {}", self.value_of(key));
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            vehicle_url: String::from(Self::DEF_VEHICLE_URL),
            flight_altitude_m: Self::DEF_ALTITUDE_M,
            data_rate: Self::DEF_DATA_RATE,
            command_interval: Self::DEF_COMMAND_INTERVAL,
            battery_poll_interval: Self::DEF_BATTERY_POLL,
            critical_battery_percent: Self::DEF_CRITICAL_PERCENT,
            battery_capacity_ah: Self::DEF_CAPACITY_AH,
            battery_nominal_voltage_v: Self::DEF_NOMINAL_V,
            draw_current_a: Self::DEF_DRAW_CURRENT_A,
            heading_timeout: Self::DEF_HEADING_TIMEOUT,
            stop_grace: Self::DEF_STOP_GRACE,
            connection_timeout: Self::DEF_CONNECTION_TIMEOUT,
            takeoff_settle: Self::DEF_TAKEOFF_SETTLE,
            status_interval: Self::DEF_STATUS_INTERVAL,
            max_waypoints: None,
            dx_range: Self::DEF_DX_RANGE,
            dy_range: Self::DEF_DY_RANGE,
        }
    }
}

/// Parses `key` from `lookup`, falling back to `default` when the key is missing or unparsable.
fn parse_or<F, T>(lookup: &F, key: ConfigKey, default: T) -> T
where
    F: Fn(ConfigKey) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else { return default };
    raw.trim().parse::<T>().unwrap_or_else(|_| {
        warn!("Ignoring unparsable {key}={raw:?}, keeping default.");
        default
    })
}

/// Parses a duration given in (fractional) seconds. Non-positive values are rejected here since
/// they cannot be represented as a `Duration`.
fn parse_secs<F>(lookup: &F, key: ConfigKey, default: Duration) -> Result<Duration, ConfigError>
where F: Fn(ConfigKey) -> Option<String> {
    let secs = parse_or(lookup, key, default.as_secs_f64());
    if !(secs > 0.0) {
        return Err(ConfigError::NonPositive(key));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::OutOfRange { key, value: secs })
}

fn parse_millis<F>(lookup: &F, key: ConfigKey, default: Duration) -> Duration
where F: Fn(ConfigKey) -> Option<String> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(parse_or(lookup, key, default_ms))
}
