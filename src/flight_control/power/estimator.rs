use crate::config::MissionConfig;
use std::time::Duration;

/// Energy bookkeeping derived from the latest voltage sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerState {
    energy_remaining_j: f64,
    percent_remaining: f64,
    instantaneous_power_w: f64,
    est_minutes_remaining: f64,
}

impl PowerState {
    pub fn energy_remaining_j(&self) -> f64 { self.energy_remaining_j }
    pub fn percent_remaining(&self) -> f64 { self.percent_remaining }
    pub fn instantaneous_power_w(&self) -> f64 { self.instantaneous_power_w }
    /// Only meaningful when [`Self::instantaneous_power_w`] is positive, zero otherwise.
    pub fn est_minutes_remaining(&self) -> f64 { self.est_minutes_remaining }
}

/// Outcome of feeding one voltage sample into the [`PowerEstimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUpdate {
    pub state: PowerState,
    /// The sample produced non-positive power and was reported as zero.
    pub glitch: bool,
    /// This very sample moved the estimator into the critical range.
    pub crossed_critical: bool,
}

/// Coulomb-counting style estimator with an explicit time basis.
///
/// Each valid sample drains `voltage * draw_current * sample_interval` joules from the
/// remaining energy. The critical flag latches: once set it stays set even if a later sample
/// computes a higher percentage.
#[derive(Debug, Clone)]
pub struct PowerEstimator {
    capacity_j: f64,
    draw_current_a: f64,
    sample_dt_s: f64,
    critical_percent: f64,
    energy_j: f64,
    critical: bool,
}

impl PowerEstimator {
    pub fn new(
        capacity_j: f64,
        draw_current_a: f64,
        sample_interval: Duration,
        critical_percent: f64,
    ) -> Self {
        Self {
            capacity_j,
            draw_current_a,
            sample_dt_s: sample_interval.as_secs_f64(),
            critical_percent,
            energy_j: capacity_j,
            critical: false,
        }
    }

    pub fn from_config(config: &MissionConfig) -> Self {
        Self::new(
            config.battery_capacity_j(),
            config.draw_current_a,
            config.battery_poll_interval,
            config.critical_battery_percent,
        )
    }

    pub fn energy_remaining_j(&self) -> f64 { self.energy_j }

    pub fn is_critical(&self) -> bool { self.critical }

    fn percent(&self) -> f64 { (100.0 * self.energy_j / self.capacity_j).clamp(0.0, 100.0) }

    /// Feeds one voltage sample.
    ///
    /// A valid sample drains `power × sample interval` joules. Non-positive or non-finite power
    /// is a glitch: energy is left untouched and 0% and 0 minutes are reported for it.
    ///
    /// # Arguments
    /// * `voltage_v` - Measured battery voltage.
    ///
    /// # Returns
    /// The derived [`PowerState`] and whether this sample was a glitch or crossed the critical
    /// threshold for the first time.
    pub fn update(&mut self, voltage_v: f64) -> PowerUpdate {
        let power_w = voltage_v * self.draw_current_a;
        if !(power_w > 0.0 && power_w.is_finite()) {
            return PowerUpdate {
                state: PowerState {
                    energy_remaining_j: self.energy_j,
                    percent_remaining: 0.0,
                    instantaneous_power_w: if power_w.is_finite() { power_w } else { 0.0 },
                    est_minutes_remaining: 0.0,
                },
                glitch: true,
                crossed_critical: false,
            };
        }
        self.energy_j = (self.energy_j - power_w * self.sample_dt_s).max(0.0);
        let percent = self.percent();
        let crossed_critical = !self.critical && percent <= self.critical_percent;
        self.critical |= crossed_critical;
        PowerUpdate {
            state: PowerState {
                energy_remaining_j: self.energy_j,
                percent_remaining: percent,
                instantaneous_power_w: power_w,
                est_minutes_remaining: self.energy_j / power_w / 60.0,
            },
            glitch: false,
            crossed_critical,
        }
    }
}
