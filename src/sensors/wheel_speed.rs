//! Wheel-speed pickup.
//!
//! A hall or VR pickup on the wheel produces `pulses_per_revolution`
//! edges per turn.  The timer input-capture ISR forwards each captured
//! timestamp to [`WheelSpeed::on_pulse`]; the slow tick publishes the
//! timer's rate as vehicle speed until the pickup goes quiet.

use crate::config::WheelSpeedConfig;

use super::pulse::PulseTimer;

/// Vehicle speed derived from the wheel pickup period.
pub struct WheelSpeed {
    timer: PulseTimer,
}

impl Default for WheelSpeed {
    fn default() -> Self {
        Self::new()
    }
}

impl WheelSpeed {
    /// Scaled for the default 1.9 m tire with one pulse per revolution.
    pub const fn new() -> Self {
        // 1.9 m × 3.6 (m/s → km/h)
        Self {
            timer: PulseTimer::new(1.9 * 3.6),
        }
    }

    /// Clear the last edge and speed.  Edge interrupt must be masked.
    pub fn init_no_configuration(&self) {
        self.timer.reset();
    }

    pub fn on_configuration_change(&self, config: &WheelSpeedConfig) {
        self.timer.set_units_per_edge(config.kph_per_hz());
        log::info!(
            "WheelSpeed: circumference {:.3} m, {} pulse(s)/rev",
            config.tire_circumference_m,
            config.pulses_per_revolution
        );
    }

    /// ISR entry point: one captured edge.
    #[inline]
    pub fn on_pulse(&self, timestamp_us: u32) {
        self.timer.on_edge(timestamp_us);
    }

    /// Latest speed in km/h, `0.0` until two edges were captured.
    pub fn speed_kph(&self) -> f32 {
        self.timer.latest_rate()
    }

    /// Underlying timer, for wiring directly into an ISR.
    pub fn timer(&self) -> &PulseTimer {
        &self.timer
    }
}
