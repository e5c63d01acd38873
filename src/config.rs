//! Module configuration parameters.
//!
//! Every tunable the engine modules read.  A snapshot is delivered by the
//! configuration collaborator on each configuration-change event and is
//! applied wholesale; modules never see a half-updated set of values.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a backfire trigger does while an override is already in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerPolicy {
    /// Keep the original deadline; restoration is never deferred.
    #[default]
    Ignore,
    /// Push the deadline out to `now + hold` when that is later.
    Extend,
}

/// Backfire IACV guard parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Master enable.  A disabled guard refuses every trigger.
    pub enabled: bool,
    /// Highest throttle position (%) at which the valve may be closed.
    pub tps_threshold: f32,
    /// Re-arm band above `tps_threshold` (%).  Validated and carried but
    /// not consulted when deciding whether to close.
    pub tps_hysteresis: f32,
    /// Engine speed (rpm) below which the guard never acts.
    pub min_rpm: u16,
    /// Upper bound on any hold interval (ms).
    pub max_hold_ms: u16,
    /// Behaviour of a trigger that arrives during an override.
    pub retrigger: RetriggerPolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tps_threshold: 12.0,
            tps_hysteresis: 6.0,
            min_rpm: 800,
            max_hold_ms: 1000,
            retrigger: RetriggerPolicy::Ignore,
        }
    }
}

impl GuardConfig {
    /// Throttle position the hysteresis band ends at.
    pub fn rearm_threshold(&self) -> f32 {
        self.tps_threshold + self.tps_hysteresis
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.tps_threshold) {
            return Err(ConfigError::ValidationFailed(
                "guard.tps_threshold must be within 0..=100 %",
            ));
        }
        if !(0.0..=100.0).contains(&self.tps_hysteresis) {
            return Err(ConfigError::ValidationFailed(
                "guard.tps_hysteresis must be within 0..=100 %",
            ));
        }
        if self.max_hold_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "guard.max_hold_ms must be > 0",
            ));
        }
        Ok(())
    }
}

/// Wheel-speed pickup parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelSpeedConfig {
    /// Rolling circumference of the sensed wheel (m).
    pub tire_circumference_m: f32,
    /// Pickup edges per wheel revolution.
    pub pulses_per_revolution: u8,
}

impl Default for WheelSpeedConfig {
    fn default() -> Self {
        Self {
            tire_circumference_m: 1.9,
            pulses_per_revolution: 1,
        }
    }
}

impl WheelSpeedConfig {
    /// km/h contributed by one edge per second.
    pub fn kph_per_hz(&self) -> f32 {
        self.tire_circumference_m / f32::from(self.pulses_per_revolution) * 3.6
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tire_circumference_m > 0.0 && self.tire_circumference_m.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "wheel_speed.tire_circumference_m must be > 0",
            ));
        }
        if self.pulses_per_revolution == 0 {
            return Err(ConfigError::ValidationFailed(
                "wheel_speed.pulses_per_revolution must be > 0",
            ));
        }
        Ok(())
    }
}

/// Edge ages are compared on the wrapping µs counter, which only orders
/// readings less than 2^31 µs apart.
const MAX_EDGE_TIMEOUT_MS: u32 = 60_000;

/// Complete configuration snapshot for all engine modules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub guard: GuardConfig,
    pub wheel_speed: WheelSpeedConfig,
    /// Slow periodic callback interval (ms).
    pub slow_tick_interval_ms: u32,
    /// Telemetry report interval (ms).
    pub telemetry_interval_ms: u32,
    /// A pulse input with no edge for this long reads as unavailable (ms).
    pub edge_timeout_ms: u32,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            guard: GuardConfig::default(),
            wheel_speed: WheelSpeedConfig::default(),
            slow_tick_interval_ms: 50,   // 20 Hz
            telemetry_interval_ms: 1000, // 1 Hz
            edge_timeout_ms: 1000,
        }
    }
}

impl ModuleConfig {
    /// Decode and validate a JSON snapshot.  Missing fields take their
    /// defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|e| {
            log::warn!("config: JSON decode failed: {}", e);
            ConfigError::Malformed
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.guard.validate()?;
        self.wheel_speed.validate()?;
        if self.slow_tick_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "slow_tick_interval_ms must be > 0",
            ));
        }
        if self.telemetry_interval_ms < self.slow_tick_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_ms must be >= slow_tick_interval_ms",
            ));
        }
        if !(1..=MAX_EDGE_TIMEOUT_MS).contains(&self.edge_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "edge_timeout_ms must be within 1..=60000",
            ));
        }
        Ok(())
    }

    pub fn edge_timeout_us(&self) -> u32 {
        self.edge_timeout_ms.saturating_mul(1_000)
    }

    /// Slow ticks between two telemetry reports (at least 1).
    pub fn telemetry_every_ticks(&self) -> u32 {
        (self.telemetry_interval_ms / self.slow_tick_interval_ms.max(1)).max(1)
    }
}
