//! Outbound module events.
//!
//! [`EngineModules`](super::service::EngineModules) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters decide what to do
//! with them (serial log, CAN broadcast, tuning-software stream).

use crate::backfire::Restoration;
use crate::error::ConfigError;

/// Structured events emitted by the module service.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleEvent {
    /// Modules initialised with defaults.
    Started,

    /// A configuration snapshot was accepted.
    ConfigApplied,

    /// A configuration snapshot was refused; the previous one stays.
    ConfigRejected(ConfigError),

    /// A backfire override ended and the valve was handed back.
    OverrideReleased(Restoration),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub uptime_ms: u32,
    pub vehicle_speed_kph: f32,
    pub tps: f32,
    pub rpm: f32,
    pub override_active: bool,
    pub override_remaining_ms: u32,
}
