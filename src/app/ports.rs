//! Port traits: the boundary between the engine modules and the rest of
//! the controller.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BackfireGuard / EngineModules
//! ```
//!
//! Sensor producers, the clock, the idle valve driver and the event
//! transport all implement these traits.  The modules consume them via
//! generics so the domain logic never touches hardware directly.

use crate::sensors::SensorKind;

// ───────────────────────────────────────────────────────────────
// Sensor port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for live physical quantities.
pub trait SensorPort {
    /// Current value of `kind`, or `0.0` when the sensor has no valid
    /// reading.  Never fails.
    fn get_or_zero(&self, kind: SensorKind) -> f32;
}

impl<T: SensorPort + ?Sized> SensorPort for &T {
    fn get_or_zero(&self, kind: SensorKind) -> f32 {
        (**self).get_or_zero(kind)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time since boot.  Both counters wrap; compare readings only
/// through [`crate::time`].
pub trait ClockPort {
    fn now_ms(&self) -> u32;
    fn now_us(&self) -> u32;
}

impl<T: ClockPort + ?Sized> ClockPort for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}

// ───────────────────────────────────────────────────────────────
// Idle valve port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Commanded position of the idle air control valve, in percent open.
///
/// Both methods default to "not implemented".  A driver that can only
/// command, or only report, overrides just the one it supports; callers
/// detect the gap at call time and degrade instead of failing.
pub trait IdleValvePort {
    /// Currently commanded opening, `None` if the driver cannot report it.
    fn target_percent(&self) -> Option<f32> {
        None
    }

    /// Command a new opening.  Returns `false` if the driver cannot act.
    fn set_target_percent(&mut self, percent: f32) -> bool {
        let _ = percent;
        false
    }
}

/// Optional idle valve capability injected into the guard.
#[derive(Debug)]
pub enum ActuatorHook<V> {
    Present(V),
    Absent,
}

impl<V: IdleValvePort> ActuatorHook<V> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Commanded opening, if a driver is attached and can report it.
    pub fn target_percent(&self) -> Option<f32> {
        match self {
            Self::Present(valve) => valve.target_percent(),
            Self::Absent => None,
        }
    }

    /// Command the valve.  `false` means nothing physically moved.
    pub fn set_target_percent(&mut self, percent: f32) -> bool {
        match self {
            Self::Present(valve) => valve.set_target_percent(percent),
            Self::Absent => false,
        }
    }
}

impl<V> From<Option<V>> for ActuatorHook<V> {
    fn from(valve: Option<V>) -> Self {
        match valve {
            Some(v) => Self::Present(v),
            None => Self::Absent,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The module service emits structured [`ModuleEvent`](super::events::ModuleEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ModuleEvent);
}
