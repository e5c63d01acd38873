//! Sensor subsystem: the shared [`SensorRegistry`] and the pulse-timed
//! drivers.
//!
//! Producers (ADC sampling task, crank pulse timer, wheel-speed module)
//! publish into the registry; consumers such as the backfire guard read
//! through [`SensorPort`].  Every slot is a lock-free atomic pair so any
//! execution context may read or publish.

pub mod pulse;
pub mod throttle;
pub mod wheel_speed;

use core::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::SensorPort;
use crate::sync::AtomicF32;

use self::pulse::PulseTimer;

/// Physical quantities the modules know how to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SensorKind {
    /// Throttle position, percent (0..100).
    ThrottlePosition = 0,
    /// Engine speed, rpm.
    EngineSpeed = 1,
    /// Vehicle speed from the wheel pickup, km/h.
    VehicleSpeed = 2,
}

const SENSOR_COUNT: usize = 3;

impl SensorKind {
    pub const ALL: [SensorKind; SENSOR_COUNT] = [
        SensorKind::ThrottlePosition,
        SensorKind::EngineSpeed,
        SensorKind::VehicleSpeed,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

struct Slot {
    value: AtomicF32,
    valid: AtomicBool,
}

impl Slot {
    const fn new() -> Self {
        Self {
            value: AtomicF32::new(0.0),
            valid: AtomicBool::new(false),
        }
    }
}

/// Latest reading of every [`SensorKind`], readable from any context.
pub struct SensorRegistry {
    slots: [Slot; SENSOR_COUNT],
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorRegistry {
    pub const fn new() -> Self {
        Self {
            slots: [Slot::new(), Slot::new(), Slot::new()],
        }
    }

    /// Store a fresh reading.  Non-finite values invalidate the slot.
    pub fn publish(&self, kind: SensorKind, value: f32) {
        let slot = &self.slots[kind.index()];
        if value.is_finite() {
            slot.value.store(value);
            slot.valid.store(true, Ordering::Release);
        } else {
            slot.valid.store(false, Ordering::Release);
        }
    }

    /// Mark a sensor as failed / unplugged.
    pub fn invalidate(&self, kind: SensorKind) {
        self.slots[kind.index()].valid.store(false, Ordering::Release);
    }

    /// Publish the rate of a pulse input, or invalidate the slot once its
    /// edges have stopped for longer than `timeout_us`.  Returns whether a
    /// value was published.
    pub fn publish_pulse_rate(
        &self,
        kind: SensorKind,
        timer: &PulseTimer,
        now_us: u32,
        timeout_us: u32,
    ) -> bool {
        if timer.is_stale(now_us, timeout_us) {
            self.invalidate(kind);
            return false;
        }
        self.publish(kind, timer.latest_rate());
        true
    }

    /// Latest reading, `None` if never published or invalidated.
    pub fn get(&self, kind: SensorKind) -> Option<f32> {
        let slot = &self.slots[kind.index()];
        slot.valid
            .load(Ordering::Acquire)
            .then(|| slot.value.load())
    }
}

impl SensorPort for SensorRegistry {
    fn get_or_zero(&self, kind: SensorKind) -> f32 {
        self.get(kind).unwrap_or(0.0)
    }
}
