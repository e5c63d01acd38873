//! Mock adapters for integration tests.
//!
//! The valve records every command so tests can assert on the full
//! command history; the clock is advanced by hand.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use ecu_modules::app::events::ModuleEvent;
use ecu_modules::app::ports::{ActuatorHook, ClockPort, EventSink, IdleValvePort};
use ecu_modules::backfire::BackfireGuard;
use ecu_modules::config::GuardConfig;
use ecu_modules::sensors::{SensorKind, SensorRegistry};

// ── Clock ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    ms: AtomicU32,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u32) -> Self {
        Self {
            ms: AtomicU32::new(ms),
        }
    }

    pub fn set(&self, ms: u32) {
        self.ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u32) {
        let now = self.ms.load(Ordering::SeqCst);
        self.ms.store(now.wrapping_add(ms), Ordering::SeqCst);
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u32 {
        self.ms.load(Ordering::SeqCst)
    }

    fn now_us(&self) -> u32 {
        self.now_ms().wrapping_mul(1_000)
    }
}

// ── Valve ─────────────────────────────────────────────────────

/// Shared record of every `set_target_percent` call.
pub type ValveLog = Arc<Mutex<Vec<f32>>>;

pub struct RecordingValve {
    target: Option<f32>,
    can_report: bool,
    log: ValveLog,
}

#[allow(dead_code)]
impl RecordingValve {
    pub fn at(percent: f32) -> (Self, ValveLog) {
        let log = ValveLog::default();
        let valve = Self {
            target: Some(percent),
            can_report: true,
            log: Arc::clone(&log),
        };
        (valve, log)
    }

    /// A driver that can be commanded but never reports its target.
    pub fn write_only() -> (Self, ValveLog) {
        let (mut valve, log) = Self::at(0.0);
        valve.can_report = false;
        (valve, log)
    }
}

impl IdleValvePort for RecordingValve {
    fn target_percent(&self) -> Option<f32> {
        if self.can_report { self.target } else { None }
    }

    fn set_target_percent(&mut self, percent: f32) -> bool {
        self.target = Some(percent);
        if let Ok(mut log) = self.log.lock() {
            log.push(percent);
        }
        true
    }
}

pub fn writes(log: &ValveLog) -> Vec<f32> {
    log.lock().map(|l| l.clone()).unwrap_or_default()
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct CollectSink {
    pub events: Vec<ModuleEvent>,
}

#[allow(dead_code)]
impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&ModuleEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for CollectSink {
    fn emit(&mut self, event: &ModuleEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type TestGuard<'a> = BackfireGuard<&'a SensorRegistry, &'a MockClock, RecordingValve>;

/// Guard enabled with the default thresholds.
pub fn enabled() -> GuardConfig {
    GuardConfig {
        enabled: true,
        ..GuardConfig::default()
    }
}

#[allow(dead_code)]
pub fn guard_with<'a>(
    sensors: &'a SensorRegistry,
    clock: &'a MockClock,
    valve: Option<RecordingValve>,
    config: GuardConfig,
) -> TestGuard<'a> {
    let guard = BackfireGuard::new(sensors, clock, ActuatorHook::from(valve));
    guard.apply_config(config).expect("test config is valid");
    guard
}

/// Engine idling: throttle closed, 1200 rpm.
pub fn idling() -> SensorRegistry {
    let sensors = SensorRegistry::new();
    sensors.publish(SensorKind::ThrottlePosition, 5.0);
    sensors.publish(SensorKind::EngineSpeed, 1200.0);
    sensors
}
