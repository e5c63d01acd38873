//! Module service: lifecycle and periodic orchestration.
//!
//! [`EngineModules`] borrows the guard and the wheel-speed module that the
//! firmware constructed at startup and drives them through the engine
//! module lifecycle:
//!
//! ```text
//!  start()          ≙ init without configuration
//!  apply_config()   ≙ configuration change
//!  on_slow_tick()   ≙ slow periodic callback
//! ```
//!
//! Interrupt-context entry points do not go through the service; they use
//! [`IsrGlue`](crate::isr_glue::IsrGlue) holding the same references.

use log::info;

use crate::backfire::{BackfireGuard, TriggerOutcome};
use crate::config::ModuleConfig;
use crate::error::ConfigError;
use crate::sensors::wheel_speed::WheelSpeed;
use crate::sensors::{SensorKind, SensorRegistry};

use super::events::{ModuleEvent, TelemetryData};
use super::ports::{ClockPort, EventSink, IdleValvePort, SensorPort};

/// Owns the periodic side of the engine modules.
pub struct EngineModules<'a, S, C, V> {
    guard: &'a BackfireGuard<S, C, V>,
    wheel_speed: &'a WheelSpeed,
    sensors: &'a SensorRegistry,
    clock: C,
    config: ModuleConfig,
    telemetry_every: u32,
    tick_count: u64,
}

impl<'a, S, C, V> EngineModules<'a, S, C, V>
where
    S: SensorPort,
    C: ClockPort,
    V: IdleValvePort,
{
    pub fn new(
        guard: &'a BackfireGuard<S, C, V>,
        wheel_speed: &'a WheelSpeed,
        sensors: &'a SensorRegistry,
        clock: C,
    ) -> Self {
        let config = ModuleConfig::default();
        Self {
            guard,
            wheel_speed,
            sensors,
            clock,
            config,
            telemetry_every: config.telemetry_every_ticks(),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Reset every module to its unconfigured state.  A backfire
    /// override still in progress is released first.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        if let Some(restoration) = self.guard.reset() {
            sink.emit(&ModuleEvent::OverrideReleased(restoration));
        }
        self.wheel_speed.init_no_configuration();
        self.sensors.invalidate(SensorKind::VehicleSpeed);
        self.config = ModuleConfig::default();
        self.telemetry_every = self.config.telemetry_every_ticks();
        self.tick_count = 0;
        info!("EngineModules started");
        sink.emit(&ModuleEvent::Started);
    }

    /// Apply a new snapshot to every module, or to none of them.
    pub fn apply_config(
        &mut self,
        config: ModuleConfig,
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        if let Err(e) = config.validate().and_then(|()| self.guard.apply_config(config.guard)) {
            log::warn!("EngineModules: configuration rejected: {}", e);
            sink.emit(&ModuleEvent::ConfigRejected(e));
            return Err(e);
        }
        self.wheel_speed.on_configuration_change(&config.wheel_speed);
        self.config = config;
        self.telemetry_every = config.telemetry_every_ticks();
        sink.emit(&ModuleEvent::ConfigApplied);
        Ok(())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Slow periodic callback: expire overrides, publish derived sensors,
    /// and report telemetry at the configured cadence.
    pub fn on_slow_tick(&mut self, sink: &mut impl EventSink) {
        self.tick_count += 1;

        if let Some(restoration) = self.guard.tick() {
            sink.emit(&ModuleEvent::OverrideReleased(restoration));
        }

        self.sensors.publish_pulse_rate(
            SensorKind::VehicleSpeed,
            self.wheel_speed.timer(),
            self.clock.now_us(),
            self.config.edge_timeout_us(),
        );

        if self.tick_count % u64::from(self.telemetry_every) == 0 {
            sink.emit(&ModuleEvent::Telemetry(self.build_telemetry()));
        }
    }

    /// Backfire request from task context.
    pub fn request_backfire_close(&self, hold_ms: u16) -> TriggerOutcome {
        self.guard.trigger(hold_ms)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            uptime_ms: self.clock.now_ms(),
            vehicle_speed_kph: self.sensors.get_or_zero(SensorKind::VehicleSpeed),
            tps: self.sensors.get_or_zero(SensorKind::ThrottlePosition),
            rpm: self.sensors.get_or_zero(SensorKind::EngineSpeed),
            override_active: self.guard.is_active(),
            override_remaining_ms: self.guard.remaining_hold_ms(),
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Slow ticks executed since [`start`](Self::start).
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
