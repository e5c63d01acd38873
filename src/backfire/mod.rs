//! Backfire IACV guard.
//!
//! On a backfire request the guard closes the idle air control valve for a
//! bounded hold, then restores whatever position the idle controller had
//! commanded before.  Requests are admitted only inside a safe envelope:
//! engine above `min_rpm`, throttle at or below `tps_threshold`.
//!
//! ## State machine
//!
//! ```text
//!            trigger (admitted)
//!   ┌──────┐ ─────────────────▶ ┌─────────────┐
//!   │ Idle │                    │ Overriding  │ ◀─┐ trigger: ignored
//!   └──────┘ ◀───────────────── └─────────────┘ ──┘ (or extended)
//!            tick, now >= deadline
//! ```
//!
//! ## Contexts
//!
//! [`trigger`](BackfireGuard::trigger) may be called from detection code
//! in any context; [`tick`](BackfireGuard::tick) runs on the slow periodic
//! task.  Admission, the saved-target capture, the valve command and the
//! deadline update happen inside one critical section, so a restore can
//! never interleave with a half-applied override.  Log lines are written
//! after the critical section is released.

mod outcome;

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::app::ports::{ActuatorHook, ClockPort, IdleValvePort, SensorPort};
use crate::config::{GuardConfig, RetriggerPolicy};
use crate::error::ConfigError;
use crate::sensors::SensorKind;
use crate::time::{deadline_after, deadline_reached, remaining_ms};

pub use outcome::{Engagement, Refusal, Restoration, TriggerOutcome};

/// Hold substituted for a zero-length request, so the override always
/// survives at least one slow tick.
pub const MIN_HOLD_MS: u16 = 50;

/// Valve position forced during an override (fully closed).
pub const CLOSED_PERCENT: f32 = 0.0;

/// Position assumed when the valve driver cannot report its target.
pub const SAVED_TARGET_FALLBACK: f32 = 100.0;

/// Realised hold for a request: zero becomes [`MIN_HOLD_MS`], anything
/// longer than `max_hold_ms` is capped.
pub fn clamp_hold_ms(requested_ms: u16, max_hold_ms: u16) -> u16 {
    let hold = if requested_ms == 0 {
        MIN_HOLD_MS
    } else {
        requested_ms
    };
    hold.min(max_hold_ms)
}

/// Override bookkeeping.  `restore_deadline_ms` and `saved_target` are
/// meaningful only while `active`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrideState {
    pub active: bool,
    pub restore_deadline_ms: u32,
    pub saved_target: f32,
    pub override_percent: f32,
}

impl OverrideState {
    const fn idle(override_percent: f32) -> Self {
        Self {
            active: false,
            restore_deadline_ms: 0,
            saved_target: 0.0,
            override_percent,
        }
    }
}

struct Inner<V> {
    state: OverrideState,
    valve: ActuatorHook<V>,
}

/// Entry point for detection code that only needs to ask for an override.
///
/// Lets interrupt glue hold the guard as a trait object without naming its
/// sensor, clock and valve types.
pub trait BackfireRequest {
    fn request_close(&self, hold_ms: u16) -> TriggerOutcome;
    fn is_override_active(&self) -> bool;
}

/// Time-gated IACV override coordinator.
pub struct BackfireGuard<S, C, V> {
    sensors: S,
    clock: C,
    config: Mutex<CriticalSectionRawMutex, Cell<GuardConfig>>,
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<V>>>,
    /// Mirror of `state.active` for lock-free queries.
    active: AtomicBool,
}

impl<S, C, V> BackfireGuard<S, C, V>
where
    S: SensorPort,
    C: ClockPort,
    V: IdleValvePort,
{
    /// Build an idle guard with default (disabled) configuration.
    pub fn new(sensors: S, clock: C, valve: ActuatorHook<V>) -> Self {
        if !valve.is_present() {
            log::warn!("Backfire: no IACV driver attached, overrides will be tracking only");
        }
        Self {
            sensors,
            clock,
            config: Mutex::new(Cell::new(GuardConfig::default())),
            inner: Mutex::new(RefCell::new(Inner {
                state: OverrideState::idle(CLOSED_PERCENT),
                valve,
            })),
            active: AtomicBool::new(false),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Return to idle with default configuration.  An override in
    /// progress is ended early and the valve handed back its saved target.
    pub fn reset(&self) -> Option<Restoration> {
        let restored = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let restored = inner.state.active.then(|| {
                let percent = inner.state.saved_target;
                Restoration {
                    percent,
                    valve_commanded: inner.valve.set_target_percent(percent),
                    at_ms: self.clock.now_ms(),
                }
            });
            inner.state = OverrideState::idle(CLOSED_PERCENT);
            self.active.store(false, Ordering::Release);
            restored
        });
        self.config.lock(|c| c.set(GuardConfig::default()));

        if let Some(r) = &restored {
            r.report();
        }
        restored
    }

    /// Replace the configuration snapshot.  An invalid snapshot is
    /// rejected and the previous one stays in force.
    pub fn apply_config(&self, config: GuardConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            log::warn!("Backfire: config rejected ({}), keeping previous", e);
            return Err(e);
        }
        self.config.lock(|c| c.set(config));
        log::info!(
            "Backfire: enabled={} TPS<={:.1}% (re-arm {:.1}%) RPM>={} hold<={} ms {:?}",
            config.enabled,
            config.tps_threshold,
            config.rearm_threshold(),
            config.min_rpm,
            config.max_hold_ms,
            config.retrigger
        );
        Ok(())
    }

    pub fn config(&self) -> GuardConfig {
        self.config.lock(Cell::get)
    }

    // ── Entry points ──────────────────────────────────────────

    /// Ask for the valve to be closed for `requested_hold_ms`.
    pub fn trigger(&self, requested_hold_ms: u16) -> TriggerOutcome {
        let config = self.config();
        let outcome = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            self.admit(&mut inner, &config, requested_hold_ms)
        });
        outcome.report();
        outcome
    }

    /// Slow periodic callback: restore the valve once the hold expired.
    pub fn tick(&self) -> Option<Restoration> {
        if !self.active.load(Ordering::Acquire) {
            return None;
        }

        let restored = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if !inner.state.active {
                return None;
            }
            let now = self.clock.now_ms();
            if !deadline_reached(now, inner.state.restore_deadline_ms) {
                return None;
            }

            let percent = inner.state.saved_target;
            let valve_commanded = inner.valve.set_target_percent(percent);
            inner.state.active = false;
            self.active.store(false, Ordering::Release);
            Some(Restoration {
                percent,
                valve_commanded,
                at_ms: now,
            })
        });

        if let Some(r) = &restored {
            r.report();
        }
        restored
    }

    // ── Queries ───────────────────────────────────────────────

    /// Lock-free: is the valve currently held by the guard?
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deadline of the override in effect, if any.
    pub fn restore_deadline(&self) -> Option<u32> {
        self.inner.lock(|cell| {
            let inner = cell.borrow();
            inner
                .state
                .active
                .then_some(inner.state.restore_deadline_ms)
        })
    }

    /// Milliseconds until the valve is restored (0 when idle).
    pub fn remaining_hold_ms(&self) -> u32 {
        self.restore_deadline()
            .map_or(0, |d| remaining_ms(self.clock.now_ms(), d))
    }

    pub fn state(&self) -> OverrideState {
        self.inner.lock(|cell| cell.borrow().state)
    }

    // ── Internal ──────────────────────────────────────────────

    /// Gate, then either start a new override or apply the re-trigger
    /// policy.  Runs inside the critical section.
    fn admit(
        &self,
        inner: &mut Inner<V>,
        config: &GuardConfig,
        requested_hold_ms: u16,
    ) -> TriggerOutcome {
        if !config.enabled {
            return TriggerOutcome::Refused(Refusal::Disabled);
        }

        let rpm = self.sensors.get_or_zero(SensorKind::EngineSpeed);
        if rpm < f32::from(config.min_rpm) {
            return TriggerOutcome::Refused(Refusal::RpmBelowMinimum {
                rpm,
                min_rpm: config.min_rpm,
            });
        }

        // Hysteresis only matters for re-arming, not for entry.
        let tps = self.sensors.get_or_zero(SensorKind::ThrottlePosition);
        if tps > config.tps_threshold {
            return TriggerOutcome::Refused(Refusal::ThrottleAboveThreshold {
                tps,
                threshold: config.tps_threshold,
            });
        }

        let hold_ms = clamp_hold_ms(requested_hold_ms, config.max_hold_ms);
        let now = self.clock.now_ms();
        let candidate = deadline_after(now, hold_ms);

        if inner.state.active {
            let current = inner.state.restore_deadline_ms;
            return match config.retrigger {
                RetriggerPolicy::Extend if !deadline_reached(current, candidate) => {
                    inner.state.restore_deadline_ms = candidate;
                    TriggerOutcome::Extended {
                        hold_ms,
                        restore_at_ms: candidate,
                    }
                }
                _ => TriggerOutcome::AlreadyActive {
                    restore_at_ms: current,
                },
            };
        }

        let reported = inner.valve.target_percent();
        let saved_percent = reported.unwrap_or(SAVED_TARGET_FALLBACK);
        let override_percent = inner.state.override_percent;
        let valve_commanded = inner.valve.set_target_percent(override_percent);

        inner.state = OverrideState {
            active: true,
            restore_deadline_ms: candidate,
            saved_target: saved_percent,
            override_percent,
        };
        self.active.store(true, Ordering::Release);

        TriggerOutcome::Engaged(Engagement {
            hold_ms,
            restore_at_ms: candidate,
            override_percent,
            saved_percent,
            saved_from_valve: reported.is_some(),
            valve_commanded,
            tps,
            rpm,
        })
    }
}

impl<S, C, V> BackfireRequest for BackfireGuard<S, C, V>
where
    S: SensorPort,
    C: ClockPort,
    V: IdleValvePort,
{
    fn request_close(&self, hold_ms: u16) -> TriggerOutcome {
        self.trigger(hold_ms)
    }

    fn is_override_active(&self) -> bool {
        self.is_active()
    }
}
