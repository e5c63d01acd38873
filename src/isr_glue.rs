//! Interrupt glue.
//!
//! Board interrupt handlers and backfire detection code reach the modules
//! through an [`IsrGlue`] built once at startup, instead of through a
//! process-wide instance pointer.  Every entry point is safe to call
//! before its module is attached: edges are dropped and backfire requests
//! report [`TriggerOutcome::NotInitialized`].
//!
//! ```text
//!  wheel edge ISR   ──▶ wheel_speed_capture_us(ts)  ──▶ PulseTimer::on_edge
//!  backfire detector ──▶ request_close_iacv_for_backfire(ms) ──▶ BackfireGuard
//! ```

use crate::backfire::{BackfireRequest, TriggerOutcome};
use crate::sensors::pulse::PulseTimer;

/// References handed to interrupt-context callers.
#[derive(Clone, Copy, Default)]
pub struct IsrGlue<'a> {
    wheel_speed: Option<&'a PulseTimer>,
    backfire: Option<&'a (dyn BackfireRequest + Sync)>,
}

impl<'a> IsrGlue<'a> {
    /// Glue with nothing attached.
    pub const fn new() -> Self {
        Self {
            wheel_speed: None,
            backfire: None,
        }
    }

    #[must_use]
    pub const fn with_wheel_speed(mut self, timer: &'a PulseTimer) -> Self {
        self.wheel_speed = Some(timer);
        self
    }

    #[must_use]
    pub fn with_backfire(mut self, guard: &'a (dyn BackfireRequest + Sync)) -> Self {
        self.backfire = Some(guard);
        self
    }

    /// Forward one captured edge (µs ticks).  Only this runs in the IRQ.
    #[inline]
    pub fn wheel_speed_capture_us(&self, timestamp_us: u32) {
        if let Some(timer) = self.wheel_speed {
            timer.on_edge(timestamp_us);
        }
    }

    /// Ask the guard to hold the IACV closed for `hold_ms`.
    pub fn request_close_iacv_for_backfire(&self, hold_ms: u16) -> TriggerOutcome {
        match self.backfire {
            Some(guard) => guard.request_close(hold_ms),
            None => {
                let outcome = TriggerOutcome::NotInitialized;
                outcome.report();
                outcome
            }
        }
    }

    /// `false` when no guard is attached.
    pub fn is_backfire_iacv_active(&self) -> bool {
        self.backfire.is_some_and(|g| g.is_override_active())
    }
}
