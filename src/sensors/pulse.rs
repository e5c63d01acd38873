//! Edge-period measurement for hardware-timestamped pulse inputs.
//!
//! An input-capture ISR calls [`PulseTimer::on_edge`] with the captured
//! microsecond counter; the periodic task reads
//! [`PulseTimer::latest_rate`].  The estimate is first-order: only the
//! interval to the previous edge is kept, no averaging.
//!
//! ## Context rules
//!
//! - `on_edge` is the only writer of the edge state and runs in interrupt
//!   context.  It is O(1), takes no lock and never logs.
//! - `latest_rate` may run anywhere; at worst it returns the value from
//!   one edge earlier.
//! - `reset` and `set_units_per_edge` belong to the periodic task.  Call
//!   `reset` only while the edge interrupt is masked (module init).

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::sync::AtomicF32;
use crate::time::elapsed_us;

const MICROS_PER_SEC: f32 = 1_000_000.0;

/// Converts edge timestamps into `edges per second × units_per_edge`.
pub struct PulseTimer {
    last_edge_us: AtomicU32,
    has_baseline: AtomicBool,
    latest_rate: AtomicF32,
    units_per_edge: AtomicF32,
}

impl PulseTimer {
    pub const fn new(units_per_edge: f32) -> Self {
        Self {
            last_edge_us: AtomicU32::new(0),
            has_baseline: AtomicBool::new(false),
            latest_rate: AtomicF32::new(0.0),
            units_per_edge: AtomicF32::new(units_per_edge),
        }
    }

    /// Record one edge captured at `timestamp_us`.
    ///
    /// The first edge after construction or [`reset`](Self::reset) only
    /// seeds the baseline.  An edge with the same timestamp as the
    /// previous one is a duplicate capture and is dropped.
    #[inline]
    pub fn on_edge(&self, timestamp_us: u32) {
        if !self.has_baseline.load(Ordering::Relaxed) {
            self.last_edge_us.store(timestamp_us, Ordering::Relaxed);
            self.has_baseline.store(true, Ordering::Release);
            return;
        }

        let last = self.last_edge_us.load(Ordering::Relaxed);
        let delta_us = elapsed_us(last, timestamp_us);
        if delta_us == 0 {
            return;
        }
        self.last_edge_us.store(timestamp_us, Ordering::Release);

        let frequency_hz = MICROS_PER_SEC / delta_us as f32;
        self.latest_rate
            .store(frequency_hz * self.units_per_edge.load());
    }

    /// Most recent rate, `0.0` until two distinct edges were seen.
    #[inline]
    pub fn latest_rate(&self) -> f32 {
        self.latest_rate.load()
    }

    /// True once at least one edge has been captured since reset.
    pub fn has_baseline(&self) -> bool {
        self.has_baseline.load(Ordering::Acquire)
    }

    /// Capture time of the most recent edge, `None` before the first one.
    pub fn last_edge_us(&self) -> Option<u32> {
        self.has_baseline()
            .then(|| self.last_edge_us.load(Ordering::Acquire))
    }

    /// True when no edge arrived within `timeout_us` of `now_us`, or none
    /// was ever captured.  An edge stamped after `now_us` (captured while
    /// the caller was sampling its clock) counts as fresh.
    ///
    /// `timeout_us` must stay below 2^31.
    pub fn is_stale(&self, now_us: u32, timeout_us: u32) -> bool {
        self.last_edge_us()
            .is_none_or(|last| elapsed_us(last, now_us) as i32 > timeout_us as i32)
    }

    /// Rescale future rates.  The stored rate is left untouched until
    /// the next edge.
    pub fn set_units_per_edge(&self, units: f32) {
        self.units_per_edge.store(units);
    }

    pub fn units_per_edge(&self) -> f32 {
        self.units_per_edge.load()
    }

    /// Forget the baseline and the last rate.
    pub fn reset(&self) {
        self.has_baseline.store(false, Ordering::Relaxed);
        self.last_edge_us.store(0, Ordering::Relaxed);
        self.latest_rate.store(0.0);
    }
}
