//! ESP32 time adapter.
//!
//! Implements [`ClockPort`] for the engine modules.
//!
//! - **`target_os = "espidf"` with the `espidf` feature**: wraps
//!   `esp_timer_get_time()` from the ESP-IDF high-resolution timer
//!   (microsecond precision, monotonic). Safe to call from ISR context.
//! - **otherwise**: uses `std::time::Instant` for host-side testing and
//!   simulation.
//!
//! Both counters are truncated to `u32` and therefore wrap; consumers
//! compare readings through [`crate::time`].

use crate::app::ports::ClockPort;

/// Time adapter for the ESP32 platform.
pub struct Esp32Clock {
    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    start: std::time::Instant,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot, full width.
    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads a free-running counter; no
        // preconditions, callable from any context including ISRs.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot, full width.
    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for Esp32Clock {
    fn now_ms(&self) -> u32 {
        (self.uptime_us() / 1_000) as u32
    }

    fn now_us(&self) -> u32 {
        self.uptime_us() as u32
    }
}
