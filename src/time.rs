//! Wraparound-safe arithmetic on the 32-bit hardware counters.
//!
//! Both the millisecond tick and the microsecond capture counter are
//! `u32` and wrap (after ~49.7 days and ~71.6 minutes respectively).
//! Every comparison between two readings goes through these helpers so a
//! wrap between the readings never inverts the result.

/// Microseconds between two edge captures, tolerating one counter wrap.
#[inline]
pub const fn elapsed_us(earlier: u32, later: u32) -> u32 {
    later.wrapping_sub(earlier)
}

/// Absolute deadline `hold_ms` after `now_ms`, on the wrapping ms counter.
#[inline]
pub const fn deadline_after(now_ms: u32, hold_ms: u16) -> u32 {
    now_ms.wrapping_add(hold_ms as u32)
}

/// True once `now_ms` has reached or passed `deadline_ms`.
///
/// Correct as long as the two readings are less than 2^31 ms apart, which
/// always holds for hold intervals bounded by `u16::MAX`.
#[inline]
pub const fn deadline_reached(now_ms: u32, deadline_ms: u32) -> bool {
    (now_ms.wrapping_sub(deadline_ms) as i32) >= 0
}

/// Milliseconds left until `deadline_ms`, or 0 if it has already passed.
#[inline]
pub const fn remaining_ms(now_ms: u32, deadline_ms: u32) -> u32 {
    if deadline_reached(now_ms, deadline_ms) {
        0
    } else {
        deadline_ms.wrapping_sub(now_ms)
    }
}
