//! Throttle position sensor (potentiometer on ADC1).
//!
//! Converts a raw 12-bit sample into percent open using the closed and
//! wide-open calibration points.  Samples far outside the calibrated span
//! mean a broken wire or shorted wiper, and are reported as no reading so
//! the registry falls back to zero.

/// Counts outside the calibrated span still accepted as end-stop noise.
const RAIL_MARGIN: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleSensor {
    closed_raw: u16,
    open_raw: u16,
}

impl ThrottleSensor {
    /// `closed_raw` and `open_raw` may be given in either order; an
    /// inverted pot simply has `open_raw < closed_raw`.
    pub const fn new(closed_raw: u16, open_raw: u16) -> Self {
        Self {
            closed_raw,
            open_raw,
        }
    }

    /// Percent open (0..100) or `None` for an implausible sample.
    pub fn percent(&self, raw: u16) -> Option<f32> {
        let lo = self.closed_raw.min(self.open_raw);
        let hi = self.closed_raw.max(self.open_raw);
        if hi == lo {
            return None;
        }
        if raw < lo.saturating_sub(RAIL_MARGIN) || raw > hi.saturating_add(RAIL_MARGIN) {
            return None;
        }

        let span = f32::from(self.open_raw) - f32::from(self.closed_raw);
        let pct = (f32::from(raw) - f32::from(self.closed_raw)) / span * 100.0;
        Some(pct.clamp(0.0, 100.0))
    }
}
