//! Results of guard requests and restorations.
//!
//! None of these are errors.  A refused or degraded request is an
//! ordinary outcome for the caller; each one carries enough context for
//! a diagnostic line, which [`TriggerOutcome::report`] and
//! [`Restoration::report`] write through `log`.

use log::{info, warn};

/// Why a trigger was turned down.  The guard state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refusal {
    /// Guard disabled by configuration.
    Disabled,
    /// Engine speed below the minimum envelope.
    RpmBelowMinimum { rpm: f32, min_rpm: u16 },
    /// Throttle opened past the closing threshold.
    ThrottleAboveThreshold { tps: f32, threshold: f32 },
}

/// A new override that was put into effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engagement {
    /// Realised hold after the floor and `max_hold_ms` cap.
    pub hold_ms: u16,
    /// Absolute ms-counter value at which the valve is restored.
    pub restore_at_ms: u32,
    /// Position forced for the hold.
    pub override_percent: f32,
    /// Position that will be restored.
    pub saved_percent: f32,
    /// `false` when the driver could not report its target and the
    /// fallback was assumed.
    pub saved_from_valve: bool,
    /// `false` when no driver could be commanded (tracking only).
    pub valve_commanded: bool,
    pub tps: f32,
    pub rpm: f32,
}

/// Result of [`BackfireGuard::trigger`](super::BackfireGuard::trigger).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerOutcome {
    Engaged(Engagement),
    /// Re-trigger under the extend policy moved the deadline out.
    Extended { hold_ms: u16, restore_at_ms: u32 },
    /// Re-trigger while overriding; the deadline is unchanged.
    AlreadyActive { restore_at_ms: u32 },
    Refused(Refusal),
    /// No guard instance is attached to the caller's glue.
    NotInitialized,
}

impl TriggerOutcome {
    pub fn is_engaged(&self) -> bool {
        matches!(self, Self::Engaged(_))
    }

    /// Emit the diagnostic line for this outcome.
    pub fn report(&self) {
        match self {
            Self::Engaged(e) => {
                if !e.saved_from_valve {
                    warn!(
                        "Backfire: IACV target not readable, assuming {:.2}%",
                        e.saved_percent
                    );
                }
                if e.valve_commanded {
                    info!(
                        "Backfire: IACV set to {:.2}% for {} ms (old {:.2}%, TPS {:.2}%, RPM {:.0})",
                        e.override_percent, e.hold_ms, e.saved_percent, e.tps, e.rpm
                    );
                } else {
                    warn!(
                        "Backfire: IACV driver not commandable, tracking {} ms override only",
                        e.hold_ms
                    );
                }
            }
            Self::Extended {
                hold_ms,
                restore_at_ms,
            } => {
                info!(
                    "Backfire: override extended by re-trigger ({} ms, restore at {})",
                    hold_ms, restore_at_ms
                );
            }
            Self::AlreadyActive { restore_at_ms } => {
                info!(
                    "Backfire: override already active, restore at {} unchanged",
                    restore_at_ms
                );
            }
            Self::Refused(Refusal::Disabled) => {
                info!("Backfire: guard disabled, request ignored");
            }
            Self::Refused(Refusal::RpmBelowMinimum { rpm, min_rpm }) => {
                info!("Backfire: skip IACV close, RPM {:.0} < min {}", rpm, min_rpm);
            }
            Self::Refused(Refusal::ThrottleAboveThreshold { tps, threshold }) => {
                info!(
                    "Backfire: skip IACV close, TPS {:.2}% > threshold {:.2}%",
                    tps, threshold
                );
            }
            Self::NotInitialized => {
                warn!("Backfire: guard not initialised, request ignored");
            }
        }
    }
}

/// A completed override: the valve was (or should have been) returned to
/// its saved position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Restoration {
    pub percent: f32,
    pub valve_commanded: bool,
    pub at_ms: u32,
}

impl Restoration {
    pub fn report(&self) {
        if self.valve_commanded {
            info!("Backfire: IACV restored to {:.2}%", self.percent);
        } else {
            warn!(
                "Backfire: IACV driver not commandable, cannot restore {:.2}%",
                self.percent
            );
        }
    }
}
