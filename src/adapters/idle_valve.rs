//! PWM idle air control valve adapter.
//!
//! Drives the IACV solenoid through any `embedded_hal::pwm::SetDutyCycle`
//! output (an LEDC channel on the ESP32).  The valve has no position
//! feedback, so the adapter reports the last target it successfully
//! commanded; before the first command it reports nothing, and the guard
//! falls back to its default saved target.

use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::warn;

use crate::app::ports::IdleValvePort;

pub struct PwmIdleValve<P> {
    pwm: P,
    target: Option<f32>,
}

impl<P: SetDutyCycle> PwmIdleValve<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm, target: None }
    }

    /// Valve starting at a known position, commanded immediately.
    pub fn with_initial_percent(pwm: P, percent: f32) -> Self {
        let mut valve = Self::new(pwm);
        valve.set_target_percent(percent);
        valve
    }

    fn duty_for(&self, percent: f32) -> u16 {
        let max = f32::from(self.pwm.max_duty_cycle());
        (percent.clamp(0.0, 100.0) / 100.0 * max).round() as u16
    }

    pub fn into_inner(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> IdleValvePort for PwmIdleValve<P> {
    fn target_percent(&self) -> Option<f32> {
        self.target
    }

    fn set_target_percent(&mut self, percent: f32) -> bool {
        if !percent.is_finite() {
            warn!("IACV: non-finite target {} ignored", percent);
            return false;
        }
        let percent = percent.clamp(0.0, 100.0);
        let duty = self.duty_for(percent);
        match self.pwm.set_duty_cycle(duty) {
            Ok(()) => {
                self.target = Some(percent);
                true
            }
            Err(e) => {
                warn!("IACV: duty write failed: {:?}", e.kind());
                false
            }
        }
    }
}
