//! GPIO / peripheral pin assignments for the ESP32-S3 engine module board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Pulse inputs (hall / VR conditioner outputs, open collector)
// ---------------------------------------------------------------------------

/// Wheel-speed sensor, one edge per tone-ring tooth.  Rising edge.
pub const WHEEL_SPEED_GPIO: i32 = 6;
/// Crank trigger, one edge per tooth.  Rising edge.
pub const CRANK_GPIO: i32 = 7;
/// Teeth on the crank trigger wheel (missing teeth not decoded).
pub const CRANK_TEETH: u8 = 36;

/// Digital input from the external backfire detector.  LOW = event.
pub const BACKFIRE_SENSE_GPIO: i32 = 8;
/// Hold requested when the detector fires.
pub const BACKFIRE_HOLD_MS: u16 = 250;

// ---------------------------------------------------------------------------
// Throttle position sensor (ADC1)
// ---------------------------------------------------------------------------

/// TPS wiper on ADC1 channel 4, which is GPIO 5 on the ESP32-S3.
pub const TPS_ADC_CHANNEL: u32 = 4;
/// Raw 12-bit counts at the closed and wide-open stops.
pub const TPS_CLOSED_RAW: u16 = 410;
pub const TPS_OPEN_RAW: u16 = 3_690;

// ---------------------------------------------------------------------------
// Idle air control valve (LEDC PWM into a low-side driver)
// ---------------------------------------------------------------------------

/// LEDC output; `main` checks the claimed peripheral pin against this.
pub const IACV_PWM_GPIO: i32 = 1;
/// Solenoid IACVs are typically driven at 100 – 300 Hz.
pub const IACV_PWM_FREQ_HZ: u32 = 200;
/// Valve position before the first configuration arrives.
pub const IACV_INITIAL_PERCENT: f32 = 30.0;
