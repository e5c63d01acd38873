//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements     | Connects to                 |
//! |--------------|----------------|-----------------------------|
//! | `idle_valve` | IdleValvePort  | embedded-hal PWM (LEDC)     |
//! | `log_sink`   | EventSink      | Serial log output           |
//! | `time`       | ClockPort      | ESP32 high-resolution timer |
//!
//! `SensorPort` is implemented by [`crate::sensors::SensorRegistry`].

pub mod idle_valve;
pub mod log_sink;
pub mod time;
