//! Application core: module orchestration, zero I/O.
//!
//! The guard and the pulse timers live in [`crate::backfire`] and
//! [`crate::sensors`]; this layer wires them into the engine-module
//! lifecycle.  All interaction with hardware happens through the **port
//! traits** in [`ports`], keeping this layer testable without peripherals.

pub mod events;
pub mod ports;
pub mod service;
