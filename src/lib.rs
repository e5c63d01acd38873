//! Engine modules library: backfire IACV guard and pulse-period sensors.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! firmware binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(all(target_os = "espidf", feature = "espidf"))]` within each
//! module; anything else gets the host stubs.

#![deny(unused_must_use)]

pub mod app;
pub mod backfire;
pub mod config;
pub mod error;
pub mod isr_glue;
pub mod pins;
pub mod sensors;
pub mod sync;
pub mod time;

pub mod adapters;
pub mod drivers;
