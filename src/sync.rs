//! Lock-free cells for handing values between interrupt and task context.
//!
//! Xtensa and RISC-V ESP32 cores load and store aligned 32-bit words in a
//! single access, so an `f32` carried as its bit pattern in an
//! [`AtomicU32`] can never be observed half-written.

use core::sync::atomic::{AtomicU32, Ordering};

/// An `f32` stored as raw bits in an [`AtomicU32`].
///
/// Intended for one writer and any number of readers.  Readers see either
/// the previous or the new value, never a mix of both.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Release-store so a reader that acquires the value also sees every
    /// write the producer made before it.
    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}
