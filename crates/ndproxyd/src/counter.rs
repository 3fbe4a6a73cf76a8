//! Shared packets-processed counter

use std::sync::atomic::{AtomicU64, Ordering};

/// Count of packets handled by the interception hook.
///
/// The hook increments it; the administrative surface reads and overwrites it.
#[derive(Debug, Default)]
pub struct PacketCounter(AtomicU64);

impl PacketCounter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Count one packet and return the new total.
    #[inline]
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: u64) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.set(0);
    }
}
