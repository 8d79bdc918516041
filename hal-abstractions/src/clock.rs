//! Monotonic time source

use core::future::Future;

/// Monotonic clock counting milliseconds since boot
///
/// `now_ms` must never go backwards. `delay_ms` suspends the caller; on
/// single-task firmware it is the only place the telemetry loop yields
/// for a known duration.
pub trait Clock {
    /// Milliseconds elapsed since boot
    fn now_ms(&self) -> u64;

    /// Wait for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u64) -> impl Future<Output = ()>;
}
