//! Wall-clock boundary contract.

/// Millisecond wall clock.
pub trait ClockPort: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}
