use chrono::Utc;

/// Millisecond time source used to stamp interval boundaries.
///
/// Any `Fn() -> u64` closure is a clock, which keeps tests deterministic.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Process wall clock, milliseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl Clock for WallClock {
    fn now_ms(&self) -> u64 {
        // Pre-epoch system clocks collapse to zero.
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

impl<F> Clock for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn now_ms(&self) -> u64 {
        self()
    }
}
