/// Millisecond wall clock behind the session's deadline arithmetic.
///
/// All round deadlines, cooldown windows, and throttle stamps are absolute
/// epoch-millisecond values derived from this trait, so simulation outcomes
/// depend on elapsed wall-clock time rather than tick cadence.
pub trait Clock: Send {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
