//! Clock abstraction so timestamps and nonces can be tested deterministically.

use chrono::Utc;

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Returns current time in microseconds since Unix epoch.
    fn now_us(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }

    fn now_us(&self) -> u64 {
        Utc::now().timestamp_micros().max(0) as u64
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    micros: u64,
}

impl FixedClock {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            micros: ms.saturating_mul(1000),
        }
    }

    pub fn from_micros(us: u64) -> Self {
        Self { micros: us }
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.micros / 1000
    }

    fn now_us(&self) -> u64 {
        self.micros
    }
}
