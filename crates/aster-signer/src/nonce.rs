//! Nonce allocation for delegated-signer orders.
//!
//! The exchange rejects a reused nonce for the same signer, and a bare
//! microsecond clock read collides when two webhooks land in the same tick.
//! [`NonceManager`] hands out `max(last + 1, now_us)` through a CAS loop, so
//! nonces stay close to wall-clock microseconds, are unique across threads
//! and never go backwards when the clock regresses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use aster_core::{Clock, SystemClock};

/// Clock handle shared between the builder and the nonce manager.
pub type SharedClock = Arc<dyn Clock>;

/// Issues unique, strictly increasing microsecond nonces.
///
/// Shared by reference across request handlers; all state is one atomic.
pub struct NonceManager<C: Clock = SharedClock> {
    last: AtomicU64,
    clock: C,
}

impl<C: Clock> NonceManager<C> {
    /// Seed from the current clock reading. The first nonce is `now_us + 1`
    /// at the earliest.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            last: AtomicU64::new(clock.now_us()),
            clock,
        }
    }

    /// Allocate `max(last + 1, now_us)`.
    pub fn next(&self) -> u64 {
        let now = self.clock.now_us();
        let bump = |last: u64| last.saturating_add(1).max(now);

        // The closure never returns None, so this cannot fail.
        match self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(bump(last)))
        {
            Ok(prev) | Err(prev) => bump(prev),
        }
    }

    /// Last value handed out (or the starting point if none yet).
    #[must_use]
    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl NonceManager<SharedClock> {
    /// Creates a new `NonceManager` with the system clock.
    #[must_use]
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl<C: Clock> std::fmt::Debug for NonceManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceManager")
            .field("last_issued", &self.last_issued())
            .finish()
    }
}
