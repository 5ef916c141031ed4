//! Time source used by the scroll and settle loops.

use std::time::Duration;

/// Something that can suspend the caller for a duration.
///
/// The scroller and the settle wait only ever measure time through this
/// trait, so tests can substitute a virtual clock and assert on the exact
/// delays requested instead of racing real timers.
#[allow(async_fn_in_trait)]
pub trait Clock {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
