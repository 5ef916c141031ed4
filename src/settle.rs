//! Waiting for a page's DOM to stop changing.
//!
//! A mutation counter is installed in the page and polled from the host.
//! The wait resolves once the counter has not moved for the debounce period.

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::clock::Clock;

pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_SETTLE_DEBOUNCE: Duration = Duration::from_millis(1_000);
pub const DEFAULT_SETTLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleOptions {
    /// Give up after this long
    pub timeout: Duration,
    /// Required quiet period
    pub debounce: Duration,
    pub poll_interval: Duration,
}

impl Default for SettleOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SETTLE_TIMEOUT,
            debounce: DEFAULT_SETTLE_DEBOUNCE,
            poll_interval: DEFAULT_SETTLE_POLL,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettleError {
    #[error("Timed out after {}ms whilst waiting for DOM to settle", .0.as_millis())]
    Timeout(Duration),

    #[error("Invalid settle poll interval: must be greater than zero")]
    InvalidPollInterval,

    #[error(transparent)]
    Page(#[from] anyhow::Error),
}

/// Page hooks used to observe DOM mutations
#[allow(async_fn_in_trait)]
pub trait MutationCounter {
    /// Start counting mutations of the document body. Must be idempotent.
    async fn install_mutation_counter(&self) -> anyhow::Result<()>;

    /// Mutations seen since the counter was installed
    async fn mutation_count(&self) -> anyhow::Result<u64>;
}

/// Wait until no mutation has been observed for `options.debounce`.
///
/// Returns the time spent waiting. The timeout counts the page round trips
/// as well as the poll sleeps.
pub async fn wait_for_dom_to_settle<P, C>(
    page: &P,
    options: &SettleOptions,
    clock: &C,
) -> Result<Duration, SettleError>
where
    P: MutationCounter,
    C: Clock,
{
    if options.poll_interval.is_zero() {
        return Err(SettleError::InvalidPollInterval);
    }

    let started = Instant::now();
    let mut polled = Duration::ZERO;
    // Whichever is longer: the poll sleeps or the wall time including page round trips
    let elapsed = |polled: Duration| polled.max(started.elapsed());

    page.install_mutation_counter().await?;
    let mut last_count = page.mutation_count().await?;
    let mut quiet = Duration::ZERO;

    while quiet < options.debounce {
        if elapsed(polled) >= options.timeout {
            return Err(SettleError::Timeout(options.timeout));
        }

        clock.sleep(options.poll_interval).await;
        polled += options.poll_interval;

        let count = page.mutation_count().await?;
        if count != last_count {
            last_count = count;
            quiet = Duration::ZERO;
        } else {
            quiet += options.poll_interval;
        }
    }

    let waited = elapsed(polled);
    debug!(
        "DOM settled after {}ms ({} mutations)",
        waited.as_millis(),
        last_count
    );
    Ok(waited)
}

#[cfg(test)]
#[path = "settle_test.rs"]
mod settle_test;
