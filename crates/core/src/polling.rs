//! Bounded status polling.
//!
//! Webhook delivery can be delayed or unreachable, so observers re-read the
//! design request until it reaches a terminal state. The loop is bounded by
//! an attempt budget and always stops once the stop condition holds; it
//! never caches between reads.

use std::future::Future;
use std::time::Duration;

/// Reference client polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default attempt budget (10 minutes at the reference interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Policy that spends at most `budget` waiting between reads.
    pub fn within(interval: Duration, budget: Duration) -> Self {
        let attempts = if interval.is_zero() {
            1
        } else {
            (budget.as_nanos() / interval.as_nanos()).max(1)
        };
        Self {
            interval,
            max_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
        }
    }
}

/// Result of a polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The stop condition held for this value.
    Done(T),
    /// The attempt budget ran out; carries the last observed value.
    Exhausted(T),
}

impl<T> PollOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Done(v) | Self::Exhausted(v) => v,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Call `fetch` until `is_done` holds or `policy.max_attempts` reads were
/// made, sleeping `policy.interval` between reads. Fetch errors abort the
/// loop immediately.
pub async fn poll_until<T, E, F, Fut>(
    policy: PollPolicy,
    mut fetch: F,
    is_done: impl Fn(&T) -> bool,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let value = fetch().await?;
        if is_done(&value) {
            return Ok(PollOutcome::Done(value));
        }
        if attempt >= attempts {
            return Ok(PollOutcome::Exhausted(value));
        }
        attempt += 1;
        tokio::time::sleep(policy.interval).await;
    }
}
