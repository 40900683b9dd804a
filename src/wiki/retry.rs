use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use smart_default::SmartDefault;
use tracing::warn;

use crate::wiki::error::RequestError;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct RetryPolicy {
    #[default = 3]
    pub max_attempts: u32,

    #[default(Duration::from_millis(500))]
    pub base_delay: Duration,

    #[default(Duration::from_secs(8))]
    pub max_delay: Duration,
}

/// The last error seen once a policy gives up.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub error: RequestError,
}

impl RetryPolicy {
    /// Retries without sleeping, for tests and local mirrors.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Deterministic schedule matching [`RetryPolicy::delay_for`]; the attempt
    /// budget, not elapsed time, ends a run.
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.base_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Runs `op` until it succeeds, fails permanently or attempts run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, Exhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let attempts = AtomicU32::new(0);

        let outcome = backoff::future::retry_notify(
            self.backoff(),
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                let call = op();
                async move {
                    call.await.map_err(|error| {
                        if error.is_transient() && attempt < max_attempts {
                            backoff::Error::transient(error)
                        } else {
                            backoff::Error::permanent(error)
                        }
                    })
                }
            },
            |error: RequestError, delay: Duration| {
                let attempt = attempts.load(Ordering::SeqCst);
                warn!(
                    "{what}: attempt {attempt}/{max_attempts} failed ({error}), retrying in {delay:?}"
                );
            },
        )
        .await;

        outcome.map_err(|error| Exhausted {
            attempts: attempts.load(Ordering::SeqCst),
            error,
        })
    }
}
