use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Doubling backoff for the startup connection, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Default delays with `attempts` tries (at least one).
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            ..Self::default()
        }
    }

    /// Pause after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

/// Run `operation` until it succeeds or `policy` runs out of attempts.
///
/// Every attempt is logged against `target`, which must already be stripped
/// of credentials.
///
/// ```ignore
/// let db = retry_with_backoff(&config.redacted_url(), RetryPolicy::default(), || {
///     connect_with_options(options.clone())
/// })
/// .await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    target: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;

    loop {
        info!(
            database = %target,
            attempt,
            attempts = policy.attempts,
            "Connecting to database"
        );

        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.attempts => {
                warn!(database = %target, attempt, error = %e, "Giving up on database");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    database = %target,
                    attempt,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Database connection failed"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
