// ============================================================================
// RETRY WITH BACKOFF
// ============================================================================
// Batch submissions go through `with_retry`. Only failures the error itself
// classifies as transient (rate limits, 5xx) are retried; anything else is
// returned after the first attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Errors that know whether trying again could help.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// How often and how patiently to retry. Injected wherever retries happen so
/// tests can use tiny delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Reads `DOCS_RETRY_MAX_ATTEMPTS`, `DOCS_RETRY_INITIAL_DELAY_MS` and
    /// `DOCS_RETRY_MAX_DELAY_MS`, falling back to the defaults for anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let millis = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        Self {
            max_attempts: std::env::var("DOCS_RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(defaults.max_attempts),
            initial_delay: millis("DOCS_RETRY_INITIAL_DELAY_MS").unwrap_or(defaults.initial_delay),
            max_delay: millis("DOCS_RETRY_MAX_DELAY_MS").unwrap_or(defaults.max_delay),
        }
    }

    /// Un-jittered delay after the given (1-based) failed attempt: the
    /// initial delay doubled per attempt, capped at `max_delay`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(31);
        self.initial_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay)
    }

    /// `base_delay` scaled by a jitter factor, clamped to 0.5..=1.0.
    pub fn jittered_delay(&self, attempt: u32, factor: f64) -> Duration {
        self.base_delay(attempt)
            .mul_f64(factor.clamp(0.5, 1.0))
    }
}

/// Runs `operation` until it succeeds, fails permanently, or the policy's
/// attempts are used up. Sleeps between attempts, never after the last one.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
                let delay = policy.jittered_delay(attempt, factor);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "{} failed with a transient error, retrying",
                    label
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    tracing::error!(attempts = attempt, error = %err, "{} gave up", label);
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum FakeError {
        RateLimited,
        BadRequest,
    }

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            matches!(self, FakeError::RateLimited)
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(), "submit", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(FakeError::RateLimited)
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = with_retry(&fast_policy(), "submit", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError::BadRequest) }
        })
        .await;

        assert!(matches!(result, Err(FakeError::BadRequest)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = with_retry(&fast_policy(), "submit", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError::RateLimited) }
        })
        .await;

        assert!(matches!(result, Err(FakeError::RateLimited)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_from_env_falls_back_to_defaults() {
        // The only test touching these variables, so no cross-test races.
        const VARS: [&str; 3] = [
            "DOCS_RETRY_MAX_ATTEMPTS",
            "DOCS_RETRY_INITIAL_DELAY_MS",
            "DOCS_RETRY_MAX_DELAY_MS",
        ];
        for var in VARS {
            std::env::remove_var(var);
        }
        assert_eq!(RetryPolicy::from_env(), RetryPolicy::default());

        std::env::set_var("DOCS_RETRY_MAX_ATTEMPTS", "5");
        std::env::set_var("DOCS_RETRY_INITIAL_DELAY_MS", " 250 ");
        std::env::set_var("DOCS_RETRY_MAX_DELAY_MS", "soon");
        assert_eq!(
            RetryPolicy::from_env(),
            RetryPolicy {
                max_attempts: 5,
                initial_delay: Duration::from_millis(250),
                max_delay: Duration::from_secs(30),
            }
        );

        std::env::set_var("DOCS_RETRY_MAX_ATTEMPTS", "0");
        assert_eq!(RetryPolicy::from_env().max_attempts, 3);
        std::env::set_var("DOCS_RETRY_MAX_ATTEMPTS", "three");
        assert_eq!(RetryPolicy::from_env().max_attempts, 3);

        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.base_delay(1), Duration::from_millis(100));
        assert_eq!(policy.base_delay(2), Duration::from_millis(200));
        assert_eq!(policy.base_delay(3), Duration::from_millis(400));
        assert_eq!(policy.base_delay(4), Duration::from_millis(500));
        assert_eq!(policy.base_delay(60), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_between_half_and_full() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.jittered_delay(1, 0.5), Duration::from_millis(500));
        assert_eq!(policy.jittered_delay(1, 1.0), Duration::from_secs(1));
        // Out-of-range factors are clamped.
        assert_eq!(policy.jittered_delay(1, 0.1), Duration::from_millis(500));
        assert_eq!(policy.jittered_delay(1, 3.0), Duration::from_secs(1));
    }
}
