//! Retry-with-backoff decorator for query generators.
//!
//! Off by default: the stock policy makes a single attempt.

use super::generator::QueryGenerator;
use crate::types::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = no retry)
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Growth factor between delays
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    ///
    /// # Example
    ///
    /// With 500ms initial, x2, cap 8s: 500ms, 1s, 2s, 4s, 8s, 8s, ...
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(32) as i32;
        let ms = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(exp);
        Duration::from_millis(ms.min(self.max_backoff_ms as f64) as u64)
    }

    /// Whether this policy ever retries.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }
}

/// Wraps a generator and retries recoverable failures.
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: QueryGenerator> RetryingGenerator<G> {
    /// Wrap `inner` with `policy`.
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Active policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<G: QueryGenerator> QueryGenerator for RetryingGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < attempts && e.is_recoverable() => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying LLM request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails `failures` times with `error`, then answers.
    struct Flaky {
        calls: Arc<AtomicU32>,
        failures: u32,
        error: GenerationError,
    }

    #[async_trait]
    impl QueryGenerator for Flaky {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok("SELECT 1".to_string())
            }
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_growth_and_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(4), Duration::from_millis(4000));
        assert_eq!(policy.backoff(10), Duration::from_millis(8000));
        assert!(!policy.is_enabled());
    }

    #[tokio::test]
    async fn test_default_policy_makes_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let gen = RetryingGenerator::new(
            Flaky {
                calls: calls.clone(),
                failures: 1,
                error: GenerationError::Transport("reset".into()),
            },
            RetryPolicy::default(),
        );

        assert!(gen.generate("q").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_recoverable_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let gen = RetryingGenerator::new(
            Flaky {
                calls: calls.clone(),
                failures: 2,
                error: GenerationError::Api { status: 503, body: String::new() },
            },
            fast_policy(3),
        );

        assert_eq!(gen.generate("q").await.unwrap(), "SELECT 1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let gen = RetryingGenerator::new(
            Flaky {
                calls: calls.clone(),
                failures: 5,
                error: GenerationError::Api { status: 401, body: "bad key".into() },
            },
            fast_policy(3),
        );

        let err = gen.generate("q").await.unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: 401, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
