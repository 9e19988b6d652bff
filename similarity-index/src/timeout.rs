use crate::error::{Result, SimilarityError};
use crate::index::{Neighbor, SimilarityIndex};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deadline and retry policy for similarity queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Per-attempt deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts after the first one fails or times out
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_retries() -> u32 {
    1
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
        }
    }
}

/// Wraps an index so a slow or flaky backend surfaces as an error instead of
/// stalling the pipeline.
pub struct TimeoutIndex<I> {
    inner: I,
    config: TimeoutConfig,
}

impl<I: SimilarityIndex> TimeoutIndex<I> {
    pub fn new(inner: I, config: TimeoutConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }
}

#[async_trait]
impl<I: SimilarityIndex> SimilarityIndex for TimeoutIndex<I> {
    async fn nearest(&self, product_id: &str, k: usize) -> Result<Vec<Neighbor>> {
        let deadline = Duration::from_millis(self.config.timeout_ms);
        let attempts = self.config.retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match tokio::time::timeout(deadline, self.inner.nearest(product_id, k)).await {
                Ok(Ok(neighbors)) => return Ok(neighbors),
                Ok(Err(e)) => {
                    debug!("Attempt {attempt}/{attempts} for {product_id} failed: {e}");
                    last_error = Some(e);
                }
                Err(_) => {
                    debug!("Attempt {attempt}/{attempts} for {product_id} timed out");
                    last_error = None;
                }
            }
        }

        warn!("Similarity query for {product_id} gave up after {attempts} attempt(s)");
        Err(last_error.unwrap_or_else(|| SimilarityError::Timeout {
            product_id: product_id.to_string(),
            attempts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct SlowIndex;

    #[async_trait]
    impl SimilarityIndex for SlowIndex {
        async fn nearest(&self, _product_id: &str, _k: usize) -> Result<Vec<Neighbor>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![Neighbor::new("late", 1.0)])
        }
    }

    /// Fails the first `failures` calls, then answers
    struct FlakyIndex {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl SimilarityIndex for FlakyIndex {
        async fn nearest(&self, _product_id: &str, _k: usize) -> Result<Vec<Neighbor>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(SimilarityError::Unavailable("503".to_string()))
            } else {
                Ok(vec![Neighbor::new("b", 0.5)])
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let index = TimeoutIndex::new(
            SlowIndex,
            TimeoutConfig {
                timeout_ms: 100,
                retries: 2,
            },
        );

        let err = index.nearest("a", 5).await.expect_err("should time out");
        assert!(matches!(err, SimilarityError::Timeout { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let index = TimeoutIndex::new(
            FlakyIndex {
                failures: 1,
                calls: AtomicU32::new(0),
            },
            TimeoutConfig::default(),
        );

        let neighbors = index.nearest("a", 5).await.expect("retry succeeds");
        assert_eq!(neighbors, vec![Neighbor::new("b", 0.5)]);
        assert_eq!(index.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_last_error_is_reported() {
        let index = TimeoutIndex::new(
            FlakyIndex {
                failures: 10,
                calls: AtomicU32::new(0),
            },
            TimeoutConfig {
                timeout_ms: 1_000,
                retries: 1,
            },
        );

        let err = index.nearest("a", 5).await.expect_err("should fail");
        assert!(matches!(err, SimilarityError::Unavailable(_)));
    }
}
