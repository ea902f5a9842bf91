use std::future::Future;
use std::time::Duration;

/// Attempts and backoff for per-row writes. The delay doubles after every
/// failed attempt: 2 s, then 4 s with the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    /// Runs `op` until it succeeds or the attempts are used up. Returns
    /// whether it eventually succeeded.
    pub async fn run<F, Fut, T, E>(&self, label: &str, mut op: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        for attempt in 0..self.max_attempts {
            match op().await {
                Ok(_) => return true,
                Err(e) => {
                    tracing::error!("Error upserting {} (attempt {}): {}", label, attempt + 1, e);
                }
            }
            if attempt + 1 < self.max_attempts {
                tokio::time::sleep(self.delay_after(attempt)).await;
            }
        }

        tracing::error!("Failed to upsert {} after {} attempts", label, self.max_attempts);
        false
    }

    /// Like [`RetryPolicy::run`], but a failed `check` fails at once without
    /// a single attempt. Invalid rows never become valid by waiting.
    pub async fn run_checked<C, F, Fut, T, E>(&self, label: &str, check: Result<(), C>, op: F) -> bool
    where
        C: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        if let Err(e) = check {
            tracing::error!("Skipping invalid {}: {}", label, e);
            return false;
        }
        self.run(label, op).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_default_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(0), Duration::from_secs(2));
        assert_eq!(policy.delay_after(1), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let ok = fast()
            .run("lead", || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient")
                } else {
                    Ok(())
                }
            })
            .await;
        assert!(ok);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let ok = fast()
            .run("lead", || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("down")
            })
            .await;
        assert!(!ok);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_row_is_not_attempted() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = RetryPolicy::default();
        let started = std::time::Instant::now();
        let ok = policy
            .run_checked("lead", Err("name must not be empty"), || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok::<(), &str>(())
            })
            .await;
        assert!(!ok);
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        assert!(started.elapsed() < policy.base_delay);
    }

    #[tokio::test]
    async fn test_valid_row_is_attempted() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let ok = fast()
            .run_checked("lead", Ok::<(), &str>(()), || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok::<(), &str>(())
            })
            .await;
        assert!(ok);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
