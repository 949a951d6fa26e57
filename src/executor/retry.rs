use std::future::Future;
use std::time::Duration;

/// Longest single wait between attempts.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff settings for engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor)).min(MAX_DELAY)
    }
}

/// Retry a fallible engine call with exponential backoff.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, operation: &str, mut f: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if attempt > policy.max_retries {
                    if policy.max_retries > 0 {
                        tracing::error!(
                            operation = operation,
                            attempts = attempt,
                            "All retry attempts exhausted"
                        );
                    }
                    return Err(e);
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation = operation,
                    attempt = attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
