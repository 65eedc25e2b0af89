use std::time::Duration;

use futures::future::BoxFuture;
use tracing::warn;

use autobrain_core::config::RetryConfig;
use autobrain_core::error::{AutobrainError, Result};
use autobrain_core::traits::{Completion, CompletionOptions};

/// A Completion client that retries transient provider failures.
///
/// Retries live here, at the client boundary; nodes never retry on their
/// own.
pub struct RetryingClient {
    inner: Box<dyn Completion>,
    retry_config: RetryConfig,
}

impl RetryingClient {
    pub fn new(inner: Box<dyn Completion>, retry_config: RetryConfig) -> Self {
        Self {
            inner,
            retry_config,
        }
    }
}

fn is_retryable(e: &AutobrainError) -> bool {
    match e {
        AutobrainError::Provider(msg) => {
            msg.contains("429")
                || msg.contains("500")
                || msg.contains("502")
                || msg.contains("503")
                || msg.contains("timeout")
                || msg.contains("connection")
        }
        _ => false,
    }
}

fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    let ms = (config.initial_backoff_ms * 2u64.pow(attempt)).min(config.max_backoff_ms);
    // Add jitter: 0.8x to 1.2x
    let jitter = 0.8 + rand::random::<f64>() * 0.4;
    Duration::from_millis((ms as f64 * jitter) as u64)
}

impl Completion for RetryingClient {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        opts: &'a CompletionOptions,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let max_retries = self.retry_config.max_retries;

            let mut last_err = None;
            for attempt in 0..=max_retries {
                match self.inner.complete(system, user, opts).await {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        if is_retryable(&e) && attempt < max_retries {
                            let backoff = calculate_backoff(attempt, &self.retry_config);
                            warn!(
                                attempt = attempt + 1,
                                max_retries,
                                backoff_ms = backoff.as_millis() as u64,
                                error = %e,
                                "Retrying completion request"
                            );
                            tokio::time::sleep(backoff).await;
                            last_err = Some(e);
                            continue;
                        }
                        return Err(e);
                    }
                }
            }

            Err(last_err
                .unwrap_or_else(|| AutobrainError::Provider("retries exhausted".into())))
        })
    }
}
