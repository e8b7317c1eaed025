//! Retry with capped exponential backoff.
//!
//! ```no_run
//! use kieai_rs::{retry::retry, GenerateOptions, KieClient, KieConfig, RetryConfig};
//!
//! # async fn example() -> kieai_rs::Result<()> {
//! let client = KieClient::new(KieConfig::from_env());
//! let options = GenerateOptions::new();
//! let task_id = retry(&RetryConfig::default(), || {
//!     client.submit("a lighthouse at dawn", &options)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;

use crate::delay::delay;
use crate::types::RetryConfig;

/// Run `operation` until it succeeds or `config.max_retries` extra attempts
/// have failed.
///
/// After failed attempt `k` (0-indexed) waits [`RetryConfig::delay_for`]`(k)`.
/// Attempts never overlap. When the budget is spent, the error from the last
/// attempt is returned as-is.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < config.max_retries => {
                let wait = config.delay_for(attempt);
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = wait.as_millis() as u64,
                    "Operation failed, retrying"
                );
                delay(wait).await;
                attempt += 1;
            }
            Err(e) => {
                if config.max_retries > 0 {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts"
                    );
                }
                return Err(e);
            }
        }
    }
}
