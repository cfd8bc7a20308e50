//! Retry with exponential backoff for the Apify client.
//!
//! Actor runs are slow and occasionally rejected under load, so transient
//! failures are retried. Credential and data errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound on a single backoff sleep.
const MAX_DELAY_SECS: u64 = 120;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Unavailable { .. } => true,
        ScraperError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        ScraperError::Auth { .. }
        | ScraperError::NotFound { .. }
        | ScraperError::UnexpectedStatus { .. }
        | ScraperError::Deserialize { .. }
        | ScraperError::InvalidBaseUrl { .. } => false,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` extra
/// times. The wait before retry `n` is `backoff_base_secs * 2^(n-1)` seconds
/// with ±25 % jitter, or the server's `Retry-After` when it asks for longer.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let base_ms = backoff_base_secs
            .saturating_mul(1u64 << attempt.min(20))
            .min(MAX_DELAY_SECS)
            .saturating_mul(1000);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let jittered_ms = (base_ms as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        let delay_ms = match &err {
            ScraperError::RateLimited { retry_after_secs } => {
                jittered_ms.max((*retry_after_secs).min(MAX_DELAY_SECS) * 1000)
            }
            _ => jittered_ms,
        };

        attempt += 1;
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient scraper error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
