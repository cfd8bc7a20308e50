//! Retry with exponential backoff and jitter for the analysis client.

use std::future::Future;
use std::time::Duration;

use crate::error::AnalysisError;

const MAX_DELAY_MS: u64 = 60_000;

/// Timeouts, rate limits, 5xx and connection failures are transient.
pub(crate) fn is_retriable(err: &AnalysisError) -> bool {
    match err {
        AnalysisError::Timeout
        | AnalysisError::RateLimited { .. }
        | AnalysisError::Unavailable { .. } => true,
        AnalysisError::Http(e) => e.is_timeout() || e.is_connect(),
        AnalysisError::Auth { .. }
        | AnalysisError::UnexpectedStatus { .. }
        | AnalysisError::Malformed { .. }
        | AnalysisError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation`, retrying transient errors up to `max_retries` more times.
///
/// The sleep before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 %
/// jitter, capped at 60 s, and never shorter than a server `Retry-After`.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let mut delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                if let AnalysisError::RateLimited { retry_after_secs } = &err {
                    delay_ms = delay_ms.max(retry_after_secs.saturating_mul(1000).min(MAX_DELAY_MS));
                }
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "analysis API transient error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
