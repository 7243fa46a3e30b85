//! Scoped timeout and cancellation for in-flight requests.
//!
//! The timer is owned by the racing scope rather than armed globally, so
//! it is dropped on every exit path regardless of how the request settles.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

/// Await `fut`, racing it against cancellation.
///
/// A timer is armed only when a timeout is present and the caller did not
/// supply a token of their own; a supplied token puts cancellation
/// entirely in the caller's hands. Either way the loser of the race is
/// dropped when this scope exits.
pub(crate) async fn run<F, T>(
    fut: F,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    let deadline = match (&cancel, timeout) {
        (None, Some(duration)) => Some(duration),
        _ => None,
    };
    let token = cancel.unwrap_or_default();

    tokio::pin!(fut);

    match deadline {
        Some(duration) => {
            tokio::select! {
                result = &mut fut => result,
                _ = tokio::time::sleep(duration) => Err(FetchError::Cancelled),
            }
        }
        None => {
            tokio::select! {
                result = &mut fut => result,
                _ = token.cancelled() => Err(FetchError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle_after(delay: Duration) -> Result<u32, FetchError> {
        tokio::time::sleep(delay).await;
        Ok(7)
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_before_deadline() {
        let result = run(
            settle_after(Duration::from_millis(10)),
            Some(Duration::from_secs(1)),
            None,
        )
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let result = run(
            settle_after(Duration::from_secs(60)),
            Some(Duration::from_millis(1)),
            None,
        )
        .await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timeout_no_token_just_awaits() {
        let result = run(settle_after(Duration::from_secs(5)), None, None).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supplied_token_cancels() {
        let token = CancellationToken::new();
        let trigger = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            trigger.cancel();
        });

        let result = run(
            settle_after(Duration::from_secs(60)),
            None,
            Some(token),
        )
        .await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_supplied_token_disables_timer() {
        // With a caller token present, the timeout must not arm a timer.
        let token = CancellationToken::new();
        let result = run(
            settle_after(Duration::from_secs(10)),
            Some(Duration::from_millis(1)),
            Some(token),
        )
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_passes_through() {
        let result: Result<u32, FetchError> = run(
            async { Err(FetchError::InvalidFormPayload) },
            Some(Duration::from_secs(1)),
            None,
        )
        .await;
        assert!(matches!(result, Err(FetchError::InvalidFormPayload)));
    }
}
