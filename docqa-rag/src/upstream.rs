//! Deadlines for calls to external model services.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{RagError, Result};

/// Run `call` under an optional deadline.
///
/// Expiry maps to [`RagError::UpstreamTimeout`]; the call is dropped, not
/// retried.
pub(crate) async fn with_deadline<T, F>(
    operation: &'static str,
    limit: Option<Duration>,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(timeout) = limit else {
        return call.await;
    };
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?timeout, "upstream call timed out");
            Err(RagError::UpstreamTimeout { operation, timeout })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let result: Result<()> = with_deadline("embedding", Some(Duration::from_secs(1)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(RagError::UpstreamTimeout { operation: "embedding", .. })));
    }

    #[tokio::test]
    async fn no_limit_passes_result_through() {
        let result = with_deadline("generation", None, async { Ok(7) }).await.unwrap();
        assert_eq!(result, 7);
    }
}
