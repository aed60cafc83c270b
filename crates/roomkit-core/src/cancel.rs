use std::future::Future;
use std::time::Duration;

pub use tokio_util::sync::CancellationToken;

/// Outcome of racing a future against a timeout and a cancellation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    TimedOut,
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Completed(v) => Some(v),
            _ => None,
        }
    }
}

/// Runs `fut` to completion unless `timeout` elapses first or `token` is
/// cancelled first — used to bound every suspension point named in the
/// concurrency model (hook execution, identity resolution, section hold
/// time).
pub async fn run_bounded<F, T>(fut: F, timeout: Duration, token: &CancellationToken) -> Outcome<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        result = fut => Outcome::Completed(result),
        _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
        _ = token.cancelled() => Outcome::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_when_faster_than_timeout() {
        let token = CancellationToken::new();
        let outcome = run_bounded(async { 42 }, Duration::from_millis(50), &token).await;
        assert_eq!(outcome, Outcome::Completed(42));
    }

    #[tokio::test]
    async fn times_out_when_slower_than_budget() {
        let token = CancellationToken::new();
        let outcome = run_bounded(
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                42
            },
            Duration::from_millis(5),
            &token,
        )
        .await;
        assert_eq!(outcome, Outcome::TimedOut);
    }

    #[tokio::test]
    async fn cancellation_wins_over_a_pending_future() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = run_bounded(
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                42
            },
            Duration::from_millis(100),
            &token,
        )
        .await;
        assert_eq!(outcome, Outcome::Cancelled);
    }
}
