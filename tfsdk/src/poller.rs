//! Long-running operation polling
//!
//! A remote client returns a [`PollerType`] for operations that complete asynchronously.
//! [`Poller::poll_until_done`] drives it to a terminal status, sleeping between polls for
//! the interval the remote asks for (never less than the minimum) and stopping with an
//! error at the context deadline.

use crate::context::Context;
use crate::error::{RemoteError, Result, SdkError};
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingStatus {
    InProgress,
    Succeeded,
    Failed,
    Cancelled,
}

impl PollingStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollingStatus::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollResult {
    pub status: PollingStatus,
    /// Interval the remote asked for before the next poll, e.g. from `Retry-After`.
    pub poll_interval: Option<Duration>,
    pub message: Option<String>,
}

impl PollResult {
    pub fn in_progress(poll_interval: Option<Duration>) -> Self {
        Self {
            status: PollingStatus::InProgress,
            poll_interval,
            message: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            status: PollingStatus::Succeeded,
            poll_interval: None,
            message: None,
        }
    }

    pub fn failed(status: PollingStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            poll_interval: None,
            message: Some(message.into()),
        }
    }
}

/// One poll of a long-running operation.
#[async_trait]
pub trait PollerType: Send + Sync {
    async fn poll(&self, ctx: &Context) -> std::result::Result<PollResult, RemoteError>;
}

pub struct Poller<'a> {
    inner: Box<dyn PollerType + 'a>,
    min_interval: Duration,
}

impl<'a> Poller<'a> {
    pub fn new(inner: Box<dyn PollerType + 'a>, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
        }
    }

    /// Polls until the operation reaches a terminal status.
    ///
    /// `Failed` and `Cancelled` become [`RemoteError::PollingFailed`]. The context deadline
    /// bounds both each poll and the sleeps in between.
    pub async fn poll_until_done(&self, ctx: &Context) -> Result<()> {
        let mut attempt: u32 = 0;
        loop {
            ctx.check()?;
            attempt += 1;

            let result = ctx.bound(self.inner.poll(ctx)).await??;
            tracing::debug!(attempt, status = ?result.status, "polled long running operation");

            match result.status {
                PollingStatus::Succeeded => return Ok(()),
                PollingStatus::Failed | PollingStatus::Cancelled => {
                    return Err(SdkError::Remote(RemoteError::PollingFailed {
                        status: format!("{:?}", result.status),
                        message: result.message.unwrap_or_default(),
                    }));
                }
                PollingStatus::InProgress => {
                    let wait = result
                        .poll_interval
                        .map_or(self.min_interval, |interval| interval.max(self.min_interval));
                    ctx.sleep(wait).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        polls: Arc<AtomicUsize>,
        succeed_after: usize,
        fail: bool,
    }

    #[async_trait]
    impl PollerType for Scripted {
        async fn poll(&self, _ctx: &Context) -> std::result::Result<PollResult, RemoteError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < self.succeed_after {
                return Ok(PollResult::in_progress(None));
            }
            if self.fail {
                Ok(PollResult::failed(PollingStatus::Failed, "quota exceeded"))
            } else {
                Ok(PollResult::succeeded())
            }
        }
    }

    fn scripted(succeed_after: usize, fail: bool) -> (Scripted, Arc<AtomicUsize>) {
        let polls = Arc::new(AtomicUsize::new(0));
        (
            Scripted {
                polls: polls.clone(),
                succeed_after,
                fail,
            },
            polls,
        )
    }

    #[tokio::test]
    async fn polls_until_succeeded() {
        let (inner, polls) = scripted(3, false);
        let poller = Poller::new(Box::new(inner), Duration::from_millis(1));

        poller.poll_until_done(&Context::new()).await.unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_status_is_an_error() {
        let (inner, _) = scripted(1, true);
        let poller = Poller::new(Box::new(inner), Duration::from_millis(1));

        let err = poller.poll_until_done(&Context::new()).await.unwrap_err();

        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn deadline_stops_polling() {
        let (inner, _) = scripted(usize::MAX, false);
        let poller = Poller::new(Box::new(inner), Duration::from_millis(5));
        let ctx = Context::new().with_timeout(Duration::from_millis(40));

        let err = poller.poll_until_done(&ctx).await.unwrap_err();

        assert!(err.is_timeout());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!PollingStatus::InProgress.is_terminal());
        assert!(PollingStatus::Succeeded.is_terminal());
        assert!(PollingStatus::Cancelled.is_terminal());
    }
}
