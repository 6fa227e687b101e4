//! Context implementation for deadlines and cancellation
//!
//! Every lifecycle operation runs under a `Context`. Child contexts created with
//! [`Context::with_timeout`] share the parent's cancellation signal and never extend
//! the parent's deadline.

use crate::error::{Result, SdkError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Context carries the deadline and cancellation signal of one operation.
/// Pass it as the first parameter to every async lifecycle method.
#[derive(Clone)]
pub struct Context {
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    cancel: Arc<watch::Sender<bool>>,
}

impl Context {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            deadline: None,
            timeout: None,
            cancel: Arc::new(cancel),
        }
    }

    /// Returns a child context whose deadline is the earlier of the parent's and `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let (deadline, timeout) = match self.deadline {
            Some(existing) if existing <= candidate => (existing, self.timeout.unwrap_or(timeout)),
            _ => (candidate, timeout),
        };

        Self {
            deadline: Some(deadline),
            timeout: Some(timeout),
            cancel: self.cancel.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when the context has no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.deadline_passed()
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Returns an error when the context was cancelled or its deadline passed.
    pub fn check(&self) -> Result<()> {
        if *self.cancel.borrow() {
            return Err(SdkError::Cancelled);
        }
        if self.deadline_passed() {
            return Err(SdkError::DeadlineExceeded(self.timeout.unwrap_or_default()));
        }
        Ok(())
    }

    /// Sleeps for `duration`, waking early with an error on cancellation or at the deadline.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.check()?;

        let wait = match self.remaining() {
            Some(remaining) if remaining < duration => remaining,
            _ => duration,
        };

        let mut cancelled = self.cancel.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancelled.wait_for(|cancelled| *cancelled) => {}
        }

        self.check()
    }

    /// Runs `future` to completion unless the context is cancelled or its deadline passes first.
    pub async fn bound<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        self.check()?;

        let mut cancelled = self.cancel.subscribe();
        let deadline = async {
            match self.remaining() {
                Some(remaining) => tokio::time::sleep(remaining).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            output = future => Ok(output),
            _ = deadline => Err(SdkError::DeadlineExceeded(self.timeout.unwrap_or_default())),
            _ = cancelled.wait_for(|cancelled| *cancelled) => Err(SdkError::Cancelled),
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
