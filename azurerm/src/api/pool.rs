//! HTTP transport settings and request counters for the ARM client

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub struct ConnectionPoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
    pub user_agent: String,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(30)),
            user_agent: format!("terraform-provider-azurerm/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ConnectionPoolConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.idle_timeout)
            .pool_max_idle_per_host(self.max_idle_per_host);

        if let Some(keepalive) = self.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder.build()
    }
}

/// How one attempt against ARM ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestOutcome {
    Succeeded,
    Throttled,
    Failed,
}

/// A point-in-time copy of [`RequestCounters`].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub throttled_requests: u64,
    pub retried_requests: u64,
}

/// Attempt counters shared by every clone of a client.
#[derive(Debug, Default)]
pub struct RequestCounters {
    total: AtomicU64,
    failed: AtomicU64,
    throttled: AtomicU64,
    retried: AtomicU64,
}

impl RequestCounters {
    pub fn record(&self, outcome: RequestOutcome) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match outcome {
            RequestOutcome::Succeeded => {}
            RequestOutcome::Throttled => {
                self.throttled.fetch_add(1, Ordering::Relaxed);
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            RequestOutcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConnectionStats {
        ConnectionStats {
            total_requests: self.total.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            throttled_requests: self.throttled.load(Ordering::Relaxed),
            retried_requests: self.retried.load(Ordering::Relaxed),
        }
    }
}
