//! HTTP transport settings and request accounting for the Boundary client

use reqwest::StatusCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const USER_AGENT: &str = concat!("terraform-provider-boundary/", env!("CARGO_PKG_VERSION"));

/// Settings applied to the shared reqwest client
#[derive(Debug, Clone)]
pub struct ConnectionPoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// Upper bound for one API call; controller-led worker creation and
    /// Vault-backed credential stores can take several seconds.
    pub request_timeout: Duration,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 8,
            idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ConnectionPoolConfig {
    pub fn build_client(&self, tls_insecure: bool) -> Result<reqwest::Client, reqwest::Error> {
        if tls_insecure {
            tracing::warn!("TLS certificate verification is disabled for the Boundary controller");
        }
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(tls_insecure)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.idle_timeout)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .build()
    }
}

/// Snapshot of [`RequestCounters`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RequestStats {
    pub succeeded: u64,
    pub not_found: u64,
    pub conflicts: u64,
    /// Any other non-success status
    pub rejected: u64,
    /// No response at all
    pub transport_errors: u64,
}

impl RequestStats {
    pub fn total(&self) -> u64 {
        self.succeeded + self.not_found + self.conflicts + self.rejected + self.transport_errors
    }
}

/// Per-outcome request counts, shared by every handle of a client
#[derive(Debug, Default)]
pub struct RequestCounters {
    succeeded: AtomicU64,
    not_found: AtomicU64,
    conflicts: AtomicU64,
    rejected: AtomicU64,
    transport_errors: AtomicU64,
}

impl RequestCounters {
    pub fn record_status(&self, status: StatusCode) {
        let counter = match status {
            s if s.is_success() => &self.succeeded,
            StatusCode::NOT_FOUND => &self.not_found,
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => &self.conflicts,
            _ => &self.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RequestStats {
        RequestStats {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_outcome() {
        let counters = RequestCounters::default();
        counters.record_status(StatusCode::OK);
        counters.record_status(StatusCode::NO_CONTENT);
        counters.record_status(StatusCode::NOT_FOUND);
        counters.record_status(StatusCode::PRECONDITION_FAILED);
        counters.record_status(StatusCode::FORBIDDEN);
        counters.record_transport_error();

        let stats = counters.snapshot();
        assert_eq!(
            stats,
            RequestStats {
                succeeded: 2,
                not_found: 1,
                conflicts: 1,
                rejected: 1,
                transport_errors: 1,
            }
        );
        assert_eq!(stats.total(), 6);
    }

    #[test]
    fn builds_insecure_client() {
        assert!(ConnectionPoolConfig::default().build_client(true).is_ok());
    }
}
