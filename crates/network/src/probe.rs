// crates/network/src/probe.rs
//! Site reachability probes

use crate::client::Client;
use std::time::{Duration, Instant};

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one reachability check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteStatus {
    pub reachable: bool,
    pub latency: Duration,
}

/// Bounded pre-flight check against a publisher site.
///
/// Used to show site health before a job starts; never blocks or gates
/// a download.
#[derive(Clone)]
pub struct SiteProbe {
    client: Client,
    timeout: Duration,
}

impl SiteProbe {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// HEADs the site. Any HTTP answer counts as reachable; transport
    /// failures and timeouts do not.
    pub async fn check(&self, url: &str) -> SiteStatus {
        let start = Instant::now();
        let reachable = matches!(
            tokio::time::timeout(self.timeout, self.client.head(url)).await,
            Ok(Ok(_))
        );
        SiteStatus {
            reachable,
            latency: start.elapsed(),
        }
    }
}
