//! fallback::probe
//!
//! Network reachability probes.
//!
//! The probe answers one question: can the hub's upstream be reached right
//! now? Failure is a state signal (offline), never an error. [`HttpProbe`]
//! issues a HEAD request on a private current-thread runtime; [`StaticProbe`]
//! gives tests and the disabled-check configuration a fixed answer.

use std::time::Duration;
use tracing::debug;

/// Seconds the HTTP probe waits before declaring the network unreachable.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// URL probed by default.
pub const DEFAULT_PROBE_URL: &str = "https://github.com";

/// A reachability check.
pub trait Reachability {
    /// Whether the upstream looks reachable right now.
    fn is_reachable(&self) -> bool;
}

/// HEAD-request probe with a short timeout.
///
/// Any response, regardless of status, counts as reachable; only transport
/// failures (DNS, connect, timeout) mean offline.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_URL)
    }
}

impl Reachability for HttpProbe {
    fn is_reachable(&self) -> bool {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                debug!(%err, "probe runtime unavailable, assuming offline");
                return false;
            }
        };

        runtime.block_on(async {
            let client = match reqwest::Client::builder().timeout(self.timeout).build() {
                Ok(client) => client,
                Err(err) => {
                    debug!(%err, "probe client unavailable, assuming offline");
                    return false;
                }
            };

            match client.head(&self.url).send().await {
                Ok(response) => {
                    debug!(url = %self.url, status = %response.status(), "probe reachable");
                    true
                }
                Err(err) => {
                    debug!(url = %self.url, %err, "probe failed, offline");
                    false
                }
            }
        })
    }
}

/// A probe with a fixed answer; used in tests and when the network check is
/// disabled.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl Reachability for StaticProbe {
    fn is_reachable(&self) -> bool {
        self.0
    }
}
