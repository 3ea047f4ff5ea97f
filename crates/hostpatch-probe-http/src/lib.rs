// # HTTP Liveness Oracle
//
// This crate provides the HTTP-based liveness oracle for the hostpatch system.
//
// ## Behavior
//
// A recorded address is checked with a single plain-HTTP `GET /`, sent to
// the address itself but carrying the virtual host's name in the `Host`
// header. A shared address serving several virtual hosts is therefore probed
// for the one host being validated.
//
// - `200 OK` → live
// - Any other status (redirects included) → stale
// - Connection errors and timeouts → stale
//
// There is no retry: a failed probe is a definitive answer.

use async_trait::async_trait;
use hostpatch_core::config::ProbeConfig;
use hostpatch_core::traits::LivenessOracle;
use hostpatch_core::{Error, Result};

use reqwest::StatusCode;
use reqwest::header::HOST;
use reqwest::redirect::Policy;
use std::time::Duration;

/// Default probe timeout (15 seconds)
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP liveness oracle
#[derive(Debug, Clone)]
pub struct HttpLivenessOracle {
    /// HTTP client (timeout applied, redirects and proxies disabled)
    client: reqwest::Client,

    /// Per-probe timeout
    timeout: Duration,
}

impl HttpLivenessOracle {
    /// Create a new HTTP oracle with the given per-probe timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::probe("Probe timeout must be > 0"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .no_proxy()
            .build()
            .map_err(|e| Error::probe(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Create an oracle from probe configuration
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Per-probe timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL probed for `address`
    pub fn probe_url(address: &str) -> String {
        format!("http://{}/", address)
    }
}

#[async_trait]
impl LivenessOracle for HttpLivenessOracle {
    async fn is_stale(&self, address: &str, host: &str) -> bool {
        let url = Self::probe_url(address);

        let response = match self.client.get(&url).header(HOST, host).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Probe of {} (host {}) failed: {}", url, host, e);
                return true;
            }
        };

        let status = response.status();
        let stale = status != StatusCode::OK;
        tracing::debug!("Probe of {} (host {}) answered {}", url, host, status);

        stale
    }

    fn oracle_name(&self) -> &'static str {
        "http"
    }
}
