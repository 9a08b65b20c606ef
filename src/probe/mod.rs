//! Connectivity Prober
//!
//! Live reachability checks for candidate endpoints: one GET to a stable
//! external target, routed through the candidate SOCKS5 proxy, bounded by the
//! configured timeout.

use crate::config::ProbeConfig;
use crate::endpoint::Endpoint;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of a single connectivity probe.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// The target answered with a status classified as reachable.
    Success { status: u16, elapsed: Duration },
    /// The target answered with a failing status, or the transport failed.
    Failure { reason: String, elapsed: Duration },
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }
}

/// Probe success classification. 403 is a policy response from the target,
/// which still proves the endpoint carries traffic; every other status at or
/// above 400 is a failure.
pub fn is_success_status(status: u16) -> bool {
    status < 400 || status == 403
}

/// Performs connectivity checks through candidate endpoints.
pub struct ConnectivityProber {
    target_url: String,
    timeout: Duration,
}

impl ConnectivityProber {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            target_url: config.target_url.clone(),
            timeout: config.timeout,
        }
    }

    /// Issue one GET to the probe target through `endpoint` and classify the
    /// result. Transport failures (refused, timeout, TLS, DNS) are reported
    /// as [`ProbeOutcome::Failure`], never as an error.
    pub async fn check(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let start = Instant::now();
        match self.request(endpoint).await {
            Ok(status) if is_success_status(status) => {
                let elapsed = start.elapsed();
                info!(
                    "Probe succeeded for {}: status={} ({:.1}s)",
                    endpoint,
                    status,
                    elapsed.as_secs_f64()
                );
                ProbeOutcome::Success { status, elapsed }
            }
            Ok(status) => {
                let elapsed = start.elapsed();
                warn!(
                    "Probe failed for {}: status={} ({:.1}s)",
                    endpoint,
                    status,
                    elapsed.as_secs_f64()
                );
                ProbeOutcome::Failure {
                    reason: format!("connectivity-failed-{}", status),
                    elapsed,
                }
            }
            Err(err) => {
                let elapsed = start.elapsed();
                warn!(
                    "Probe failed for {}: {} ({:.1}s)",
                    endpoint,
                    err,
                    elapsed.as_secs_f64()
                );
                ProbeOutcome::Failure {
                    reason: format!("connectivity-error: {}", err),
                    elapsed,
                }
            }
        }
    }

    async fn request(&self, endpoint: &Endpoint) -> std::result::Result<u16, reqwest::Error> {
        let proxy = reqwest::Proxy::all(endpoint.as_str())?;
        let client = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .build()?;
        let response = client.get(&self.target_url).send().await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2xx_and_3xx_are_success() {
        assert!(is_success_status(200));
        assert!(is_success_status(204));
        assert!(is_success_status(301));
        assert!(is_success_status(399));
    }

    #[test]
    fn test_403_is_success() {
        assert!(is_success_status(403));
    }

    #[test]
    fn test_other_4xx_and_5xx_are_failure() {
        assert!(!is_success_status(400));
        assert!(!is_success_status(404));
        assert!(!is_success_status(429));
        assert!(!is_success_status(500));
        assert!(!is_success_status(502));
    }
}
