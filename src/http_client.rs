use anyhow::Context;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Build the HTTP client shared by both pipeline stages.
///
/// Constructed explicitly and passed into each component rather than using a
/// process-wide default, so tests can inject their own and the per-request
/// timeout is always enforced.
pub fn create_scan_client(timeout_secs: u64) -> anyhow::Result<Client> {
    ClientBuilder::new()
        // Connection pooling - candidate hosts repeat across targets
        .pool_max_idle_per_host(50)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)
        // Timeouts - a stuck request must not hold pool capacity forever
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(5))
        // Compression
        .gzip(true)
        .brotli(true)
        // TLS
        .use_rustls_tls()
        .tls_sni(true)
        // Redirects
        .redirect(reqwest::redirect::Policy::limited(5))
        // User agent
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(create_scan_client(10).is_ok());
    }
}
