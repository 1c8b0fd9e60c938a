use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

use crate::fingerprint::Fingerprint;

/// Outcome of a DNS host lookup, reduced to what the matcher cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Resolved,
    NotFound,
}

/// DNS lookup seam. The production impl wraps hickory; tests substitute a
/// stub so NXDOMAIN verdicts don't depend on live DNS.
#[async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup_host(&self, host: &str) -> Result<LookupOutcome>;
}

/// System resolver backed by hickory.
pub struct DnsLookup {
    resolver: TokioAsyncResolver,
}

impl DnsLookup {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for DnsLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostLookup for DnsLookup {
    async fn lookup_host(&self, host: &str) -> Result<LookupOutcome> {
        match self.resolver.lookup_ip(host).await {
            Ok(_) => Ok(LookupOutcome::Resolved),
            // Only a definitive no-such-host answer counts as NXDOMAIN;
            // network and timeout failures propagate as errors.
            Err(err) if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                Ok(LookupOutcome::NotFound)
            }
            Err(err) => {
                Err(anyhow::Error::new(err).context(format!("DNS lookup failed for {host}")))
            }
        }
    }
}

/// Decides whether a candidate host looks vulnerable to subdomain takeover.
///
/// Holds the fingerprint database (read-only, shared across all stage-2
/// workers) plus the HTTP client and DNS resolver used for verification.
pub struct TakeoverMatcher {
    client: Client,
    lookup: Arc<dyn HostLookup>,
    fingerprints: Vec<Fingerprint>,
}

impl TakeoverMatcher {
    pub fn new(client: Client, lookup: Arc<dyn HostLookup>, fingerprints: Vec<Fingerprint>) -> Self {
        Self {
            client,
            lookup,
            fingerprints,
        }
    }

    /// Check whether `raw_url` may be vulnerable to subdomain takeover.
    ///
    /// Only the host is used for fingerprint matching; the first fingerprint
    /// whose CNAME set contains it wins. Verification is a single DNS lookup
    /// (nxdomain fingerprints) or a single GET plus body-regex match; no
    /// retries.
    pub async fn check(&self, raw_url: &str) -> Result<bool> {
        let url = Url::parse(raw_url).with_context(|| format!("failed to parse URL {raw_url}"))?;
        let host = url
            .host_str()
            .with_context(|| format!("URL {raw_url} has no host"))?;

        let Some(fingerprint) = self.fingerprints.iter().find(|f| f.applies_to(host)) else {
            // Host is not a recognized service pattern
            return Ok(false);
        };

        if fingerprint.nxdomain {
            return match self.lookup.lookup_host(host).await? {
                LookupOutcome::NotFound => Ok(true),
                LookupOutcome::Resolved => Ok(false),
            };
        }

        let regex = Regex::new(&fingerprint.fingerprint).with_context(|| {
            format!(
                "failed to compile vulnerability detection fingerprint {:?}",
                fingerprint.fingerprint
            )
        })?;

        self.check_response(raw_url, &regex).await
    }

    /// GET the URL and test the fingerprint regex against the full body.
    async fn check_response(&self, url: &str, regex: &Regex) -> Result<bool> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to GET {url}"))?;

        let body = res
            .text()
            .await
            .with_context(|| format!("failed to read response body from {url}"))?;

        Ok(regex.is_match(&body))
    }
}
