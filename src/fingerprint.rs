use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Public registry of subdomain-takeover fingerprints, maintained at
/// https://github.com/EdOverflow/can-i-take-over-xyz
pub const DEFAULT_FINGERPRINT_URL: &str =
    "https://raw.githubusercontent.com/EdOverflow/can-i-take-over-xyz/refs/heads/master/fingerprints.json";

/// One detection rule from the fingerprint registry: a set of CNAMEs a
/// vulnerable service answers under, paired with either an NXDOMAIN check or
/// a response-body regex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub cname: Vec<String>,
    #[serde(default)]
    pub discussion: String,
    pub fingerprint: String,
    pub nxdomain: bool,
    #[serde(default)]
    pub service: String,
    pub vulnerable: bool,
}

impl Fingerprint {
    /// Exact host membership in the CNAME set; no suffix or substring matching.
    pub fn applies_to(&self, host: &str) -> bool {
        self.cname.iter().any(|cname| cname == host)
    }
}

/// Keep only the entries marked vulnerable, preserving registry order.
pub fn retain_vulnerable(fingerprints: Vec<Fingerprint>) -> Vec<Fingerprint> {
    fingerprints.into_iter().filter(|f| f.vulnerable).collect()
}

/// Fetch the fingerprint database and drop non-vulnerable entries.
///
/// A fetch or parse failure here is fatal to the whole run; it happens once,
/// before the pipeline starts.
pub async fn fetch_fingerprints(url: &str, client: &Client) -> Result<Vec<Fingerprint>> {
    let res = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch fingerprint database from {url}"))?;

    let fingerprints: Vec<Fingerprint> = res
        .json()
        .await
        .context("failed to parse fingerprint database")?;

    Ok(retain_vulnerable(fingerprints))
}
