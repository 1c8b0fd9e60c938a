use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use url::Url;

const CSP_HEADER: &str = "content-security-policy";

/// Send a HEAD request to `raw_url` and parse candidate hosts out of the
/// response's Content-Security-Policy header.
///
/// Any received response is parsed regardless of status; only transport
/// failures (refused connection, timeout, DNS) are errors.
pub async fn fetch_csp(raw_url: &str, client: &Client) -> Result<Vec<String>> {
    let url = Url::parse(raw_url).with_context(|| format!("failed to parse URL {raw_url}"))?;

    let res = client
        .head(url.as_str())
        .send()
        .await
        .with_context(|| format!("failed to get CSP for {url}"))?;

    Ok(parse_csp(res.headers()))
}

/// Parse candidate source URLs out of a CSP header.
///
/// A missing header yields an empty list, which callers can tell apart from a
/// failed request. Sources that don't survive the filter are skipped silently.
pub fn parse_csp(headers: &HeaderMap) -> Vec<String> {
    let Some(csp) = headers.get(CSP_HEADER).and_then(|v| v.to_str().ok()) else {
        return Vec::new();
    };

    let mut urls = Vec::new();
    for directive in csp.split(';') {
        let mut sources = directive.split_whitespace();
        // First token is the directive name
        if sources.next().is_none() {
            continue;
        }

        for source in sources {
            if let Some(url) = filter_source(source) {
                urls.push(url);
            }
        }
    }

    urls
}

/// Normalization/filter pipeline for one CSP source token.
fn filter_source(source: &str) -> Option<String> {
    // CSP keywords and the bare wildcard are not hosts
    if source == "'self'" || source == "'none'" || source == "*" {
        return None;
    }

    // Remove wildcard port (":*") if present
    let source = source.replacen(":*", "", 1);

    // Default to https:// so schemeless sources parse as URLs
    let source = if source.contains("://") {
        source
    } else {
        format!("https://{source}")
    };

    let url = Url::parse(&source).ok()?;
    let host = url.host_str()?;

    // Skip if no TLD
    if !host.contains('.') {
        return None;
    }

    // Ignore wildcard subdomains
    if host.starts_with("*.") {
        return None;
    }

    Some(canonical_url(&url))
}

/// Render a URL without the trailing slash `Url` appends to a bare origin.
pub fn canonical_url(url: &Url) -> String {
    let rendered = url.to_string();
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        rendered.trim_end_matches('/').to_string()
    } else {
        rendered
    }
}
