use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::csp;
use crate::takeover::TakeoverMatcher;

/// Stage 2's worker ceiling when uncapped; its input size is unknown up
/// front, so "one worker per item" would risk unbounded socket usage.
pub const DEFAULT_SECONDARY_WORKERS: usize = 1000;

/// Unit of both pipeline streams and the final output.
///
/// A result carrying an error makes no vulnerability judgment; `vulnerable`
/// is only meaningful when `error` is `None`. The error is stored as its
/// rendered chain so results stay cheap to clone and structurally comparable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub primary_url: String,
    pub secondary_url: String,
    pub vulnerable: bool,
    pub error: Option<String>,
}

impl ScanResult {
    /// Stage-1 emission: a candidate host discovered in `primary`'s CSP,
    /// not yet verified.
    pub fn candidate(primary: &str, secondary: &str) -> Self {
        Self {
            primary_url: primary.to_string(),
            secondary_url: secondary.to_string(),
            vulnerable: false,
            error: None,
        }
    }

    /// Stage-2 emission: a verified verdict for a candidate.
    pub fn verdict(primary: &str, secondary: &str, vulnerable: bool) -> Self {
        Self {
            primary_url: primary.to_string(),
            secondary_url: secondary.to_string(),
            vulnerable,
            error: None,
        }
    }

    /// A failed item, from either stage. Carries no verdict.
    pub fn failure(primary: &str, secondary: &str, error: &anyhow::Error) -> Self {
        Self {
            primary_url: primary.to_string(),
            secondary_url: secondary.to_string(),
            vulnerable: false,
            error: Some(format!("{error:#}")),
        }
    }
}

/// Stage 1: run the CSP extractor over every input URL.
///
/// One worker per URL, admitted by a semaphore sized to `limit` (or
/// `input.len()` when 0). Each worker emits one candidate result per host in
/// its URL's CSP, in CSP source order, or exactly one failure result. The
/// candidate stream closes once every worker has finished; that close is the
/// only termination signal stage 2 gets.
pub async fn process_primary_urls(
    input: Vec<String>,
    tx: mpsc::Sender<ScanResult>,
    limit: usize,
    client: Client,
) {
    let limit = if limit == 0 { input.len().max(1) } else { limit };
    let semaphore = Arc::new(Semaphore::new(limit));

    let mut workers = FuturesUnordered::new();
    for url in input {
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        let client = client.clone();

        workers.push(tokio::spawn(async move {
            // Held for the single extraction and dropped on every exit path,
            // so a failed request never leaks pool capacity.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("admission pool closed");

            match csp::fetch_csp(&url, &client).await {
                Ok(candidates) => {
                    for candidate in candidates {
                        if tx.send(ScanResult::candidate(&url, &candidate)).await.is_err() {
                            // Receiver dropped; nothing downstream to feed
                            return;
                        }
                    }
                }
                Err(error) => {
                    let _ = tx.send(ScanResult::failure(&url, "", &error)).await;
                }
            }
        }));
    }
    drop(tx);

    while let Some(joined) = workers.next().await {
        if let Err(error) = joined {
            tracing::error!(error = %error, "primary scan worker panicked");
        }
    }
}

/// Stage 2: verify every candidate from stage 1 against the fingerprints.
///
/// Consumes candidates as they arrive, spawning one worker per clean record,
/// admitted by a semaphore sized to `limit` (or 1000 when 0). Records that
/// already carry a stage-1 error are forwarded to the output untouched so the
/// sink sees extraction failures too. The output stream closes once the input
/// stream has closed and every worker has finished.
pub async fn process_secondary_urls(
    mut rx: mpsc::Receiver<ScanResult>,
    tx: mpsc::Sender<ScanResult>,
    limit: usize,
    matcher: Arc<TakeoverMatcher>,
) {
    let limit = if limit == 0 { DEFAULT_SECONDARY_WORKERS } else { limit };
    let semaphore = Arc::new(Semaphore::new(limit));

    let mut workers = FuturesUnordered::new();
    while let Some(item) = rx.recv().await {
        if item.error.is_some() {
            if tx.send(item).await.is_err() {
                return;
            }
            continue;
        }

        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        let matcher = Arc::clone(&matcher);

        workers.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("admission pool closed");

            let result = match matcher.check(&item.secondary_url).await {
                Ok(vulnerable) => {
                    ScanResult::verdict(&item.primary_url, &item.secondary_url, vulnerable)
                }
                Err(error) => {
                    ScanResult::failure(&item.primary_url, &item.secondary_url, &error)
                }
            };
            let _ = tx.send(result).await;
        }));
    }
    drop(tx);

    while let Some(joined) = workers.next().await {
        if let Err(error) = joined {
            tracing::error!(error = %error, "secondary scan worker panicked");
        }
    }
}
