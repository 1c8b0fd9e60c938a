use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use crate::cli::Cli;
use cspscan::config::ScanConfig;
use cspscan::fingerprint::{self, DEFAULT_FINGERPRINT_URL};
use cspscan::pipeline::{self, ScanResult};
use cspscan::takeover::{DnsLookup, TakeoverMatcher};
use cspscan::{http_client, input, output};

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Configure logging from the global flags, keeping external crates at
    // INFO so a large scan doesn't flood the console.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else { "warn" };
    let filter_str =
        format!("cspscan={crate_level},reqwest=info,hyper=info,hickory_resolver=info");
    let env_filter =
        EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    let config = ScanConfig {
        threads: cli.threads,
        timeout_secs: cli.timeout,
        verbose: cli.verbose,
        strict: cli.strict,
        fingerprint_url: cli
            .fingerprints
            .unwrap_or_else(|| DEFAULT_FINGERPRINT_URL.to_string()),
    };

    let targets = input::load_targets(cli.url, cli.file)?;
    run_scan(targets, config).await
}

/// Wire up and drain the two-stage pipeline: stage 1 harvests CSP candidate
/// hosts from the targets while stage 2 concurrently verifies them against
/// the fingerprint database.
async fn run_scan(targets: Vec<String>, config: ScanConfig) -> anyhow::Result<()> {
    let client = http_client::create_scan_client(config.timeout_secs)?;

    let fingerprints = fingerprint::fetch_fingerprints(&config.fingerprint_url, &client)
        .await
        .context("fingerprint database unreachable")?;

    tracing::debug!(
        targets = targets.len(),
        fingerprints = fingerprints.len(),
        threads = config.threads,
        timeout = config.timeout_secs,
        "starting scan"
    );

    let matcher = Arc::new(TakeoverMatcher::new(
        client.clone(),
        Arc::new(DnsLookup::new()),
        fingerprints,
    ));

    let (candidates_tx, candidates_rx) = mpsc::channel::<ScanResult>(1024);
    let (results_tx, mut results_rx) = mpsc::channel::<ScanResult>(1024);

    tokio::spawn(pipeline::process_primary_urls(
        targets,
        candidates_tx,
        config.threads,
        client,
    ));
    tokio::spawn(pipeline::process_secondary_urls(
        candidates_rx,
        results_tx,
        config.threads,
        matcher,
    ));

    while let Some(result) = results_rx.recv().await {
        output::report(&result, config.verbose, config.strict)?;
    }

    Ok(())
}
