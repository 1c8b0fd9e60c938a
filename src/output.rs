use anyhow::bail;

use crate::pipeline::ScanResult;

/// Print one scan result to the console.
///
/// Failed items are reported as structured warnings so one bad candidate
/// doesn't kill a large scan; `strict` turns them into the run's error
/// instead.
pub fn report(result: &ScanResult, verbose: bool, strict: bool) -> anyhow::Result<()> {
    if let Some(error) = &result.error {
        if strict {
            bail!(
                "error with result:\nSource URL: {}\nSecondary URL: {}\nError: {}",
                result.primary_url,
                result.secondary_url,
                error
            );
        }
        tracing::warn!(
            primary = %result.primary_url,
            secondary = %result.secondary_url,
            error = %error,
            "scan item failed"
        );
        return Ok(());
    }

    if result.vulnerable {
        println!(
            "Found possibly vulnerable url: Source URL - {}, Vulnerable URL - {}",
            result.primary_url, result.secondary_url
        );
    }

    if verbose {
        println!("Scanned URL: {}", result.secondary_url);
    }

    Ok(())
}
