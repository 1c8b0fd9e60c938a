use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::csp::canonical_url;

/// Resolve the scan targets from the CLI surface: a single URL takes
/// precedence over a file of newline-delimited targets.
pub fn load_targets(url: Option<String>, file: Option<PathBuf>) -> Result<Vec<String>> {
    if let Some(url) = url {
        let target = normalize_target(&url)
            .with_context(|| format!("{url} does not normalize to a scannable URL"))?;
        return Ok(vec![target]);
    }

    let path = file.context("missing URL or filepath")?;
    parse_input_file(&path)
}

fn parse_input_file(path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;

    // Shell-metacharacter guard for the case where the input file is less
    // trusted than the process running this scan.
    if data.contains(&['&', ';', '\''][..]) {
        bail!("invalid character (& or ; or ') found in url file");
    }

    let mut targets = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match normalize_target(line) {
            Some(target) => targets.push(target),
            None => {
                tracing::warn!(target = %line, "skipping target that does not normalize to a scannable URL")
            }
        }
    }

    if targets.is_empty() {
        bail!("no scannable targets found in {}", path.display());
    }

    Ok(targets)
}

/// Normalize one raw target: strip a wildcard port marker, default to
/// https:// when schemeless, require a dotted host, and strip a leading
/// wildcard-subdomain label. Returns `None` for values that can't become a
/// scannable URL.
pub fn normalize_target(raw: &str) -> Option<String> {
    let source = raw.replacen(":*", "", 1);

    let source = if source.contains("://") {
        source
    } else {
        format!("https://{source}")
    };

    let mut url = Url::parse(&source).ok()?;
    let host = url.host_str()?.to_string();

    // Skip if no TLD
    if !host.contains('.') {
        return None;
    }

    if let Some(stripped) = host.strip_prefix("*.") {
        url.set_host(Some(stripped)).ok()?;
    }

    Some(canonical_url(&url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(contents: &str) -> PathBuf {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "cspscan-input-{}-{}.txt",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn single_url_takes_precedence_over_file() {
        let path = temp_file("https://file.example.com\n");
        let targets =
            load_targets(Some("https://flag.example.com".to_string()), Some(path.clone())).unwrap();
        assert_eq!(targets, vec!["https://flag.example.com"]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_url_and_file_is_an_error() {
        assert!(load_targets(None, None).is_err());
    }

    #[test]
    fn file_targets_are_normalized_line_by_line() {
        let path = temp_file("example.com\nhttps://b.example.org:*\n\nlocalhost\n*.c.example.net\n");
        let targets = load_targets(None, Some(path.clone())).unwrap();
        assert_eq!(
            targets,
            vec![
                "https://example.com",
                "https://b.example.org",
                "https://c.example.net",
            ]
        );
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn shell_metacharacters_in_file_are_rejected() {
        for contents in ["example.com&whoami", "example.com;ls", "example.com'"] {
            let path = temp_file(contents);
            assert!(load_targets(None, Some(path.clone())).is_err());
            fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn normalize_defaults_scheme_and_requires_dotted_host() {
        assert_eq!(
            normalize_target("example.com").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            normalize_target("http://example.com/path").as_deref(),
            Some("http://example.com/path")
        );
        assert_eq!(normalize_target("localhost"), None);
        assert_eq!(normalize_target(""), None);
    }

    #[test]
    fn normalize_strips_wildcard_labels_and_ports() {
        assert_eq!(
            normalize_target("*.example.com").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            normalize_target("example.com:*").as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["example.com", "*.a.example.com:*", "https://b.example.org/x"] {
            let once = normalize_target(raw).unwrap();
            assert_eq!(normalize_target(&once).as_deref(), Some(once.as_str()));
        }
    }
}
