use crate::fingerprint::DEFAULT_FINGERPRINT_URL;

/// Scan settings consumed by the pipeline, independent of how they were
/// collected (CLI flags today).
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Concurrency cap per pipeline stage; 0 means uncapped.
    pub threads: usize,
    pub timeout_secs: u64,
    pub verbose: bool,
    /// Abort the run on the first failed scan item.
    pub strict: bool,
    pub fingerprint_url: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            timeout_secs: 10,
            verbose: false,
            strict: false,
            fingerprint_url: DEFAULT_FINGERPRINT_URL.to_string(),
        }
    }
}
