use clap::Parser;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Find dangling cloud storage references in Content-Security-Policy directives", long_about = None)]
pub struct Cli {
    /// Path to a file with newline-delimited target URLs
    pub file: Option<PathBuf>,

    /// Scan a single URL instead of a file (takes precedence over FILE)
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Limit the number of concurrent requests per pipeline stage.
    /// 0 leaves stage 1 uncapped and stage 2 at its 1000-worker ceiling.
    #[arg(short = 't', long, default_value_t = 0)]
    pub threads: usize,

    /// Output all scanned URLs, even if not vulnerable
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10_u64)]
    pub timeout: u64,

    /// Override the fingerprint database URL
    #[arg(long, value_name = "URL")]
    pub fingerprints: Option<String>,

    /// Treat a failed scan item as fatal instead of logging it
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Enable detailed debug logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
