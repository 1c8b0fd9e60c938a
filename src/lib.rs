pub mod config;
pub mod csp;
pub mod fingerprint;
pub mod http_client;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod takeover;
