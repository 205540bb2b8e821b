//! Structured logging to stderr.
//!
//! Stdout carries command output (JSON reports), so every log line goes to
//! stderr. The level comes from `RUST_LOG` and defaults to `info`;
//! `--verbose` raises the default to `debug`.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
