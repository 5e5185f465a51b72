//! Tracing setup for the binary.
//!
//! Events go to stderr so stdout carries only command output (listings,
//! JSON). `RUST_LOG` overrides the level; otherwise it is `info`, or `debug`
//! with `-v`.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "lightbox=debug,info" } else { "info" }
}

/// Install the global subscriber. Call once, near the start of `main`.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
