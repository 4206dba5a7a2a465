//! Logging setup for the `digimesh` binary.
//!
//! Output goes to stderr through `tracing-subscriber`, leaving stdout for
//! command results.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. `RUST_LOG` applies unless `-v` was given.
pub fn init_logging(verbose: u8) {
    let filter = if verbose > 0 {
        EnvFilter::new(level_for(verbose))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(0)))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
