//! Tracing subscriber set-up

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter for a verbosity count: `RUST_LOG` when set and no `-v` was given,
/// otherwise `info`, `debug` or `trace`
#[must_use]
pub fn filter_for(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install the global subscriber
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init(verbose: u8) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter_for(verbose))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
}
