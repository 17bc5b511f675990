//! Tracing setup
//!
//! The subscriber is installed only when `CORVID_LOG` or `RUST_LOG` is set.
//! Output goes to stderr so it never mixes with reports on stdout.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CORVID_LOG";

fn build_filter() -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(value) => EnvFilter::builder().parse_lossy(value),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the stderr subscriber if a log filter is set
pub fn init_tracing() {
    if std::env::var_os(LOG_ENV).is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
