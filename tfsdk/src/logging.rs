//! Logging setup for providers
//!
//! Logs go to stderr through a `tracing` subscriber filtered by `RUST_LOG`
//! (e.g. `RUST_LOG=tfsdk=debug,azurerm=debug`), defaulting to `info`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Installs the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(filter("info"))
        .with(layer())
        .init();
}

/// Installs the global subscriber with `default_level` used when `RUST_LOG` is unset.
/// Returns false when a subscriber was already set.
pub fn try_init_logging(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("tfsdk=debug").is_ok());
        assert!(EnvFilter::try_new("warn,azurerm=debug").is_ok());
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        try_init_logging("info");
        assert!(!try_init_logging("debug"));
    }
}
