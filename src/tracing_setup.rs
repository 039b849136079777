//! Log subscriber setup
//!
//! `RUST_LOG` controls the filter (default `info`). `TODO_LOG_FORMAT=json`
//! switches the console output to one JSON object per line.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?,
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?,
    }

    tracing::info!(format = ?format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // The first call may lose to another test's subscriber; either way a
        // repeat must report the conflict instead of panicking.
        let _ = init_tracing(LogFormat::Text);
        assert!(init_tracing(LogFormat::Json).is_err());
    }
}
