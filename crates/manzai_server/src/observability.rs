//! Logging setup for the service binary.

use crate::ServerSettings;
use manzai_error::{ServerError, ServerErrorKind};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the event filter: `RUST_LOG` wins over `[server] log_level`.
///
/// # Errors
///
/// Returns [`ServerErrorKind::Configuration`] when the configured level is
/// not a valid directive and `RUST_LOG` is unset.
pub fn log_filter(log_level: &str) -> Result<EnvFilter, ServerError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| {
            ServerError::new(ServerErrorKind::Configuration(format!(
                "log_level '{}': {}",
                log_level, e
            )))
        })
}

/// Install the global tracing subscriber for the service.
///
/// With `json_logs` each event is one JSON object per line; otherwise events
/// are text with source locations.
///
/// # Errors
///
/// Fails on an invalid level or when a subscriber is already installed.
pub fn init_logging(settings: &ServerSettings) -> Result<(), ServerError> {
    let filter = log_filter(&settings.log_level)?;

    let output = if settings.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(|e| ServerError::new(ServerErrorKind::Configuration(e.to_string())))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        production = settings.production,
        json = settings.json_logs,
        "Logging ready"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_crate_directives_parse() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(log_filter("info,manzai_server=debug").is_ok());
    }

    #[test]
    fn test_garbage_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(log_filter("manzai_server=loud").is_err());
    }
}
