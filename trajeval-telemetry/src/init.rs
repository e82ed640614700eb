//! Telemetry initialization and configuration

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

fn env_filter() -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))
}

/// Initialize console logging
///
/// The filter is read from `RUST_LOG` and falls back to `info`. Calling this
/// more than once is a no-op.
///
/// # Arguments
/// * `service_name` - Name recorded on the initialisation event
///
/// # Example
/// ```
/// use trajeval_telemetry::init_telemetry;
/// init_telemetry("agent-evals").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = env_filter()?;

    INIT.call_once(|| {
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .try_init();

        if installed.is_ok() {
            tracing::info!(service.name = service_name, "Telemetry initialized");
        }
    });

    Ok(())
}

/// Initialize JSON logging, one event per line
///
/// Intended for CI runs where evaluator logs are ingested by a collector.
pub fn init_json_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = env_filter()?;

    INIT.call_once(|| {
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init();

        if installed.is_ok() {
            tracing::info!(service.name = service_name, "Telemetry initialized (json)");
        }
    });

    Ok(())
}
