//! Tracing subscriber setup for binaries and demos embedding the engine.
//!
//! Filtering follows `RUST_LOG` (for example `RUST_LOG=orderbook=debug`),
//! falling back to `info`.
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// # Arguments
///
/// * `json` - When `true`, emit one JSON object per event for log
///   aggregation. When `false`, emit compact human-readable lines.
///
/// # Returns
///
/// An error if a global subscriber was already installed.
///
/// # Examples
///
/// ```
/// orderbook::telemetry::init_tracing(false).unwrap();
/// ```
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true);
        registry.with(json_layer).try_init()?;
    } else {
        let compact_layer = tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_thread_ids(false);
        registry.with(compact_layer).try_init()?;
    }
    Ok(())
}
