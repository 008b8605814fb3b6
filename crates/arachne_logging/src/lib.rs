//! Shared logging utilities for Arachne binaries.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "arachne=info,arachne_manager=info,arachne_worker=info,\
                                  arachne_bus=info,arachne_sinks=info,arachne_engine=info";

/// Logging configuration shared by Arachne binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
}

/// Initialize tracing with stderr output and an env-filter. `RUST_LOG`
/// overrides everything; `verbose` widens the fallback filter to debug.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let fallback = if config.verbose {
        format!("{}=debug,{DEFAULT_LOG_FILTER}", config.app_name)
    } else {
        DEFAULT_LOG_FILTER.to_string()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}
