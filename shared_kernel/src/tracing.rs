use anyhow::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

/// Installs the global JSON subscriber. Filtering follows `RUST_LOG`.
pub fn config_telemetry(service_name: &'static str) -> anyhow::Result<()> {
    // Needed to forward ordinary log statements to our tracing subscriber.
    tracing_log::LogTracer::init().context("Failed to initialize log tracer")?;

    let subscriber = Registry::default()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_thread_names(true),
        );

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install `tracing` subscriber")?;

    tracing::info!(service.name = service_name, "telemetry configured");
    Ok(())
}
