//! Tracing and metrics initialization.

use switchboard_error::ConfigError;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr. Honors `RUST_LOG`; falls back to `info`. Fails if a
/// subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {}", e)))?;
    info!(?format, "Tracing initialized");
    Ok(())
}

/// Install a global meter provider exporting to stdout every `export_interval`.
///
/// The returned provider must be kept alive; call `shutdown()` on it at exit.
#[cfg(feature = "metrics")]
pub fn init_metrics(
    service_name: &'static str,
    export_interval: std::time::Duration,
) -> opentelemetry_sdk::metrics::SdkMeterProvider {
    use opentelemetry::{KeyValue, global};
    use opentelemetry_sdk::{
        Resource,
        metrics::{PeriodicReader, SdkMeterProvider},
    };

    let resource = Resource::builder_empty()
        .with_attributes([KeyValue::new("service.name", service_name)])
        .build();
    let reader = PeriodicReader::builder(opentelemetry_stdout::MetricExporter::default())
        .with_interval(export_interval)
        .build();
    let provider = SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build();

    global::set_meter_provider(provider.clone());
    info!(
        service_name,
        interval_secs = export_interval.as_secs(),
        "Metrics exporter registered"
    );
    provider
}
