use anyhow::{Context, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace, Resource};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

/// What the service reports about itself to the trace backend.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: &'static str,
    pub otlp_endpoint: Option<String>,
    pub enable_tracing: bool,
    pub export_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development",
            otlp_endpoint: None,
            enable_tracing: true,
            export_timeout: Duration::from_secs(30),
        }
    }
}

impl TelemetryConfig {
    pub fn from_app_config(config: &Config) -> Self {
        Self {
            environment: config.app.environment.as_str(),
            otlp_endpoint: config.telemetry.otlp_endpoint.clone(),
            enable_tracing: config.telemetry.traces_enabled,
            export_timeout: config.telemetry.export_timeout,
            ..Self::default()
        }
    }

    /// Spans leave the process only when tracing is on and an endpoint is set.
    pub fn exports_traces(&self) -> bool {
        self.enable_tracing && self.otlp_endpoint.is_some()
    }
}

/// Returned by [`init_telemetry`]; flushes pending spans on shutdown.
pub struct TelemetryHandles {
    exporter_installed: bool,
}

impl TelemetryHandles {
    pub async fn shutdown(self) -> Result<()> {
        if self.exporter_installed {
            info!("Flushing pending spans");
            global::shutdown_tracer_provider();
        }
        Ok(())
    }
}

pub async fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryHandles> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into());
    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = config.environment,
        "Telemetry initialized"
    );

    let exporter_installed = match config.otlp_endpoint.as_deref() {
        Some(endpoint) if config.enable_tracing => {
            install_otlp_exporter(config, endpoint)?;
            info!(endpoint, "Exporting traces over OTLP");
            true
        }
        _ => {
            info!("No OTLP export configured, logging to console only");
            false
        }
    };

    Ok(TelemetryHandles { exporter_installed })
}

fn install_otlp_exporter(config: &TelemetryConfig, endpoint: &str) -> Result<()> {
    let resource = Resource::new([
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("deployment.environment", config.environment),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.export_timeout),
        )
        .with_trace_config(
            trace::config()
                .with_resource(resource)
                .with_sampler(trace::Sampler::AlwaysOn),
        )
        .install_batch(runtime::Tokio)
        .context("Failed to initialize OTLP tracer")?;
    Ok(())
}

pub fn get_tracer(name: &'static str) -> global::BoxedTracer {
    global::tracer(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetryHealth {
    pub tracing_enabled: bool,
    pub otlp_exporter: bool,
}

/// Telemetry section of `/health`.
pub fn telemetry_health_check(config: &TelemetryConfig) -> TelemetryHealth {
    TelemetryHealth {
        tracing_enabled: config.enable_tracing,
        otlp_exporter: config.exports_traces(),
    }
}
