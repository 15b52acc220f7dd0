//! Process-wide tracing setup.
//!
//! `serve` writes JSON logs and, with `observability.otlp_endpoint` set,
//! exports spans over OTLP/gRPC. One-shot CLI commands log compactly to
//! stderr so stdout stays clean for completion output.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig as _;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use sm_domain::config::ObservabilityConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const SERVER_FILTER: &str = "info,sm_gateway=debug";
pub const CLI_FILTER: &str = "warn";

/// Handle for the installed subscriber. Call [`Telemetry::shutdown`] on exit
/// to flush buffered spans.
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    pub fn init_server(obs: &ObservabilityConfig) -> Self {
        let tracer_provider = match otlp_tracer_provider(obs) {
            Some(Ok(provider)) => Some(provider),
            Some(Err(e)) => {
                eprintln!("WARNING: OTLP export disabled: {e}");
                None
            }
            None => None,
        };

        let otel_layer = tracer_provider.as_ref().map(|p| {
            tracing_opentelemetry::layer().with_tracer(p.tracer(obs.service_name.clone()))
        });

        tracing_subscriber::registry()
            .with(filter(SERVER_FILTER))
            .with(tracing_subscriber::fmt::layer().json())
            .with(otel_layer)
            .init();

        Self { tracer_provider }
    }

    pub fn init_cli() -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(filter(CLI_FILTER))
            .with_writer(std::io::stderr)
            .compact()
            .init();
        Self {
            tracer_provider: None,
        }
    }

    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = ?e, "tracer provider shutdown failed");
            }
        }
    }
}

/// `RUST_LOG` when set and valid, otherwise `default`.
fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// `None` when no endpoint is configured.
fn otlp_tracer_provider(obs: &ObservabilityConfig) -> Option<Result<SdkTracerProvider, String>> {
    let endpoint = obs.otlp_endpoint.as_deref()?;

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => return Some(Err(format!("exporter for {endpoint}: {e}"))),
    };

    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(obs.service_name.clone())
        .build();

    Some(Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(sampler(obs.sample_rate))
        .with_resource(resource)
        .build()))
}

/// Root spans are sampled at `rate`; child spans follow their parent.
fn sampler(rate: f64) -> Sampler {
    if rate >= 1.0 {
        Sampler::AlwaysOn
    } else if rate <= 0.0 || rate.is_nan() {
        Sampler::AlwaysOff
    } else {
        Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(rate)))
    }
}
