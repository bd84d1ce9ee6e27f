//! OpenTelemetry tracing/metrics bootstrap, gated behind the `telemetry` feature.
//!
//! Grounded on the teacher's `x402_rs::telemetry::Telemetry`: OTLP export is
//! enabled only when `OTEL_EXPORTER_OTLP_*` env vars are present, falling
//! back to plain `tracing-subscriber` stdout logging otherwise.

#[cfg(feature = "telemetry")]
mod otel {
    use opentelemetry::{KeyValue, global, trace::TracerProvider as _};
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::metrics::{MeterProviderBuilder, PeriodicReader, SdkMeterProvider};
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
    use opentelemetry_semantic_conventions::SCHEMA_URL;
    use opentelemetry_semantic_conventions::attribute::{
        DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION,
    };
    use std::env;
    use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TelemetryProtocol {
        Http,
        Grpc,
    }

    impl TelemetryProtocol {
        fn from_env() -> Option<Self> {
            let enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
                || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
                || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
            if !enabled {
                return None;
            }
            Some(match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
                Ok("grpc") => TelemetryProtocol::Grpc,
                _ => TelemetryProtocol::Http,
            })
        }
    }

    fn resource() -> Resource {
        let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
        Resource::builder()
            .with_service_name(env!("CARGO_PKG_NAME"))
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    fn init_meter_provider(protocol: &TelemetryProtocol) -> SdkMeterProvider {
        let exporter = opentelemetry_otlp::MetricExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::Http => exporter
                .with_http()
                .with_temporality(opentelemetry_sdk::metrics::Temporality::default())
                .build(),
            TelemetryProtocol::Grpc => exporter
                .with_tonic()
                .with_temporality(opentelemetry_sdk::metrics::Temporality::default())
                .build(),
        }
        .expect("failed to build OTLP metric exporter");

        let reader = PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(30))
            .build();

        let meter_provider = MeterProviderBuilder::default()
            .with_resource(resource())
            .with_reader(reader)
            .build();
        global::set_meter_provider(meter_provider.clone());
        meter_provider
    }

    fn init_tracer_provider(protocol: &TelemetryProtocol) -> SdkTracerProvider {
        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::Http => exporter.with_http().build(),
            TelemetryProtocol::Grpc => exporter.with_tonic().build(),
        }
        .expect("failed to build OTLP span exporter");

        SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(1.0))))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource())
            .with_batch_exporter(exporter)
            .build()
    }

    pub(super) struct Inner {
        pub tracer_provider: Option<SdkTracerProvider>,
        pub meter_provider: Option<SdkMeterProvider>,
    }

    pub(super) fn init() -> Inner {
        match TelemetryProtocol::from_env() {
            Some(protocol) => {
                let tracer_provider = init_tracer_provider(&protocol);
                let meter_provider = init_meter_provider(&protocol);
                let tracer = tracer_provider.tracer("relay");

                tracing_subscriber::registry()
                    .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                        |_| tracing_subscriber::EnvFilter::new("info"),
                    ))
                    .with(tracing_subscriber::fmt::layer())
                    .with(MetricsLayer::new(meter_provider.clone()))
                    .with(OpenTelemetryLayer::new(tracer))
                    .init();

                tracing::info!(?protocol, "OpenTelemetry export enabled");
                Inner { tracer_provider: Some(tracer_provider), meter_provider: Some(meter_provider) }
            }
            None => {
                tracing_subscriber::registry()
                    .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                        |_| tracing_subscriber::EnvFilter::new("info"),
                    ))
                    .with(tracing_subscriber::fmt::layer())
                    .init();
                tracing::info!("OpenTelemetry export disabled");
                Inner { tracer_provider: None, meter_provider: None }
            }
        }
    }
}

/// Owns the process's tracing/metrics providers; dropping it flushes and
/// shuts them down cleanly.
pub struct Telemetry {
    #[cfg(feature = "telemetry")]
    inner: otel::Inner,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    #[cfg(feature = "telemetry")]
    pub fn new() -> Self {
        Telemetry { inner: otel::init() }
    }

    #[cfg(not(feature = "telemetry"))]
    pub fn new() -> Self {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
        Telemetry {}
    }
}

#[cfg(feature = "telemetry")]
impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.inner.tracer_provider.as_ref() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("failed to shut down tracer provider: {err:?}");
            }
        }
        if let Some(meter_provider) = self.inner.meter_provider.as_ref() {
            if let Err(err) = meter_provider.shutdown() {
                eprintln!("failed to shut down meter provider: {err:?}");
            }
        }
    }
}
