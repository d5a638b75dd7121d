use std::collections::HashMap;

use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;

use crate::config::{ClientKind, ExporterKind};
use crate::console::StderrSpanExporter;
use crate::error::Error;
use crate::resolve::ResolvedConfig;

/// One constructed span-exporter backend, ready to be attached to a tracer
/// provider.
#[derive(Debug)]
pub(crate) enum ExporterBackend {
    Stdout(opentelemetry_stdout::SpanExporter),
    Stderr(StderrSpanExporter),
    Zipkin(opentelemetry_zipkin::ZipkinExporter),
    Otlp(opentelemetry_otlp::SpanExporter),
}

impl ExporterBackend {
    /// Attach the backend to a provider carrying the fixed batch-export and
    /// sample-everything policies.
    pub(crate) fn into_tracer_provider(self, resource: Resource) -> SdkTracerProvider {
        let builder = SdkTracerProvider::builder()
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(resource);
        match self {
            Self::Stdout(exporter) => builder.with_batch_exporter(exporter).build(),
            Self::Stderr(exporter) => builder.with_batch_exporter(exporter).build(),
            Self::Zipkin(exporter) => builder.with_batch_exporter(exporter).build(),
            Self::Otlp(exporter) => builder.with_batch_exporter(exporter).build(),
        }
    }
}

/// Construct exactly one exporter backend from the resolved configuration.
///
/// This is the terminal rejection site for unknown exporter and client values;
/// nothing upstream may swallow them.
pub(crate) fn build_exporter(config: &ResolvedConfig) -> Result<ExporterBackend, Error> {
    match &config.exporter {
        ExporterKind::Stdout => Ok(ExporterBackend::Stdout(
            opentelemetry_stdout::SpanExporter::default(),
        )),
        ExporterKind::Stderr => Ok(ExporterBackend::Stderr(StderrSpanExporter)),
        ExporterKind::Zipkin => build_zipkin(config).map(ExporterBackend::Zipkin),
        ExporterKind::Jaeger => Err(Error::UnsupportedExporter(
            "the jaeger exporter has been removed, use otlp instead".to_owned(),
        )),
        ExporterKind::Otlp => build_otlp(config).map(ExporterBackend::Otlp),
        ExporterKind::Unknown(kind) => {
            Err(Error::UnsupportedExporter(format!("unknown exporter: {kind}")))
        }
    }
}

fn build_zipkin(config: &ResolvedConfig) -> Result<opentelemetry_zipkin::ZipkinExporter, Error> {
    let mut builder = opentelemetry_zipkin::ZipkinExporter::builder();
    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_collector_endpoint(endpoint.as_str());
    }
    builder
        .build()
        .map_err(|e| Error::ExporterConstruction { reason: e.to_string() })
}

/// Transport options assembled from the resolved configuration.
///
/// Endpoint, URL path and headers are only present when the operator supplied
/// them, so the transport's own protocol defaults and env-var handling stay in
/// effect otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct OtlpOptions {
    pub endpoint: Option<String>,
    pub url_path: Option<String>,
    pub gzip: bool,
    pub headers: HashMap<String, String>,
}

pub(crate) fn otlp_options(config: &ResolvedConfig) -> OtlpOptions {
    OtlpOptions {
        endpoint: config
            .endpoint
            .as_deref()
            .map(|endpoint| normalize_scheme(endpoint, config.insecure)),
        url_path: config.custom_url.clone(),
        gzip: config.compress,
        headers: config.headers.clone(),
    }
}

/// The otlp transports expect a URL scheme; plain `host:port` endpoints get
/// one based on the transport-security flag.
fn normalize_scheme(endpoint: &str, insecure: bool) -> String {
    if endpoint.contains("://") {
        endpoint.to_owned()
    } else if insecure {
        format!("http://{endpoint}")
    } else {
        format!("https://{endpoint}")
    }
}

/// Full traces URL for the HTTP transport: the configured path override, or
/// the standard signal path, joined onto the endpoint.
fn traces_url(endpoint: &str, url_path: Option<&str>) -> String {
    let path = url_path.unwrap_or("/v1/traces");
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn build_otlp(config: &ResolvedConfig) -> Result<opentelemetry_otlp::SpanExporter, Error> {
    let options = otlp_options(config);
    match &config.client {
        ClientKind::Http => build_otlp_http(options),
        ClientKind::Grpc => build_otlp_grpc(options),
        ClientKind::Unknown(client) => Err(Error::Config(format!("unknown client: {client}"))),
    }
}

#[cfg(feature = "http")]
fn build_otlp_http(options: OtlpOptions) -> Result<opentelemetry_otlp::SpanExporter, Error> {
    use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};

    let mut builder = opentelemetry_otlp::SpanExporter::builder().with_http();
    match &options.endpoint {
        Some(endpoint) => {
            builder = builder.with_endpoint(traces_url(endpoint, options.url_path.as_deref()));
        }
        None if options.url_path.is_some() => {
            // The transport default already carries the standard signal path.
            tracing::warn!("custom_url is ignored without an explicit endpoint");
        }
        None => {}
    }
    if options.gzip {
        tracing::warn!(
            "gzip compression is not supported by the http exporter client, sending uncompressed"
        );
    }
    if !options.headers.is_empty() {
        builder = builder.with_headers(options.headers);
    }
    builder
        .build()
        .map_err(|e| Error::ExporterConstruction { reason: e.to_string() })
}

#[cfg(not(feature = "http"))]
fn build_otlp_http(_options: OtlpOptions) -> Result<opentelemetry_otlp::SpanExporter, Error> {
    Err(Error::Config(
        "http exporter client requested but the `http` feature is not enabled".to_owned(),
    ))
}

#[cfg(feature = "grpc")]
fn build_otlp_grpc(options: OtlpOptions) -> Result<opentelemetry_otlp::SpanExporter, Error> {
    use opentelemetry_otlp::{Compression, WithExportConfig, WithTonicConfig};
    use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};

    let mut builder = opentelemetry_otlp::SpanExporter::builder().with_tonic();
    if let Some(endpoint) = options.endpoint {
        builder = builder.with_endpoint(endpoint);
    }
    if options.gzip {
        builder = builder.with_compression(Compression::Gzip);
    }
    if !options.headers.is_empty() {
        let mut metadata = MetadataMap::new();
        for (key, value) in &options.headers {
            match (
                key.parse::<MetadataKey<_>>(),
                value.parse::<MetadataValue<_>>(),
            ) {
                (Ok(key), Ok(value)) => {
                    metadata.insert(key, value);
                }
                _ => tracing::warn!(header = %key, "skipping header that is not valid grpc metadata"),
            }
        }
        builder = builder.with_metadata(metadata);
    }
    builder
        .build()
        .map_err(|e| Error::ExporterConstruction { reason: e.to_string() })
}

#[cfg(not(feature = "grpc"))]
fn build_otlp_grpc(_options: OtlpOptions) -> Result<opentelemetry_otlp::SpanExporter, Error> {
    Err(Error::Config(
        "grpc exporter client requested but the `grpc` feature is not enabled".to_owned(),
    ))
}
