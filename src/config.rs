use std::collections::HashMap;

use serde::Deserialize;

/// Span exporter backend named by configuration.
///
/// Values this crate does not recognize deserialize into
/// [`ExporterKind::Unknown`] and are rejected during exporter selection, never
/// silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ExporterKind {
    /// Pretty-printing exporter on standard output, for development.
    Stdout,
    /// Pretty-printing exporter on standard error.
    Stderr,
    /// Zipkin collector endpoint.
    Zipkin,
    /// Removed backend. Configurations naming it fail initialization loudly.
    Jaeger,
    /// OTLP over gRPC or HTTP, selected by [`ClientKind`].
    Otlp,
    /// Anything else, kept verbatim for the rejection message.
    Unknown(String),
}

impl From<String> for ExporterKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "stdout" => Self::Stdout,
            "stderr" => Self::Stderr,
            "zipkin" => Self::Zipkin,
            "jaeger" => Self::Jaeger,
            "otlp" => Self::Otlp,
            _ => Self::Unknown(value),
        }
    }
}

impl std::fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
            Self::Zipkin => f.write_str("zipkin"),
            Self::Jaeger => f.write_str("jaeger"),
            Self::Otlp => f.write_str("otlp"),
            Self::Unknown(value) => f.write_str(value),
        }
    }
}

/// Wire-protocol client for the otlp exporter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ClientKind {
    Grpc,
    Http,
    /// Anything else, kept verbatim for the rejection message.
    Unknown(String),
}

impl From<String> for ClientKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "grpc" => Self::Grpc,
            "http" => Self::Http,
            _ => Self::Unknown(value),
        }
    }
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grpc => f.write_str("grpc"),
            Self::Http => f.write_str("http"),
            Self::Unknown(value) => f.write_str(value),
        }
    }
}

/// Identity attributes scoped under the `resource` configuration key.
///
/// Every field is individually defaultable; see the resolution order in
/// [`resolve`](crate::resolve).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub service_name: Option<String>,
    pub service_namespace: Option<String>,
    pub service_instance_id: Option<String>,
    pub service_version: Option<String>,
}

/// Raw, possibly partially-populated tracing configuration.
///
/// The host's configuration layer deserializes straight into this type; use
/// [`Config::builder`] to construct one programmatically. All fields are
/// optional — [`init`](crate::init) resolves the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Disable transport security. Scheme-less otlp endpoints are prefixed
    /// with `http://` instead of `https://` when set.
    pub insecure: bool,
    /// Enable gzip payload compression where the transport supports it.
    pub compress: bool,
    /// Exporter backend; defaults to otlp when absent.
    pub exporter: Option<ExporterKind>,
    /// URL path override for the otlp HTTP client.
    pub custom_url: Option<String>,
    /// Wire-protocol client for the otlp exporter.
    pub client: Option<ClientKind>,
    /// Collector address or URL. Absent means the transport's own protocol
    /// default applies.
    pub endpoint: Option<String>,
    /// Extra headers attached to every export request.
    pub headers: HashMap<String, String>,
    /// Identity attributes attached to every exported span batch.
    pub resource: ResourceConfig,
    /// Deprecated alias of `resource.service_name`; warns when set.
    pub service_name: Option<String>,
    /// Deprecated alias of `resource.service_version`; warns when set.
    pub service_version: Option<String>,
}

impl Config {
    /// Create a new builder for `Config`.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for [`Config`]. Only the current-generation fields are settable
/// here; the deprecated top-level aliases exist solely for configurations
/// deserialized from older hosts.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Select the exporter backend.
    pub fn exporter(mut self, exporter: ExporterKind) -> Self {
        self.config.exporter = Some(exporter);
        self
    }

    /// Select the otlp wire-protocol client.
    pub fn client(mut self, client: ClientKind) -> Self {
        self.config.client = Some(client);
        self
    }

    /// Set the collector address or URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Override the URL path used by the otlp HTTP client.
    pub fn custom_url(mut self, path: impl Into<String>) -> Self {
        self.config.custom_url = Some(path.into());
        self
    }

    /// Disable transport security.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.config.insecure = insecure;
        self
    }

    /// Enable gzip payload compression.
    pub fn compress(mut self, compress: bool) -> Self {
        self.config.compress = compress;
        self
    }

    /// Set headers attached to every export request (e.g. authorization tokens).
    pub fn headers(
        mut self,
        headers: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.config.headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set the reported service name.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.resource.service_name = Some(name.into());
        self
    }

    /// Set the reported service namespace.
    pub fn service_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.resource.service_namespace = Some(namespace.into());
        self
    }

    /// Set the reported service instance id.
    pub fn service_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.config.resource.service_instance_id = Some(instance_id.into());
        self
    }

    /// Set the reported service version.
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.config.resource.service_version = Some(version.into());
        self
    }

    /// Build the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}
