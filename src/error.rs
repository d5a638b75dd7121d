use opentelemetry_sdk::error::OTelSdkError;

/// Errors surfaced by [`init`](crate::init) and by the tracer-provider lifecycle.
///
/// Initialization has no partial-failure mode: any variant other than
/// [`Error::Lifecycle`] means the tracer provider was never constructed and the
/// host should treat tracing as inactive.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structurally invalid or contradictory configuration, e.g. an unknown
    /// exporter client for the otlp backend.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration names a removed or unrecognized exporter backend.
    #[error("unsupported exporter: {0}")]
    UnsupportedExporter(String),

    /// The underlying transport or exporter could not be constructed.
    #[error("failed to construct span exporter: {reason}")]
    ExporterConstruction { reason: String },

    /// Flush or shutdown of the tracer provider failed or timed out.
    #[error("tracer provider lifecycle error: {0}")]
    Lifecycle(#[from] OTelSdkError),
}
