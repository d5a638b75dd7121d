//! # heron-otel
//!
//! Config-driven OpenTelemetry trace export for Heron services.
//!
//! One call turns a declarative, possibly partial configuration into a running
//! exporter + tracer-provider pair, hands back tower layers and a worker
//! interceptor that propagate trace context through the request path, and
//! guarantees an orderly flush + shutdown on termination.
//!
//! ## Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), heron_otel::Error> {
//! let config = heron_otel::Config::builder()
//!     .service_name("billing")
//!     .build();
//!
//! let mut guard = heron_otel::init(config, env!("CARGO_PKG_VERSION"))?;
//!
//! // Wire the adapters into the serving stack:
//! let _http = guard.http_layer();
//! let _rpc = guard.rpc_layer();
//! let _worker = guard.worker();
//!
//! // ... serve ...
//!
//! guard.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configured Usage
//!
//! The raw [`Config`] derives `serde::Deserialize`, so a host config file like
//!
//! ```yaml
//! exporter: otlp
//! client: grpc
//! endpoint: collector:4317
//! insecure: true
//! compress: true
//! resource:
//!   service_name: billing
//!   service_namespace: payments
//! ```
//!
//! deserializes straight into it. Unset fields are resolved in a fixed order:
//! explicit `resource.*` values, deprecated top-level aliases, the standard
//! `OTEL_*` environment variables, then generated defaults. The exporter
//! client for otlp honors `OTEL_EXPORTER_OTLP_TRACES_PROTOCOL` /
//! `OTEL_EXPORTER_OTLP_PROTOCOL` when unset.
//!
//! ## Errors
//!
//! Initialization either yields a fully usable [`OtelGuard`] or fails with an
//! [`Error`]; there is no degraded mode. Resolution warnings (deprecated
//! fields, unrecognized protocol hints) never abort and are routed to
//! `tracing::warn!` or to the sink passed to [`init_with_sink`].

mod config;
mod console;
mod error;
mod exporter;
mod guard;
mod middleware;
mod propagation;
mod resolve;
mod resource;

pub mod re_exports;

#[cfg(test)]
mod test_support;

pub use config::{ClientKind, Config, ConfigBuilder, ExporterKind, ResourceConfig};
pub use error::Error;
pub use guard::{OtelGuard, DEFAULT_SHUTDOWN_TIMEOUT};
pub use middleware::{
    HttpTraceLayer, HttpTraceService, RpcTraceLayer, RpcTraceService, TraceFuture, WorkerTracer,
};
pub use propagation::{compose, VendorFormat, DEFAULT_VENDOR_FORMATS};
pub use resolve::{
    resolve, LogWarnings, ResolvedConfig, ResourceIdentity, WarningSink, DEFAULT_SERVICE_NAME,
    DEFAULT_SERVICE_VERSION,
};

/// Initialize trace export from a raw host configuration.
///
/// Resolution warnings go to `tracing::warn!`; use [`init_with_sink`] to
/// capture them elsewhere. `host_version` is reported as the
/// `webengine.version` resource attribute.
///
/// # Errors
///
/// [`Error::UnsupportedExporter`] for removed or unrecognized backends,
/// [`Error::Config`] for contradictory configuration (e.g. an unknown otlp
/// client), [`Error::ExporterConstruction`] when the underlying transport
/// cannot be built. Any error means tracing never became active.
pub fn init(config: Config, host_version: &str) -> Result<OtelGuard, Error> {
    init_with_sink(config, host_version, &mut LogWarnings)
}

/// Like [`init`], with resolution warnings routed to the caller's sink.
pub fn init_with_sink(
    config: Config,
    host_version: &str,
    warnings: &mut dyn WarningSink,
) -> Result<OtelGuard, Error> {
    let resolved = resolve::resolve(config, warnings)?;
    let backend = exporter::build_exporter(&resolved)?;
    let resource = resource::build_resource(&resolved.resource, host_version);
    let provider = backend.into_tracer_provider(resource);
    let propagator = propagation::compose(propagation::DEFAULT_VENDOR_FORMATS);

    Ok(OtelGuard::new(
        provider,
        propagator,
        resolved.resource.service_name,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_configuration_initializes_without_warnings() {
        let _lock = crate::test_support::ENV_LOCK.lock();
        crate::test_support::clear_otel_env();

        let config = Config::builder().exporter(ExporterKind::Stdout).build();

        let mut warnings: Vec<String> = Vec::new();
        let mut guard =
            init_with_sink(config, "2026.1.0", &mut warnings).expect("init should succeed");

        assert_eq!(guard.service_name(), DEFAULT_SERVICE_NAME);
        assert!(warnings.is_empty());
        guard.shutdown().expect("shutdown should succeed");
    }

    #[test]
    fn bogus_otlp_client_fails_with_config_error() {
        let config = Config::builder()
            .exporter(ExporterKind::Otlp)
            .client(ClientKind::Unknown("bogus".to_owned()))
            .build();

        let mut warnings: Vec<String> = Vec::new();
        let err = init_with_sink(config, "2026.1.0", &mut warnings).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(warnings.iter().any(|w| w.contains("unknown exporter client")));
    }

    #[test]
    fn malformed_zipkin_endpoint_fails_construction() {
        let config = Config::builder()
            .exporter(ExporterKind::Zipkin)
            .endpoint("not a url")
            .build();

        let err = init(config, "2026.1.0").unwrap_err();
        assert!(matches!(err, Error::ExporterConstruction { .. }));
    }

    #[test]
    fn jaeger_configuration_fails_initialization() {
        let config = Config::builder().exporter(ExporterKind::Jaeger).build();

        let err = init(config, "2026.1.0").unwrap_err();
        assert!(matches!(err, Error::UnsupportedExporter(_)));
    }

    #[test]
    fn deprecated_service_name_warns_and_is_reported() {
        let config: Config =
            serde_json::from_str(r#"{"exporter": "stdout", "service_name": "legacy-svc"}"#)
                .unwrap();

        let mut warnings: Vec<String> = Vec::new();
        let mut guard =
            init_with_sink(config, "2026.1.0", &mut warnings).expect("init should succeed");

        assert_eq!(guard.service_name(), "legacy-svc");
        assert!(warnings.iter().any(|w| w.contains("service_name is deprecated")));
        guard.shutdown().expect("shutdown should succeed");
    }
}
