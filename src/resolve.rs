use std::collections::HashMap;

use uuid::Uuid;

use crate::config::{ClientKind, Config, ExporterKind};
use crate::error::Error;
use crate::resource::{
    HOST_ENGINE_NAME, SERVICE_INSTANCE_ID_KEY, SERVICE_NAMESPACE_KEY, SERVICE_NAME_KEY,
    SERVICE_VERSION_KEY,
};

/// Service name reported when neither configuration nor environment provides one.
pub const DEFAULT_SERVICE_NAME: &str = HOST_ENGINE_NAME;
/// Service version reported when neither configuration nor environment provides one.
pub const DEFAULT_SERVICE_VERSION: &str = "1.0.0";

// https://opentelemetry.io/docs/specs/otel/protocol/exporter/#specify-protocol
pub(crate) const TRACES_PROTOCOL_ENV: &str = "OTEL_EXPORTER_OTLP_TRACES_PROTOCOL";
pub(crate) const PROTOCOL_ENV: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";

pub(crate) const RESOURCE_ATTRIBUTES_ENV: &str = "OTEL_RESOURCE_ATTRIBUTES";
pub(crate) const SERVICE_NAME_ENV: &str = "OTEL_SERVICE_NAME";

/// Sink for non-fatal resolution warnings: deprecated field usage,
/// unrecognized protocol hints. Warnings never abort initialization.
///
/// `Vec<String>` implements this for tests; [`LogWarnings`] routes to the
/// `tracing` ecosystem.
pub trait WarningSink {
    fn warn(&mut self, message: &str);
}

/// Warning sink that forwards to `tracing::warn!`.
#[derive(Debug, Default)]
pub struct LogWarnings;

impl WarningSink for LogWarnings {
    fn warn(&mut self, message: &str) {
        tracing::warn!("{message}");
    }
}

impl WarningSink for Vec<String> {
    fn warn(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}

/// Service identity attached to every exported span batch. All fields are
/// non-empty after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub service_name: String,
    pub service_namespace: String,
    pub service_instance_id: String,
    pub service_version: String,
}

/// Fully defaulted configuration, immutable after resolution.
///
/// `endpoint` stays `None` when the operator supplied nothing so the
/// transport's own protocol-default resolution remains in effect.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub exporter: ExporterKind,
    pub client: ClientKind,
    pub endpoint: Option<String>,
    pub custom_url: Option<String>,
    pub insecure: bool,
    pub compress: bool,
    pub headers: HashMap<String, String>,
    pub resource: ResourceIdentity,
}

/// Normalize a raw configuration into a fully populated one.
///
/// Applies the defaulting rules in order: exporter kind, deprecated-alias
/// warnings, per-field resource identity fallback, client-kind resolution.
/// The environment is consulted only for the otlp protocol hint and the
/// standard resource-attribute variables.
///
/// # Errors
///
/// Returns [`Error::UnsupportedExporter`] for the removed jaeger backend.
/// Unknown exporter and client values are carried through and rejected
/// terminally during exporter selection.
pub fn resolve(config: Config, warnings: &mut dyn WarningSink) -> Result<ResolvedConfig, Error> {
    let exporter = match config.exporter {
        None => ExporterKind::Otlp,
        Some(ExporterKind::Unknown(ref value)) if value.is_empty() => ExporterKind::Otlp,
        Some(kind) => kind,
    };

    if non_empty(config.service_name.as_deref()).is_some() {
        warnings.warn("service_name is deprecated, use resource.service_name instead");
    }
    if non_empty(config.service_version.as_deref()).is_some() {
        warnings.warn("service_version is deprecated, use resource.service_version instead");
    }

    if exporter == ExporterKind::Jaeger {
        return Err(Error::UnsupportedExporter(
            "the jaeger exporter has been removed, use otlp instead".to_owned(),
        ));
    }

    let client = resolve_client(config.client, warnings);

    let env_attrs = environment_resource_attributes();
    let resource = ResourceIdentity {
        service_name: resolve_field(
            [
                config.resource.service_name.as_deref(),
                config.service_name.as_deref(),
                env_attrs.get(SERVICE_NAME_KEY).map(String::as_str),
            ],
            || DEFAULT_SERVICE_NAME.to_owned(),
        ),
        service_version: resolve_field(
            [
                config.resource.service_version.as_deref(),
                config.service_version.as_deref(),
                env_attrs.get(SERVICE_VERSION_KEY).map(String::as_str),
            ],
            || DEFAULT_SERVICE_VERSION.to_owned(),
        ),
        service_instance_id: resolve_field(
            [
                config.resource.service_instance_id.as_deref(),
                None,
                env_attrs.get(SERVICE_INSTANCE_ID_KEY).map(String::as_str),
            ],
            || Uuid::new_v4().to_string(),
        ),
        service_namespace: resolve_field(
            [
                config.resource.service_namespace.as_deref(),
                None,
                env_attrs.get(SERVICE_NAMESPACE_KEY).map(String::as_str),
            ],
            || format!("{HOST_ENGINE_NAME}-{}", Uuid::new_v4()),
        ),
    };

    Ok(ResolvedConfig {
        exporter,
        client,
        endpoint: config.endpoint.and_then(owned_non_empty),
        custom_url: config.custom_url.and_then(owned_non_empty),
        insecure: config.insecure,
        compress: config.compress,
        headers: config.headers,
        resource,
    })
}

/// One identity field, resolved from an ordered list of fallback sources:
/// explicit resource-scoped value, deprecated top-level value,
/// environment-derived attribute, generated default. First match wins.
fn resolve_field(sources: [Option<&str>; 3], generate: impl FnOnce() -> String) -> String {
    sources
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(generate)
}

fn resolve_client(client: Option<ClientKind>, warnings: &mut dyn WarningSink) -> ClientKind {
    match client {
        Some(ClientKind::Grpc) => ClientKind::Grpc,
        Some(ClientKind::Http) => ClientKind::Http,
        Some(ClientKind::Unknown(value)) if value.is_empty() => client_from_env(warnings),
        Some(ClientKind::Unknown(value)) => {
            // Kept verbatim; exporter selection is the terminal rejection site.
            warnings.warn(&format!("unknown exporter client: {value}"));
            ClientKind::Unknown(value)
        }
        None => client_from_env(warnings),
    }
}

/// The unset-client default: http, unless the well-known protocol environment
/// variables say otherwise.
fn client_from_env(warnings: &mut dyn WarningSink) -> ClientKind {
    let Some((name, value)) = protocol_hint() else {
        return ClientKind::Http;
    };
    match value.as_str() {
        "grpc" => ClientKind::Grpc,
        "http/protobuf" => ClientKind::Http,
        "http/json" => {
            warnings.warn(&format!("unsupported exporter protocol {value:?} in {name}"));
            ClientKind::Http
        }
        _ => {
            warnings.warn(&format!("unknown exporter protocol {value:?} in {name}"));
            ClientKind::Http
        }
    }
}

fn protocol_hint() -> Option<(&'static str, String)> {
    [TRACES_PROTOCOL_ENV, PROTOCOL_ENV]
        .into_iter()
        .find_map(|name| env_var_non_empty(name).map(|value| (name, value)))
}

/// Resource attributes from the standard environment convention:
/// `OTEL_RESOURCE_ATTRIBUTES` as a comma-separated k=v list, with
/// `OTEL_SERVICE_NAME` taking precedence for the service name.
fn environment_resource_attributes() -> HashMap<String, String> {
    let mut attrs: HashMap<String, String> = env_var_non_empty(RESOURCE_ATTRIBUTES_ENV)
        .map(|val| {
            val.split(',')
                .filter_map(|pair| {
                    let (key, value) = pair.split_once('=')?;
                    let key = key.trim();
                    let value = value.trim();
                    if key.is_empty() || value.is_empty() {
                        return None;
                    }
                    Some((key.to_owned(), value.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(name) = env_var_non_empty(SERVICE_NAME_ENV) {
        attrs.insert(SERVICE_NAME_KEY.to_owned(), name);
    }

    attrs
}

fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn owned_non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
