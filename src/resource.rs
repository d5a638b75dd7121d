use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;

use crate::resolve::ResourceIdentity;

/// Engine name reported for every process hosting this crate.
pub(crate) const HOST_ENGINE_NAME: &str = "Heron";

const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.26.0";

pub(crate) const SERVICE_NAME_KEY: &str = "service.name";
pub(crate) const SERVICE_VERSION_KEY: &str = "service.version";
pub(crate) const SERVICE_NAMESPACE_KEY: &str = "service.namespace";
pub(crate) const SERVICE_INSTANCE_ID_KEY: &str = "service.instance.id";

/// Build the identity attribute set attached to every exported span batch.
///
/// Infallible: the resolver guarantees non-empty identity fields, and the
/// OS/arch facts come from compile-time constants of the running build.
/// `Resource::builder` seeds the `telemetry.sdk.*` attributes itself.
pub(crate) fn build_resource(identity: &ResourceIdentity, host_version: &str) -> Resource {
    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new("os.name", std::env::consts::OS),
                KeyValue::new("host.arch", std::env::consts::ARCH),
                KeyValue::new(SERVICE_NAME_KEY, identity.service_name.clone()),
                KeyValue::new(SERVICE_VERSION_KEY, identity.service_version.clone()),
                KeyValue::new(SERVICE_NAMESPACE_KEY, identity.service_namespace.clone()),
                KeyValue::new(SERVICE_INSTANCE_ID_KEY, identity.service_instance_id.clone()),
                KeyValue::new("webengine.name", HOST_ENGINE_NAME),
                KeyValue::new("webengine.version", host_version.to_owned()),
            ],
            SCHEMA_URL,
        )
        .build()
}

#[cfg(test)]
mod tests {
    use opentelemetry::Value;

    use super::*;

    fn attribute(resource: &Resource, key: &str) -> Option<Value> {
        resource
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.clone())
    }

    #[test]
    fn carries_identity_and_host_facts() {
        let identity = ResourceIdentity {
            service_name: "billing".to_owned(),
            service_namespace: "payments".to_owned(),
            service_instance_id: "instance-1".to_owned(),
            service_version: "3.1.4".to_owned(),
        };

        let resource = build_resource(&identity, "2026.2.0");

        assert_eq!(
            attribute(&resource, SERVICE_NAME_KEY),
            Some(Value::from("billing"))
        );
        assert_eq!(
            attribute(&resource, SERVICE_NAMESPACE_KEY),
            Some(Value::from("payments"))
        );
        assert_eq!(
            attribute(&resource, "webengine.name"),
            Some(Value::from(HOST_ENGINE_NAME))
        );
        assert_eq!(
            attribute(&resource, "webengine.version"),
            Some(Value::from("2026.2.0"))
        );
        assert_eq!(
            attribute(&resource, "os.name"),
            Some(Value::from(std::env::consts::OS))
        );
        assert_eq!(resource.schema_url(), Some(SCHEMA_URL));
    }
}
