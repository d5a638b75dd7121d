use std::collections::HashMap;

use http::header::{HeaderName, HeaderValue};
use opentelemetry::propagation::{
    Extractor, Injector, TextMapCompositePropagator, TextMapPropagator,
};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// Vendor-specific propagation formats that can be appended to the standard
/// trace-context + baggage chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorFormat {
    /// Legacy `uber-trace-id` headers, kept for peers that do not speak W3C
    /// trace context.
    Jaeger,
}

/// Formats compiled into the default chain. Not user-configurable.
pub const DEFAULT_VENDOR_FORMATS: &[VendorFormat] = &[VendorFormat::Jaeger];

/// Compose the context-propagation chain.
///
/// Trace-context and baggage always lead; vendor formats follow in the given
/// order. On extraction, chain members are tried in this order and the first
/// format that recognizes the incoming headers wins.
pub fn compose(vendor_formats: &[VendorFormat]) -> TextMapCompositePropagator {
    let mut propagators: Vec<Box<dyn TextMapPropagator + Send + Sync>> = vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ];
    for format in vendor_formats {
        match format {
            VendorFormat::Jaeger => {
                propagators.push(Box::<opentelemetry_jaeger_propagator::Propagator>::default());
            }
        }
    }
    TextMapCompositePropagator::new(propagators)
}

/// Borrowing extractor over HTTP request headers.
pub(crate) struct HeaderExtractor<'a>(pub &'a http::HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Injector over HTTP request headers. Values a header map cannot represent
/// are dropped; instrumentation must never fail the request it decorates.
pub(crate) struct HeaderInjector<'a>(pub &'a mut http::HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// Extractor over the string metadata map worker tasks carry.
pub(crate) struct MapExtractor<'a>(pub &'a HashMap<String, String>);

impl Extractor for MapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

/// Injector over the string metadata map worker tasks carry.
pub(crate) struct MapInjector<'a>(pub &'a mut HashMap<String, String>);

impl Injector for MapInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        self.0.insert(key.to_owned(), value);
    }
}
