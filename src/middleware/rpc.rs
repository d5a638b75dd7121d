use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use tower::{Layer, Service};

use super::{TraceFuture, SERVICE_NAME_ATTR, TRACER_NAME};
use crate::propagation::{HeaderExtractor, HeaderInjector};

/// Tower layer wrapping RPC services with server-span instrumentation.
///
/// Works with any RPC framework that serves `http::Request`s with
/// `/package.Service/Method`-shaped paths (tonic servers are tower stacks, so
/// this slots into their layer chain directly).
#[derive(Clone)]
pub struct RpcTraceLayer {
    tracer: SdkTracer,
    propagator: Arc<TextMapCompositePropagator>,
    service_name: Arc<str>,
}

impl RpcTraceLayer {
    pub(crate) fn new(
        provider: &SdkTracerProvider,
        propagator: Arc<TextMapCompositePropagator>,
        service_name: String,
    ) -> Self {
        Self {
            tracer: provider.tracer(TRACER_NAME),
            propagator,
            service_name: service_name.into(),
        }
    }
}

impl<S> Layer<S> for RpcTraceLayer {
    type Service = RpcTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RpcTraceService {
            inner,
            tracer: self.tracer.clone(),
            propagator: Arc::clone(&self.propagator),
            service_name: Arc::clone(&self.service_name),
        }
    }
}

/// Service produced by [`RpcTraceLayer`].
#[derive(Clone)]
pub struct RpcTraceService<S> {
    inner: S,
    tracer: SdkTracer,
    propagator: Arc<TextMapCompositePropagator>,
    service_name: Arc<str>,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for RpcTraceService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    S::Error: std::fmt::Display,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TraceFuture<S::Future>;

    fn poll_ready(&mut self, task_cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(task_cx)
    }

    fn call(&mut self, mut request: http::Request<ReqBody>) -> Self::Future {
        let parent = self.propagator.extract(&HeaderExtractor(request.headers()));

        let full_method = request.uri().path().trim_start_matches('/').to_owned();
        let (rpc_service, rpc_method) = match full_method.rsplit_once('/') {
            Some((service, method)) => (service.to_owned(), method.to_owned()),
            None => (full_method.clone(), String::new()),
        };

        let span = self
            .tracer
            .span_builder(full_method)
            .with_kind(SpanKind::Server)
            .with_attributes([
                KeyValue::new(SERVICE_NAME_ATTR, self.service_name.to_string()),
                KeyValue::new("rpc.system", "grpc"),
                KeyValue::new("rpc.service", rpc_service),
                KeyValue::new("rpc.method", rpc_method),
            ])
            .start_with_context(&self.tracer, &parent);
        let cx = parent.with_span(span);

        self.propagator
            .inject_context(&cx, &mut HeaderInjector(request.headers_mut()));

        TraceFuture::new(self.inner.call(request), cx)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use tower::ServiceExt;

    use super::*;
    use crate::propagation::{compose, DEFAULT_VENDOR_FORMATS};
    use crate::test_support::CollectingExporter;

    #[tokio::test]
    async fn names_spans_after_the_rpc_method() {
        let exporter = CollectingExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let layer = RpcTraceLayer::new(
            &provider,
            Arc::new(compose(DEFAULT_VENDOR_FORMATS)),
            "test-svc".to_owned(),
        );

        let mut service = layer.layer(tower::service_fn(|_request: http::Request<()>| async {
            Ok::<_, Infallible>(http::Response::new(()))
        }));

        let request = http::Request::builder()
            .uri("/billing.Invoices/Create")
            .body(())
            .unwrap();
        service.ready().await.unwrap().call(request).await.unwrap();

        let spans = exporter.spans();
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.name, "billing.Invoices/Create");
        assert!(span.attributes.iter().any(|kv| {
            kv.key.as_str() == "rpc.service" && kv.value.as_str() == "billing.Invoices"
        }));
        assert!(span
            .attributes
            .iter()
            .any(|kv| kv.key.as_str() == "rpc.method" && kv.value.as_str() == "Create"));
    }
}
