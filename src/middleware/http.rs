use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use tower::{Layer, Service};

use super::{TraceFuture, SERVICE_NAME_ATTR, TRACER_NAME};
use crate::propagation::{HeaderExtractor, HeaderInjector};

/// Tower layer wrapping HTTP services with server-span instrumentation.
///
/// Incoming trace context is continued when present and started fresh
/// otherwise; the active context is re-injected into the request headers so
/// the wrapped handler observes the current trace ids.
#[derive(Clone)]
pub struct HttpTraceLayer {
    tracer: SdkTracer,
    propagator: Arc<TextMapCompositePropagator>,
    service_name: Arc<str>,
}

impl HttpTraceLayer {
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

impl<S> Layer<S> for HttpTraceLayer {
    type Service = HttpTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpTraceService {
            inner,
            tracer: self.tracer.clone(),
            propagator: Arc::clone(&self.propagator),
            service_name: Arc::clone(&self.service_name),
        }
    }
}

/// Service produced by [`HttpTraceLayer`].
#[derive(Clone)]
pub struct HttpTraceService<S> {
    inner: S,
    tracer: SdkTracer,
    propagator: Arc<TextMapCompositePropagator>,
    service_name: Arc<str>,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for HttpTraceService<S>
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

        let target = request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_owned(), |pq| pq.as_str().to_owned());

        let span = self
            .tracer
            .span_builder(target.clone())
            .with_kind(SpanKind::Server)
            .with_attributes([
                KeyValue::new(SERVICE_NAME_ATTR, self.service_name.to_string()),
                KeyValue::new("http.method", request.method().as_str().to_owned()),
                KeyValue::new("http.target", target),
            ])
            .start_with_context(&self.tracer, &parent);
        let cx = parent.with_span(span);

        // Downstream handlers see the ids of the span that now encloses them.
        self.propagator
            .inject_context(&cx, &mut HeaderInjector(request.headers_mut()));

        TraceFuture::new(self.inner.call(request), cx)
    }
}
