use std::collections::HashMap;
use std::sync::Arc;

use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};

use super::{SERVICE_NAME_ATTR, TRACER_NAME};
use crate::propagation::{MapExtractor, MapInjector};

/// Instruments workflow-worker task execution.
///
/// Worker tasks carry their trace context in a string metadata map rather
/// than protocol headers: [`instrument`](Self::instrument) continues the
/// context found there (or starts a new root), and [`inject`](Self::inject)
/// writes the current context into the metadata of work being dispatched.
#[derive(Clone)]
pub struct WorkerTracer {
    tracer: SdkTracer,
    propagator: Arc<TextMapCompositePropagator>,
    service_name: Arc<str>,
}

impl WorkerTracer {
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

    /// Run `task` under a span continuing the trace context in `headers`.
    ///
    /// The span is current for the duration of the closure, so spans the task
    /// creates parent correctly.
    pub fn instrument<T>(
        &self,
        task_name: &str,
        headers: &HashMap<String, String>,
        task: impl FnOnce() -> T,
    ) -> T {
        let parent = self.propagator.extract(&MapExtractor(headers));
        let span = self
            .tracer
            .span_builder(task_name.to_owned())
            .with_kind(SpanKind::Internal)
            .with_attributes([KeyValue::new(
                SERVICE_NAME_ATTR,
                self.service_name.to_string(),
            )])
            .start_with_context(&self.tracer, &parent);
        let cx = parent.with_span(span);

        let result = {
            let _attached = cx.clone().attach();
            task()
        };
        cx.span().end();
        result
    }

    /// Write the current trace context into the metadata map of a task being
    /// dispatched to another worker.
    pub fn inject(&self, headers: &mut HashMap<String, String>) {
        self.propagator
            .inject_context(&Context::current(), &mut MapInjector(headers));
    }
}
