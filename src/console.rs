use std::future::Future;

use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{SpanData, SpanExporter};

/// Pretty-printing span exporter for the standard error stream.
///
/// The ecosystem stdout exporter only targets stdout; operators that reserve
/// stdout for application payloads route span diagnostics here instead.
#[derive(Debug, Default)]
pub(crate) struct StderrSpanExporter;

impl SpanExporter for StderrSpanExporter {
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        for span in &batch {
            eprintln!("{}", format_span(span));
        }
        std::future::ready(Ok(()))
    }
}

fn format_span(span: &SpanData) -> String {
    let duration = span
        .end_time
        .duration_since(span.start_time)
        .unwrap_or_default();
    let mut out = format!(
        "span {:?} trace_id={} span_id={} parent_span_id={} kind={:?} status={:?} duration={:?}",
        span.name,
        span.span_context.trace_id(),
        span.span_context.span_id(),
        span.parent_span_id,
        span.span_kind,
        span.status,
        duration,
    );
    for attribute in &span.attributes {
        out.push_str(&format!("\n  {}={}", attribute.key, attribute.value));
    }
    out
}

#[cfg(test)]
mod tests {
    use opentelemetry::trace::{Tracer, TracerProvider as _};
    use opentelemetry_sdk::trace::SdkTracerProvider;

    use super::*;

    #[test]
    fn exports_spans_through_a_provider() {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(StderrSpanExporter)
            .build();

        let tracer = provider.tracer("console-test");
        let span = tracer.start("stderr-span");
        drop(span);

        provider.shutdown().expect("shutdown should succeed");
    }

    #[tokio::test]
    async fn empty_batches_export_cleanly() {
        let exporter = StderrSpanExporter;
        assert!(exporter.export(Vec::new()).await.is_ok());
    }
}
