use std::sync::Arc;
use std::time::Duration;

use opentelemetry::global;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::error::Error;
use crate::middleware::{HttpTraceLayer, RpcTraceLayer, WorkerTracer};
use crate::propagation::{self, DEFAULT_VENDOR_FORMATS};

/// How long shutdown may spend releasing exporter resources before reporting
/// a timeout. Flush is bounded separately by the batch processor's export
/// deadline.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle owning the configured tracer provider and propagator chain.
///
/// Created exactly once by [`init`](crate::init); the adapters it hands out
/// close over its provider and propagator, so nothing here depends on global
/// state. Dropping the guard triggers a best-effort flush and shutdown —
/// hold it for the lifetime of the application and prefer calling
/// [`shutdown`](Self::shutdown) during orderly termination so errors are
/// observable.
#[must_use = "dropping the guard immediately flushes and shuts down trace export — \
              hold it for the lifetime of your application (e.g. `let _guard = ...;`)"]
#[derive(Debug)]
pub struct OtelGuard {
    provider: SdkTracerProvider,
    propagator: Arc<TextMapCompositePropagator>,
    service_name: String,
    shutdown_called: bool,
}

impl OtelGuard {
    pub(crate) fn new(
        provider: SdkTracerProvider,
        propagator: TextMapCompositePropagator,
        service_name: String,
    ) -> Self {
        Self {
            provider,
            propagator: Arc::new(propagator),
            service_name,
            shutdown_called: false,
        }
    }

    /// The provider this guard owns. Create tracers from it directly instead
    /// of going through the global slot.
    pub fn tracer_provider(&self) -> &SdkTracerProvider {
        &self.provider
    }

    /// The resolved service name.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Register this guard's provider and propagator chain in the process-wide
    /// slots, for integrations that only reach tracing through
    /// `opentelemetry::global`.
    ///
    /// Opt-in and single-writer: call at most once, at startup; the slots are
    /// read-only thereafter. The adapters from this guard do not need it.
    pub fn install_global(&self) {
        global::set_tracer_provider(self.provider.clone());
        global::set_text_map_propagator(propagation::compose(DEFAULT_VENDOR_FORMATS));
    }

    /// Force export of buffered spans, bounded by the batch processor's export
    /// deadline.
    pub fn flush(&self) -> Result<(), Error> {
        self.provider.force_flush().map_err(Error::from)
    }

    /// Flush, then shut down, with the default shutdown deadline.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Flush buffered spans, then release exporter resources.
    ///
    /// Both steps run even if the first fails — shutdown must not be skipped
    /// on a flush error or the exporter leaks. The first error encountered is
    /// the one reported. Repeat calls are no-ops; there is no way back to a
    /// running provider.
    pub fn shutdown_with_timeout(&mut self, timeout: Duration) -> Result<(), Error> {
        if self.shutdown_called {
            return Ok(());
        }
        self.shutdown_called = true;

        let flushed = self.provider.force_flush();
        let shut = self.provider.shutdown_with_timeout(timeout);
        flushed.and(shut).map_err(Error::from)
    }

    /// Tower layer instrumenting HTTP server requests.
    pub fn http_layer(&self) -> HttpTraceLayer {
        HttpTraceLayer::new(
            &self.provider,
            Arc::clone(&self.propagator),
            self.service_name.clone(),
        )
    }

    /// Tower layer instrumenting RPC server requests.
    pub fn rpc_layer(&self) -> RpcTraceLayer {
        RpcTraceLayer::new(
            &self.provider,
            Arc::clone(&self.propagator),
            self.service_name.clone(),
        )
    }

    /// Interceptor instrumenting workflow-worker task execution.
    pub fn worker(&self) -> WorkerTracer {
        WorkerTracer::new(
            &self.provider,
            Arc::clone(&self.propagator),
            self.service_name.clone(),
        )
    }
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if self.shutdown_called {
            return;
        }
        self.shutdown_called = true;
        if let Err(e) = self.provider.force_flush() {
            eprintln!("heron-otel: error flushing tracer provider: {e}");
        }
        if let Err(e) = self.provider.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT) {
            eprintln!("heron-otel: error shutting down tracer provider: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use opentelemetry::trace::{Tracer, TracerProvider as _};

    use super::*;
    use crate::test_support::FailingExporter;

    fn guard_over(provider: SdkTracerProvider) -> OtelGuard {
        OtelGuard::new(
            provider,
            propagation::compose(DEFAULT_VENDOR_FORMATS),
            "test-svc".to_owned(),
        )
    }

    #[test]
    fn shutdown_still_runs_when_flush_fails() {
        let exporter = FailingExporter::default();
        let shutdowns = Arc::clone(&exporter.shutdowns);
        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .build();

        // Leave a span in the queue so flush actually attempts an export.
        let tracer = provider.tracer("guard-test");
        drop(tracer.start("buffered"));

        let mut guard = guard_over(provider);
        let result = guard.shutdown();

        assert!(result.is_err());
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeat_shutdown_is_a_no_op() {
        let exporter = FailingExporter::default();
        let shutdowns = Arc::clone(&exporter.shutdowns);
        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .build();

        let mut guard = guard_over(provider);
        let _ = guard.shutdown();
        assert!(guard.shutdown().is_ok());
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_after_shutdown_does_not_stop_twice() {
        let exporter = FailingExporter::default();
        let shutdowns = Arc::clone(&exporter.shutdowns);
        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .build();

        {
            let mut guard = guard_over(provider);
            let _ = guard.shutdown();
        }

        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }
}
