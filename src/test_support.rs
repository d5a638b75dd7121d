//! Span exporters used by the lifecycle and adapter tests.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::trace::{SpanData, SpanExporter};

/// Env vars are process-global; tests that read or mutate them serialize here.
pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn clear_otel_env() {
    std::env::remove_var(crate::resolve::TRACES_PROTOCOL_ENV);
    std::env::remove_var(crate::resolve::PROTOCOL_ENV);
    std::env::remove_var(crate::resolve::RESOURCE_ATTRIBUTES_ENV);
    std::env::remove_var(crate::resolve::SERVICE_NAME_ENV);
}

/// Collects finished spans for assertions.
#[derive(Debug, Clone, Default)]
pub(crate) struct CollectingExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl CollectingExporter {
    pub(crate) fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().unwrap().clone()
    }
}

impl SpanExporter for CollectingExporter {
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        self.spans.lock().unwrap().extend(batch);
        std::future::ready(Ok(()))
    }
}

/// Fails every export and counts shutdown calls, for lifecycle ordering tests.
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingExporter {
    pub(crate) shutdowns: Arc<AtomicUsize>,
}

impl SpanExporter for FailingExporter {
    fn export(&self, _batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        std::future::ready(Err(OTelSdkError::InternalFailure(
            "injected export failure".to_owned(),
        )))
    }

    fn shutdown_with_timeout(&mut self, _timeout: Duration) -> OTelSdkResult {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&mut self) -> OTelSdkResult {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
