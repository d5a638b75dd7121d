use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use pin_project::pin_project;

/// Response future for the HTTP and RPC trace services.
///
/// Keeps the request's trace context current while the inner service polls, so
/// spans created by the handler parent correctly, then closes the request span
/// with a status derived from the response.
#[pin_project]
pub struct TraceFuture<F> {
    #[pin]
    inner: F,
    cx: Option<Context>,
}

impl<F> TraceFuture<F> {
    pub(crate) fn new(inner: F, cx: Context) -> Self {
        Self { inner, cx: Some(cx) }
    }
}

impl<F, B, E> Future for TraceFuture<F>
where
    F: Future<Output = Result<http::Response<B>, E>>,
    E: std::fmt::Display,
{
    type Output = Result<http::Response<B>, E>;

    fn poll(self: Pin<&mut Self>, task_cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let cx = this.cx.as_ref().expect("TraceFuture polled after completion");

        let result = {
            let _attached = cx.clone().attach();
            this.inner.poll(task_cx)
        };

        match result {
            Poll::Ready(output) => {
                let cx = this.cx.take().expect("context present until completion");
                let span = cx.span();
                match &output {
                    Ok(response) => {
                        let status = response.status();
                        span.set_attribute(KeyValue::new(
                            "http.status_code",
                            i64::from(status.as_u16()),
                        ));
                        if status.is_server_error() {
                            span.set_status(Status::error(status.to_string()));
                        }
                    }
                    Err(error) => span.set_status(Status::error(error.to_string())),
                }
                span.end();
                Poll::Ready(output)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
