//! Request-path instrumentation bound to a configured tracer provider.
//!
//! Each adapter is built once from [`OtelGuard`](crate::OtelGuard) when the
//! host assembles its handler chain; the adapters hold no mutable state of
//! their own and are safe to call from any number of concurrent requests.
//! Instrumentation failures never abort the wrapped request.

mod future;
mod http;
mod rpc;
mod worker;

pub use self::future::TraceFuture;
pub use self::http::{HttpTraceLayer, HttpTraceService};
pub use self::rpc::{RpcTraceLayer, RpcTraceService};
pub use self::worker::WorkerTracer;

/// Instrumentation-scope name for tracers created by the adapters.
pub(crate) const TRACER_NAME: &str = "heron-otel";

/// Span attribute carrying the configured service name into the execution
/// context of every wrapped invocation.
pub(crate) const SERVICE_NAME_ATTR: &str = "service.name";
