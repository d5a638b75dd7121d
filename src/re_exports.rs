//! Curated re-exports of key OpenTelemetry and tracing crates.
//!
//! These let hosts name commonly needed types (tracers, contexts, span kinds)
//! without adding direct dependencies on `opentelemetry` or
//! `opentelemetry_sdk` to their own `Cargo.toml`.

/// Re-export of the `opentelemetry` API crate.
pub use opentelemetry;

/// Re-export of the `opentelemetry_sdk` crate.
pub use opentelemetry_sdk;

/// Re-export of the `tracing` crate.
pub use tracing;
