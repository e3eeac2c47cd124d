//! Structured logging init (§3A). No metrics/APM pipeline is in scope
//! for this system; `tracing` to stdout is the only observability
//! surface, the same `fmt` + `EnvFilter` shape the ancestor service
//! composes its Datadog/OpenTelemetry layers onto — minus those layers.

use tracing_subscriber::EnvFilter;

/// Call once at the top of `main`, before binding any socket.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
