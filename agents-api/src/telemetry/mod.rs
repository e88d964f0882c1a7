//! Agents Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing-subscriber` and Prometheus metrics
//! for HTTP requests, storage calls and full-graph orchestration.

pub mod metrics;
pub mod middleware;
pub mod store;
pub mod tracer;

pub use metrics::{metrics_handler, AgentsMetrics, METRICS};
pub use middleware::observability_middleware;
pub use store::InstrumentedStore;
pub use tracer::{init_tracer, LogFormat, TelemetryConfig};
