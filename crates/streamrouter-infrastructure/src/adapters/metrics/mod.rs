//! [`streamrouter_domain::ports::MetricsProvider`] implementations.

mod null;
mod prometheus;

pub use null::NullMetricsProvider;
pub use prometheus::PrometheusMetricsProvider;
