//! # Infrastructure Layer
//!
//! Adapters implementing the domain layer's ports: an in-memory
//! catalogue, null and Prometheus metrics providers, and TOML-backed
//! configuration.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|--------------|
//! | [`adapters::InMemoryCatalogue`] | `Catalogue` backed by an in-process `RwLock<HashMap<..>>` |
//! | [`adapters::metrics::NullMetricsProvider`] | No-op `MetricsProvider` |
//! | [`adapters::metrics::PrometheusMetricsProvider`] | `MetricsProvider` backed by the Prometheus crate |
//! | [`config::RouterConfig`] | The engine's four tunables, TOML + env-overridable |

pub mod adapters;
pub mod config;

pub use adapters::InMemoryCatalogue;
pub use adapters::metrics::{NullMetricsProvider, PrometheusMetricsProvider};
pub use config::RouterConfig;
