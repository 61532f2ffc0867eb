//! # Application Layer
//!
//! Use cases orchestrating the stream-routing engine on top of the
//! domain layer's pure types and port contracts. This is the first layer
//! that pulls in an async runtime and concurrency primitives.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|--------------|
//! | [`compiled_engine`] | Immutable, field-indexed snapshot of the active rule set |
//! | [`engine_updater`] | Background task that rebuilds and publishes the engine |
//! | [`router`] | Public façade: routes one message against the current engine |
//! | [`fault_manager`] | Per-stream fault counting and quarantine |
//! | [`timeout_harness`] | Per-rule evaluation deadline and panic isolation |

pub mod compiled_engine;
pub mod engine_updater;
pub mod fault_manager;
pub mod router;
pub mod timeout_harness;

pub use compiled_engine::{BuildStats, Candidate, Engine};
pub use engine_updater::EngineUpdater;
pub use fault_manager::FaultManager;
pub use router::Router;
pub use timeout_harness::TimeoutHarness;
