//! Test lifecycle: wiring, scoped cleanup and observability setup.
//!
//! # Main Components
//!
//! - [`PortalHarness`] - The composition root that wires transport, clients and fixtures
//! - [`CleanupOrchestrator`] - Scoped store acquisition with guaranteed teardown
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod cleanup;
pub mod harness;
pub mod tracing;

pub use cleanup::*;
pub use harness::PortalHarness;
pub use self::tracing::setup_tracing;
