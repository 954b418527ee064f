//! Transport layer for the sales portal API.
//!
//! # Main Components
//!
//! - [`ApiClient`] - The request-executing capability every transport implements
//! - [`ApiEntity`] - Trait that tracked resource types implement
//! - [`ResourceClient`] - Typed client for one resource collection
//! - [`HttpApiClient`] - reqwest-backed transport for a live portal
//! - [`InMemoryPortal`] - Stateful in-process portal used by the demo and tests
//!
//! # Testing
//!
//! See [`mock`] module for a scripted transport that checks the exact requests sent.

pub mod core;
pub mod http;
pub mod in_memory;
pub mod mock;

pub use core::*;
pub use http::HttpApiClient;
pub use in_memory::{InMemoryPortal, RecordedRequest};
