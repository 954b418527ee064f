//! # Portal Fixtures
//!
//! > **Leak-proof test entities and aggregated response checks for the sales portal API.**
//!
//! API tests against the portal create customers, products and orders. This
//! crate makes sure every one of them is removed again, whatever the test
//! outcome, and checks responses the way a reviewer would: a wrong status code
//! stops the check, every other mismatch is collected and reported at once.
//!
//! ## Core Concepts
//!
//! ### Track on creation, delete on exit
//! Each test body gets its own [`EntityStore`](store::EntityStore). An id is
//! added the moment its creation succeeds, so a composite build that fails
//! half-way still leaves a complete record of what exists. On exit the
//! [`CleanupOrchestrator`](lifecycle::CleanupOrchestrator) logs in again and
//! deletes orders before the customers and products they reference.
//!
//! ### Hard and soft checks
//! [`ResponseValidator`](validation::ResponseValidator) compares the status
//! code first. If it matches, the `IsSuccess` flag, the `ErrorMessage` and
//! the body [`Contract`](validation::Contract) are all checked and every
//! failure is reported together, with JSON paths such as
//! `$.Order.products[1]._id`.
//!
//! ## Module Tour
//!
//! ### 1. The Transport ([`framework`])
//! - **Role**: Moves requests. [`ApiClient`](framework::ApiClient) is implemented
//!   by a reqwest client, an in-memory portal and a scripted mock.
//! - **Key items**: [`ApiEntity`](framework::ApiEntity), [`ResourceClient`](framework::ResourceClient).
//!
//! ### 2. The Interface ([`clients`])
//! - **Role**: Validated, typed calls per collection.
//! - **Key items**: [`EntityService`](clients::EntityService), [`OrderClient`](clients::OrderClient).
//!
//! ### 3. The Checks ([`validation`])
//! - **Key items**: [`ResponseValidator`](validation::ResponseValidator), [`schemas`](validation::schemas).
//!
//! ### 4. The Fixtures ([`builder`], [`store`])
//! - **Role**: Multi-step order construction and lifecycle driving.
//! - **Key items**: [`CompositeOrderBuilder`](builder::CompositeOrderBuilder).
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! - **Role**: Wires everything together and scopes each test.
//! - **Key items**: [`PortalHarness`](lifecycle::PortalHarness).
//!
//! ## Quick Start
//!
//! ```bash
//! # Demo scenario against the in-memory portal
//! RUST_LOG=info cargo run
//!
//! # Against a live portal
//! PORTAL_API_URL=http://localhost:8686 PORTAL_USERNAME=admin PORTAL_PASSWORD=... cargo test
//! ```

pub mod builder;
pub mod clients;
pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod store;
pub mod validation;
