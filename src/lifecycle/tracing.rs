//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter driven
//! by `RUST_LOG`. It hides the module prefix (`with_target(false)`); every
//! event carries structured fields (`resource`, `id`, `status`, `step`)
//! instead.
//!
//! ## What Gets Traced
//!
//! - **Client calls**: one span per create/get/delete/sub-resource call, with
//!   the credential skipped
//! - **Validation**: the masked response at `debug`, mismatches at `warn`
//! - **Composite builds**: each created id and each status transition
//! - **Teardown**: every failed deletion, plus a summary line
//!
//! ## Usage Examples
//!
//! ```bash
//! # Summary lines only
//! RUST_LOG=info cargo test
//!
//! # Masked request and response bodies
//! RUST_LOG=debug cargo test
//!
//! # Filter to teardown
//! RUST_LOG=portal_fixtures::lifecycle=debug cargo test
//! ```
//!
//! Bodies are always passed through
//! [`SecretMasker`](crate::validation::SecretMasker) before they are logged,
//! so `password`, `authorization` and token values never reach the output.

/// Installs the global subscriber. Safe to call from every test: only the
/// first call installs anything.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
