//! Response validation: status, business flag, error message and body contract.
//!
//! # Main Components
//!
//! - [`ResponseValidator`] - Hard status check followed by aggregated soft checks
//! - [`Contract`] - Structural body schema with path-aware failures
//! - [`schemas`] - The portal's response contracts
//! - [`SecretMasker`] - Redacts secrets before bodies and headers are logged

pub mod contract;
pub mod error;
pub mod masking;
pub mod schemas;
pub mod validator;

pub use contract::{Contract, ObjectContract};
pub use error::{CheckFailure, ValidationError};
pub use masking::SecretMasker;
pub use validator::{
    ErrorMessageMatch, ResponseExpectation, ResponseValidator, SoftChecks, ValidationOutcome,
};
