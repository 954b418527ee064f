//! # Response Validation
//!
//! Checks a response in two tiers:
//!
//! 1. **Hard**: the status code. A mismatch stops validation at once with
//!    [`ValidationError::Hard`].
//! 2. **Soft**: the business-success flag, the error message and the body
//!    contract. All of them run; every mismatch is collected into one
//!    [`ValidationOutcome`].
//!
//! # Architecture Note
//! Soft failures are accumulated in a [`SoftChecks`] value rather than
//! raised, and only turned into an error at one boundary
//! ([`ValidationOutcome::into_result`]). Callers that want the full list can
//! inspect the outcome instead.

use serde_json::Value;
use tracing::{debug, warn};

use super::contract::{kind_of, Contract};
use super::{CheckFailure, SecretMasker, ValidationError};
use crate::framework::ApiResponse;

/// How the `ErrorMessage` field must look.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMessageMatch {
    Exact(String),
    Contains(String),
    /// Null or missing.
    Absent,
}

impl ErrorMessageMatch {
    fn matches(&self, actual: Option<&Value>) -> bool {
        let text = actual.and_then(Value::as_str);
        match self {
            ErrorMessageMatch::Exact(expected) => text == Some(expected.as_str()),
            ErrorMessageMatch::Contains(fragment) => text.is_some_and(|t| t.contains(fragment.as_str())),
            ErrorMessageMatch::Absent => actual.is_none_or(Value::is_null),
        }
    }

    fn describe(&self) -> String {
        match self {
            ErrorMessageMatch::Exact(expected) => format!("{expected:?}"),
            ErrorMessageMatch::Contains(fragment) => format!("text containing {fragment:?}"),
            ErrorMessageMatch::Absent => "null".to_string(),
        }
    }
}

/// What a response is expected to look like.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseExpectation {
    pub status: u16,
    pub is_success: Option<bool>,
    pub error_message: Option<ErrorMessageMatch>,
    pub contract: Option<Contract>,
}

impl ResponseExpectation {
    /// Only the status code is checked.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            is_success: None,
            error_message: None,
            contract: None,
        }
    }

    /// A successful call: `IsSuccess` true, no error message, body matching `contract`.
    pub fn ok(status: u16, contract: &Contract) -> Self {
        Self::status(status)
            .success(true)
            .message(ErrorMessageMatch::Absent)
            .contract(contract)
    }

    /// A rejected call with the exact error message.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::status(status)
            .success(false)
            .message(ErrorMessageMatch::Exact(message.into()))
    }

    pub fn success(mut self, is_success: bool) -> Self {
        self.is_success = Some(is_success);
        self
    }

    pub fn message(mut self, expected: ErrorMessageMatch) -> Self {
        self.error_message = Some(expected);
        self
    }

    pub fn contract(mut self, contract: &Contract) -> Self {
        self.contract = Some(contract.clone());
        self
    }
}

/// Result of the soft tier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationOutcome {
    failures: Vec<CheckFailure>,
}

impl ValidationOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Soft(self.failures))
        }
    }
}

/// Accumulates soft failures in the order they are found.
#[derive(Debug, Default)]
pub struct SoftChecks {
    failures: Vec<CheckFailure>,
}

impl SoftChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure when `passed` is false.
    pub fn check(
        &mut self,
        passed: bool,
        name: &str,
        expected: impl FnOnce() -> String,
        actual: impl FnOnce() -> String,
    ) -> &mut Self {
        if !passed {
            self.failures.push(CheckFailure::new(name, expected(), actual()));
        }
        self
    }

    pub fn record(&mut self, failure: CheckFailure) -> &mut Self {
        self.failures.push(failure);
        self
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = CheckFailure>) -> &mut Self {
        self.failures.extend(failures);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn finish(self) -> ValidationOutcome {
        ValidationOutcome {
            failures: self.failures,
        }
    }
}

fn show(value: Option<&Value>) -> String {
    match value {
        None => "missing".to_string(),
        Some(Value::String(s)) => format!("{s:?}"),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseValidator {
    masker: SecretMasker,
}

impl ResponseValidator {
    pub fn new(masker: SecretMasker) -> Self {
        Self { masker }
    }

    pub fn masker(&self) -> &SecretMasker {
        &self.masker
    }

    /// Runs the hard check, then every soft check.
    pub fn validate(
        &self,
        response: &ApiResponse,
        expectation: &ResponseExpectation,
    ) -> Result<ValidationOutcome, ValidationError> {
        debug!(
            status = response.status(),
            headers = ?self.masker.mask_headers(response.headers()),
            body = %self.masker.mask(response.body()),
            "Validating response"
        );

        if response.status() != expectation.status {
            let failure = CheckFailure::new(
                "status",
                expectation.status.to_string(),
                response.status().to_string(),
            );
            warn!(
                expected = expectation.status,
                actual = response.status(),
                body = %self.masker.mask(response.body()),
                "Unexpected status code"
            );
            return Err(ValidationError::Hard(failure));
        }

        let body = response.body();
        let mut soft = SoftChecks::new();

        if let Some(expected) = expectation.is_success {
            let actual = body.get("IsSuccess");
            soft.check(
                actual.and_then(Value::as_bool) == Some(expected),
                "IsSuccess",
                || expected.to_string(),
                || show(actual),
            );
        }

        if let Some(expected) = &expectation.error_message {
            let actual = body.get("ErrorMessage");
            soft.check(
                expected.matches(actual),
                "ErrorMessage",
                || expected.describe(),
                || show(actual),
            );
        }

        if let Some(contract) = &expectation.contract {
            soft.extend(contract.check(body));
        }

        let outcome = soft.finish();
        if !outcome.passed() {
            warn!(
                failures = outcome.failures().len(),
                body_kind = kind_of(body),
                "Response failed soft checks"
            );
        }
        Ok(outcome)
    }

    /// [`validate`](Self::validate) followed by [`ValidationOutcome::into_result`].
    pub fn check(
        &self,
        response: &ApiResponse,
        expectation: &ResponseExpectation,
    ) -> Result<(), ValidationError> {
        self.validate(response, expectation)?.into_result()
    }
}
