//! # Mock Transport
//!
//! Utilities for testing clients and fixtures in isolation.
//!
//! [`MockApiClient`] is an [`ApiClient`] driven by scripted expectations: each
//! expected call names a method and path and the response to hand back. Every
//! request is recorded, so tests can assert on headers and ordering after the
//! fact.
//!
//! | Feature | MockApiClient | InMemoryPortal |
//! |---------|---------------|----------------|
//! | **State** | None (scripted) | Real portal semantics |
//! | **Error Injection** | Any response, any call | `fail_next` on a route |
//! | **Use Case** | Exact request/response shapes | Full lifecycle scenarios |
//!
//! # Example
//! ```ignore
//! let mut mock = MockApiClient::new();
//! mock.expect(Method::Post, "/api/login")
//!     .return_response(ApiResponse::new(200, json!({"IsSuccess": true}))
//!         .with_header("authorization", "token-1"));
//!
//! let login = LoginClient::new(mock.client(), ResponseValidator::default());
//! // ... exercise the client ...
//! mock.verify(); // Ensures all expectations were met
//! ```

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::framework::{ApiClient, ApiResponse, FrameworkError, Method, RequestOptions};

/// One scripted call.
struct Expectation {
    method: Method,
    path: String,
    response: Result<ApiResponse, FrameworkError>,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    requests: Vec<RequestOptions>,
    unexpected: Vec<String>,
}

/// A transport with expectation tracking for fluent testing.
///
/// Expectations are matched on method and path. When several expectations
/// share a route they are consumed in the order they were declared. A request
/// without a matching expectation fails with [`FrameworkError::Transport`] and
/// is reported by [`MockApiClient::verify`].
#[derive(Clone, Default)]
pub struct MockApiClient {
    state: Arc<Mutex<MockState>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transport for use in clients under test.
    pub fn client(&self) -> Arc<dyn ApiClient> {
        Arc::new(self.clone())
    }

    /// Expects a call to `path` with `method`.
    pub fn expect(&mut self, method: Method, path: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            path: path.into(),
            state: self.state.clone(),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RequestOptions> {
        self.lock().requests.clone()
    }

    /// Verifies that all expectations were met and nothing unexpected arrived.
    pub fn verify(&self) {
        let state = self.lock();
        if !state.unexpected.is_empty() {
            panic!("Unexpected requests: {:?}", state.unexpected);
        }
        if !state.expectations.is_empty() {
            let remaining: Vec<String> = state
                .expectations
                .iter()
                .map(|e| format!("{} {}", e.method, e.path))
                .collect();
            panic!("Not all expectations were met. Remaining: {:?}", remaining);
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn send(&self, request: RequestOptions) -> Result<ApiResponse, FrameworkError> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let position = state
            .expectations
            .iter()
            .position(|e| e.method == request.method && e.path == request.path);

        match position.and_then(|i| state.expectations.remove(i)) {
            Some(expectation) => expectation.response,
            None => {
                let description = format!("{} {}", request.method, request.path);
                state.unexpected.push(description.clone());
                Err(FrameworkError::Transport(format!("no expectation for {description}")))
            }
        }
    }
}

/// Builder for a single expectation.
pub struct ExpectationBuilder {
    method: Method,
    path: String,
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    /// Sets the expectation to return `response`.
    pub fn return_response(self, response: ApiResponse) {
        self.push(Ok(response));
    }

    /// Returns a body-less response with the given status.
    pub fn return_status(self, status: u16) {
        self.push(Ok(ApiResponse::new(status, Value::Null)));
    }

    /// Returns a portal envelope: `{"IsSuccess", "ErrorMessage", key: entity}`.
    pub fn return_envelope(self, status: u16, key: &str, entity: Value) {
        let body = json!({
            "IsSuccess": (200..300).contains(&status),
            "ErrorMessage": Value::Null,
            key: entity,
        });
        self.push(Ok(ApiResponse::new(status, body)));
    }

    /// Returns a portal error envelope.
    pub fn return_error(self, status: u16, message: &str) {
        let body = json!({"IsSuccess": false, "ErrorMessage": message});
        self.push(Ok(ApiResponse::new(status, body)));
    }

    /// Fails at the transport level.
    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<ApiResponse, FrameworkError>) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.expectations.push_back(Expectation {
            method: self.method,
            path: self.path,
            response,
        });
    }
}
