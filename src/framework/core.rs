//! # Core Transport Abstractions
//!
//! This module defines the generic building blocks every portal call goes through.
//!
//! ## Key Types
//!
//! - [`ApiClient`]: the request-executing capability. Real HTTP, the in-memory
//!   portal and the scripted mock all implement it.
//! - [`ApiEntity`]: the trait every tracked resource type implements.
//! - [`ResourceClient`]: the generic, typed client for one resource collection.
//! - [`FrameworkError`]: transport-level failures (no credential, timeout, ...).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::model::{Credential, ResourceType};
use crate::validation::Contract;

// =============================================================================
// 1. ERRORS
// =============================================================================

/// Errors raised below the validation layer, before any response exists.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("No credential: a non-empty authorization token is required")]
    MissingCredential,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Malformed JSON: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for FrameworkError {
    fn from(e: serde_json::Error) -> Self {
        FrameworkError::Decode(e.to_string())
    }
}

// =============================================================================
// 2. REQUEST / RESPONSE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// Everything the transport needs to execute one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/api/orders/42`.
    pub path: String,
    pub body: Option<Value>,
    pub headers: HashMap<String, String>,
}

impl RequestOptions {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HashMap::new(),
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        self.body = Some(body);
        self
    }

    pub fn with_credential(mut self, credential: &Credential) -> Self {
        self.headers
            .insert("authorization".to_string(), credential.header_value());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// A parsed response. Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status: u16,
    body: Value,
    headers: HashMap<String, String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            headers: HashMap::new(),
        }
    }

    /// Adds a header; names are stored lower-case.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

// =============================================================================
// 3. THE TRANSPORT SEAM
// =============================================================================

/// The request-executing capability.
///
/// Implementations only move bytes: they never validate status codes or
/// retry. A call that exceeds its timeout fails with
/// [`FrameworkError::Timeout`].
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn send(&self, request: RequestOptions) -> Result<ApiResponse, FrameworkError>;
}

#[async_trait]
impl<C: ApiClient + ?Sized> ApiClient for Arc<C> {
    async fn send(&self, request: RequestOptions) -> Result<ApiResponse, FrameworkError> {
        (**self).send(request).await
    }
}

// =============================================================================
// 4. THE ENTITY ABSTRACTION
// =============================================================================

/// Trait that every portal resource tracked for cleanup implements.
///
/// # Architecture Note
/// The associated items tie a Rust type to its collection: a `Customer` is
/// created from a `CustomerCreate` body at `/api/customers` and comes back
/// under the `Customer` envelope key. [`ResourceClient`] is written once
/// against this contract and reused for every type.
pub trait ApiEntity: DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Payload used to create a new instance.
    type Create: Serialize + Debug + Send + Sync;
    /// Payload accepted by `PUT` on a single entity.
    type Update: Serialize + Debug + Send + Sync;

    const RESOURCE: ResourceType;

    fn id(&self) -> &str;

    /// Contract of the single-entity response envelope.
    fn contract() -> &'static Contract;

    /// Extracts the entity from its envelope (`{"Order": {...}}`).
    fn from_envelope(body: &Value) -> Result<Self, FrameworkError> {
        let key = Self::RESOURCE.envelope_key();
        let inner = body
            .get(key)
            .ok_or_else(|| FrameworkError::Decode(format!("response has no `{key}` field")))?;
        Ok(serde_json::from_value(inner.clone())?)
    }
}

// =============================================================================
// 5. THE GENERIC CLIENT
// =============================================================================

/// A typed client for one resource collection.
///
/// It only builds requests and hands them to the transport; callers decide
/// what a valid response looks like.
pub struct ResourceClient<T: ApiEntity> {
    transport: Arc<dyn ApiClient>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: ApiEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: ApiEntity> ResourceClient<T> {
    pub fn new(transport: Arc<dyn ApiClient>) -> Self {
        Self {
            transport,
            _entity: PhantomData,
        }
    }

    pub async fn create(
        &self,
        credential: &Credential,
        params: &T::Create,
    ) -> Result<ApiResponse, FrameworkError> {
        let body = serde_json::to_value(params)?;
        self.call(credential, Method::Post, T::RESOURCE.endpoint().to_string(), Some(body))
            .await
    }

    pub async fn get(&self, credential: &Credential, id: &str) -> Result<ApiResponse, FrameworkError> {
        self.call(credential, Method::Get, T::RESOURCE.item_path(id), None)
            .await
    }

    pub async fn update(
        &self,
        credential: &Credential,
        id: &str,
        params: &T::Update,
    ) -> Result<ApiResponse, FrameworkError> {
        let body = serde_json::to_value(params)?;
        self.call(credential, Method::Put, T::RESOURCE.item_path(id), Some(body))
            .await
    }

    pub async fn delete(&self, credential: &Credential, id: &str) -> Result<ApiResponse, FrameworkError> {
        self.call(credential, Method::Delete, T::RESOURCE.item_path(id), None)
            .await
    }

    /// Calls a sub-resource of one entity, e.g. `/api/orders/{id}/status`.
    pub async fn call_item(
        &self,
        credential: &Credential,
        method: Method,
        id: &str,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, FrameworkError> {
        let path = format!("{}/{}", T::RESOURCE.item_path(id), suffix.trim_start_matches('/'));
        self.call(credential, method, path, body).await
    }

    async fn call(
        &self,
        credential: &Credential,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> Result<ApiResponse, FrameworkError> {
        credential.ensure_present()?;
        let mut request = RequestOptions::new(method, path).with_credential(credential);
        if let Some(body) = body {
            request = request.with_json(body);
        }
        debug!(resource = %T::RESOURCE, method = %request.method, path = %request.path, "Sending request");
        let response = self.transport.send(request).await?;
        debug!(resource = %T::RESOURCE, status = response.status(), "Received response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockApiClient;
    use crate::model::Product;
    use serde_json::json;

    #[tokio::test]
    async fn resource_client_sends_authorized_requests() {
        let mut mock = MockApiClient::new();
        mock.expect(Method::Delete, "/api/products/p1")
            .return_status(204);
        let client = ResourceClient::<Product>::new(mock.client());

        let response = client.delete(&Credential::new("tok"), "p1").await.unwrap();
        assert_eq!(response.status(), 204);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok"));
        mock.verify();
    }

    #[tokio::test]
    async fn missing_credential_stops_before_transport() {
        let mock = MockApiClient::new();
        let client = ResourceClient::<Product>::new(mock.client());

        let result = client.get(&Credential::new(""), "p1").await;
        assert_eq!(result, Err(FrameworkError::MissingCredential));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn from_envelope_reports_missing_key() {
        let err = Product::from_envelope(&json!({"IsSuccess": true})).unwrap_err();
        assert!(err.to_string().contains("Product"));
    }
}
