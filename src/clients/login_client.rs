use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::clients::ApiError;
use crate::framework::{ApiClient, Method, RequestOptions};
use crate::model::{Credential, Credentials};
use crate::validation::{schemas, ResponseExpectation, ResponseValidator};

/// Source of fresh credentials.
///
/// Teardown asks for a new credential every time instead of reusing the one
/// the test body held, which may have expired or been revoked.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credential(&self) -> Result<Credential, ApiError>;
}

/// Client for `POST /api/login`.
#[derive(Clone)]
pub struct LoginClient {
    transport: Arc<dyn ApiClient>,
    validator: ResponseValidator,
}

impl LoginClient {
    pub fn new(transport: Arc<dyn ApiClient>, validator: ResponseValidator) -> Self {
        Self {
            transport,
            validator,
        }
    }

    /// Logs in and returns the token from the `authorization` response header.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Credential, ApiError> {
        let request = RequestOptions::new(Method::Post, "/api/login").with_json(json!({
            "username": credentials.username,
            "password": credentials.password,
        }));
        let response = self.transport.send(request).await?;
        self.validator
            .check(&response, &ResponseExpectation::ok(200, &schemas::LOGIN_RESPONSE))?;

        let token = response
            .header("authorization")
            .ok_or_else(|| ApiError::parse("authorization header", "missing"))?;
        let credential = Credential::new(token);
        credential.ensure_present()?;
        debug!("Logged in");
        Ok(credential)
    }
}

/// Logs in as the configured admin on every request.
#[derive(Clone)]
pub struct AdminLogin {
    client: LoginClient,
    credentials: Credentials,
}

impl AdminLogin {
    pub fn new(client: LoginClient, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl CredentialProvider for AdminLogin {
    async fn credential(&self) -> Result<Credential, ApiError> {
        self.client.login(&self.credentials).await
    }
}
