use serde::{Deserialize, Serialize};
use std::fmt;

use crate::framework::FrameworkError;

/// Login pair used to obtain a [`Credential`].
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Opaque bearer token returned by the login endpoint.
///
/// The expiry is unknown to the client, which is why teardown never reuses the
/// token a test body ran with. The token itself never shows up in `Debug`
/// output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Hard precondition for every call: the token must not be empty.
    ///
    /// A missing credential counts as a hard assertion failure, the same as a
    /// status mismatch; see [`crate::clients::ApiError::is_hard_failure`].
    /// No request is sent.
    pub fn ensure_present(&self) -> Result<(), FrameworkError> {
        if self.0.trim().is_empty() {
            return Err(FrameworkError::MissingCredential);
        }
        Ok(())
    }

    /// Value for the `Authorization` request header.
    pub fn header_value(&self) -> String {
        if self.0.starts_with("Bearer ") {
            self.0.clone()
        } else {
            format!("Bearer {}", self.0)
        }
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_credential_is_rejected() {
        assert_eq!(
            Credential::new("  ").ensure_present(),
            Err(FrameworkError::MissingCredential)
        );
        assert!(Credential::new("abc").ensure_present().is_ok());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials::new("admin", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
        assert!(!format!("{:?}", Credential::new("tok-123")).contains("tok-123"));
    }

    #[test]
    fn header_value_adds_bearer_prefix_once() {
        assert_eq!(Credential::new("t").header_value(), "Bearer t");
        assert_eq!(Credential::new("Bearer t").header_value(), "Bearer t");
    }
}
