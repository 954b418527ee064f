use crate::framework::FrameworkError;
use crate::validation::ValidationError;

/// Errors returned by the resource clients.
///
/// Hard assertion failures are a missing credential
/// ([`FrameworkError::MissingCredential`]) and a failed hard check
/// ([`ValidationError::Hard`]). Both stop the operation before any soft check
/// runs.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ApiError {
    #[error(transparent)]
    Framework(#[from] FrameworkError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Cannot read {target} from response: {message}")]
    Parse { target: String, message: String },
}

impl ApiError {
    pub(crate) fn parse(target: impl Into<String>, message: impl ToString) -> Self {
        ApiError::Parse {
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a hard assertion failure rather than a soft,
    /// transport or parse failure.
    pub fn is_hard_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Framework(FrameworkError::MissingCredential)
                | ApiError::Validation(ValidationError::Hard(_))
        )
    }

    /// The validation failure behind this error, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ApiError::Validation(e) => Some(e),
            _ => None,
        }
    }
}
