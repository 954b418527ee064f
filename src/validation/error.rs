use std::fmt;

/// One failed check: what was compared, what was expected and what came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// `status`, `IsSuccess`, `ErrorMessage`, or a body path such as `$.Order.products[1]._id`.
    pub check: String,
    pub expected: String,
    pub actual: String,
}

impl CheckFailure {
    pub fn new(
        check: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, got {}", self.check, self.expected, self.actual)
    }
}

fn list(failures: &[CheckFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// The status code did not match; nothing else was checked.
    #[error("Hard assertion failed: {0}")]
    Hard(CheckFailure),
    /// Every soft mismatch found in one response.
    #[error("{} soft assertion(s) failed: {}", .0.len(), list(.0))]
    Soft(Vec<CheckFailure>),
}

impl ValidationError {
    /// All recorded failures, hard or soft.
    pub fn failures(&self) -> &[CheckFailure] {
        match self {
            ValidationError::Hard(failure) => std::slice::from_ref(failure),
            ValidationError::Soft(failures) => failures,
        }
    }
}
