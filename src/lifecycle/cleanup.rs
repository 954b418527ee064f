//! # Scoped Cleanup
//!
//! [`CleanupOrchestrator::run`] hands a fresh [`EntityStore`] to a test body
//! and tears down everything the body tracked once it finishes, whether it
//! returned normally, returned an error value or panicked.
//!
//! ## Teardown
//!
//! 1. A new credential is requested from the [`CredentialProvider`]. The body's
//!    credential is never reused.
//! 2. Ids are deleted type by type in [`ResourceType::TEARDOWN_ORDER`]: orders
//!    first, then the customers and products they reference.
//! 3. Each deletion is independent. Failures are recorded in the
//!    [`TeardownReport`] and never raised.
//! 4. The store is cleared.
//!
//! An empty store skips all of this, including the login, and yields an empty
//! report.
//!
//! With [`TeardownPolicy::Strict`] the report's failures are surfaced through
//! [`ScopeOutcome::teardown_result`], separately from the body's own value.
//! When the body panicked there is no value to return, so the panic is resumed
//! with a `String` payload naming both the original panic and the
//! [`TeardownError`].

use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{CredentialProvider, ResourceDeleter};
use crate::model::ResourceType;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeardownPolicy {
    /// Teardown failures are logged and reported, never returned as errors.
    #[default]
    Lenient,
    /// Teardown failures are returned from [`ScopeOutcome::teardown_result`].
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownStatus {
    Deleted,
    Failed(String),
    /// Never attempted: no credential could be obtained or no deleter exists.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownEntry {
    pub resource: ResourceType,
    pub id: String,
    pub status: TeardownStatus,
}

impl fmt::Display for TeardownEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            TeardownStatus::Deleted => write!(f, "{} {} deleted", self.resource, self.id),
            TeardownStatus::Failed(reason) => {
                write!(f, "{} {} failed: {reason}", self.resource, self.id)
            }
            TeardownStatus::Skipped(reason) => {
                write!(f, "{} {} skipped: {reason}", self.resource, self.id)
            }
        }
    }
}

/// Every id teardown handled, in the order it was handled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeardownReport {
    pub entries: Vec<TeardownEntry>,
}

impl TeardownReport {
    pub fn deleted(&self) -> impl Iterator<Item = &TeardownEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == TeardownStatus::Deleted)
    }

    /// Entries whose resource may still exist on the portal.
    pub fn leftovers(&self) -> impl Iterator<Item = &TeardownEntry> {
        self.entries
            .iter()
            .filter(|e| e.status != TeardownStatus::Deleted)
    }

    pub fn is_clean(&self) -> bool {
        self.leftovers().next().is_none()
    }

    fn record(&mut self, resource: ResourceType, id: String, status: TeardownStatus) {
        self.entries.push(TeardownEntry {
            resource,
            id,
            status,
        });
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("Teardown left {} resource(s) behind: {}", .leftovers.len(), list(.leftovers))]
pub struct TeardownError {
    pub leftovers: Vec<TeardownEntry>,
}

fn list(entries: &[TeardownEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The body's value together with what teardown did afterwards.
#[derive(Debug)]
pub struct ScopeOutcome<T> {
    value: T,
    report: TeardownReport,
    policy: TeardownPolicy,
}

impl<T> ScopeOutcome<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn report(&self) -> &TeardownReport {
        &self.report
    }

    /// `Err` only under [`TeardownPolicy::Strict`] when something was left behind.
    pub fn teardown_result(&self) -> Result<(), TeardownError> {
        strict_failure(&self.report, self.policy).map_or(Ok(()), Err)
    }
}

fn strict_failure(report: &TeardownReport, policy: TeardownPolicy) -> Option<TeardownError> {
    if policy == TeardownPolicy::Strict && !report.is_clean() {
        return Some(TeardownError {
            leftovers: report.leftovers().cloned().collect(),
        });
    }
    None
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Runs test bodies in a cleanup scope.
#[derive(Clone)]
pub struct CleanupOrchestrator {
    credentials: Arc<dyn CredentialProvider>,
    deleters: BTreeMap<ResourceType, Arc<dyn ResourceDeleter>>,
    policy: TeardownPolicy,
}

impl CleanupOrchestrator {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            credentials,
            deleters: BTreeMap::new(),
            policy: TeardownPolicy::default(),
        }
    }

    /// Registers how ids of `resource` are deleted, replacing any earlier deleter.
    pub fn with_deleter(mut self, resource: ResourceType, deleter: Arc<dyn ResourceDeleter>) -> Self {
        self.deleters.insert(resource, deleter);
        self
    }

    pub fn with_policy(mut self, policy: TeardownPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TeardownPolicy {
        self.policy
    }

    /// Runs `body` with a fresh store, then tears the store down.
    ///
    /// A panic in `body` is caught, teardown runs, and the panic is resumed.
    /// Under [`TeardownPolicy::Strict`] a dirty teardown is folded into the
    /// resumed payload.
    pub async fn run<T, F>(&self, body: F) -> ScopeOutcome<T>
    where
        F: AsyncFnOnce(&mut EntityStore) -> T,
    {
        let mut store = EntityStore::new();
        let result = AssertUnwindSafe(body(&mut store)).catch_unwind().await;
        if result.is_err() {
            error!(tracked = store.len(), "Test body panicked, tearing down before resuming");
        }

        let report = self.teardown(&mut store).await;
        match result {
            Ok(value) => ScopeOutcome {
                value,
                report,
                policy: self.policy,
            },
            Err(panic) => match strict_failure(&report, self.policy) {
                Some(teardown) => {
                    error!(error = %teardown, "Teardown failed after test body panicked");
                    let message = format!("{}\n{teardown}", panic_message(&*panic));
                    resume_unwind(Box::new(message))
                }
                None => resume_unwind(panic),
            },
        }
    }

    /// Deletes every tracked id in dependency order and clears the store.
    pub async fn teardown(&self, store: &mut EntityStore) -> TeardownReport {
        let mut report = TeardownReport::default();
        if store.is_empty() {
            store.clear();
            return report;
        }

        let credential = match self.credentials.credential().await {
            Ok(credential) => Some(credential),
            Err(e) => {
                error!(error = %e, tracked = store.len(), "Cannot log in for teardown");
                None
            }
        };

        for resource in ResourceType::TEARDOWN_ORDER {
            for id in store.ids_of(resource) {
                let Some(credential) = &credential else {
                    report.record(resource, id, TeardownStatus::Skipped("login failed".into()));
                    continue;
                };
                let Some(deleter) = self.deleters.get(&resource) else {
                    warn!(%resource, %id, "No deleter registered");
                    report.record(resource, id, TeardownStatus::Skipped("no deleter".into()));
                    continue;
                };
                let result = deleter.delete_by_id(credential, &id).await;
                match result {
                    Ok(()) => report.record(resource, id, TeardownStatus::Deleted),
                    Err(e) => {
                        warn!(%resource, %id, error = %e, "Teardown deletion failed");
                        report.record(resource, id, TeardownStatus::Failed(e.to_string()));
                    }
                }
            }
        }

        store.clear();
        info!(
            deleted = report.deleted().count(),
            leftovers = report.leftovers().count(),
            "Teardown complete"
        );
        report
    }
}
