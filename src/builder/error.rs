use std::fmt;

use crate::clients::ApiError;
use crate::model::OrderStatus;

/// The step of a composite build that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    CreateCustomer,
    /// Zero-based position among the requested products.
    CreateProduct { index: usize },
    CreateOrder,
    AddDelivery,
    AssignManager,
    Transition { from: OrderStatus, to: OrderStatus },
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::CreateCustomer => f.write_str("create customer"),
            BuildStep::CreateProduct { index } => write!(f, "create product #{}", index + 1),
            BuildStep::CreateOrder => f.write_str("create order"),
            BuildStep::AddDelivery => f.write_str("add delivery"),
            BuildStep::AssignManager => f.write_str("assign manager"),
            BuildStep::Transition { from, to } => write!(f, "transition {from} -> {to}"),
        }
    }
}

/// Errors raised while building composite fixtures.
///
/// Ids created before the failing step are not listed here; they are already
/// in the caller's [`EntityStore`](crate::store::EntityStore).
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum BuildError {
    #[error("Build failed at step '{step}': {source}")]
    Step {
        step: BuildStep,
        #[source]
        source: ApiError,
    },
    #[error("Order {order_id} has no products left to receive")]
    NothingToReceive { order_id: String },
}

impl BuildError {
    pub fn step(&self) -> Option<BuildStep> {
        match self {
            BuildError::Step { step, .. } => Some(*step),
            BuildError::NothingToReceive { .. } => None,
        }
    }
}

pub(crate) trait AtStep<T> {
    fn at(self, step: BuildStep) -> Result<T, BuildError>;
}

impl<T> AtStep<T> for Result<T, ApiError> {
    fn at(self, step: BuildStep) -> Result<T, BuildError> {
        self.map_err(|source| BuildError::Step { step, source })
    }
}
