//! Order lifecycle states and the transitions the portal allows between them.
//!
//! ```text
//! Draft ──► Confirmed ──► InProcess ──► PartiallyReceived ──► Received
//!               │             │  └──────────────────────────► Received
//!               └──► Canceled ◄┘
//! ```
//!
//! Every transition moves forward; no state is reachable again once left.
//!
//! `Confirmed` is modelled by [`crate::framework::InMemoryPortal`] only. The
//! live sales portal has no such status and moves a draft with a scheduled
//! delivery straight to `In Process` or `Canceled`. Since
//! [`OrderStatus::path_from_draft`] always starts with `Confirmed`, the
//! builder fixtures `create_order_in_process`, `create_canceled_order`,
//! `create_received_order` and `create_partially_received_order` stop at that
//! first transition when run through [`crate::framework::HttpApiClient`].

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Draft,
    Confirmed,
    #[serde(rename = "In Process")]
    InProcess,
    #[serde(rename = "Partially Received")]
    PartiallyReceived,
    Received,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Draft,
        OrderStatus::Confirmed,
        OrderStatus::InProcess,
        OrderStatus::PartiallyReceived,
        OrderStatus::Received,
        OrderStatus::Canceled,
    ];

    /// The value the portal uses on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Draft => "Draft",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::InProcess => "In Process",
            OrderStatus::PartiallyReceived => "Partially Received",
            OrderStatus::Received => "Received",
            OrderStatus::Canceled => "Canceled",
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Draft, Confirmed)
                | (Confirmed, InProcess)
                | (Confirmed, Canceled)
                | (InProcess, PartiallyReceived)
                | (InProcess, Received)
                | (InProcess, Canceled)
                | (PartiallyReceived, Received)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Canceled)
    }

    /// Receiving states are reached by receiving products, not by a plain
    /// status update.
    pub fn is_receiving(self) -> bool {
        matches!(self, OrderStatus::PartiallyReceived | OrderStatus::Received)
    }

    /// Shortest sequence of transitions leading from `Draft` to `self`.
    /// Empty for `Draft` itself.
    pub fn path_from_draft(self) -> Vec<OrderStatus> {
        use OrderStatus::*;
        match self {
            Draft => vec![],
            Confirmed => vec![Confirmed],
            InProcess => vec![Confirmed, InProcess],
            PartiallyReceived => vec![Confirmed, InProcess, PartiallyReceived],
            Received => vec![Confirmed, InProcess, Received],
            Canceled => vec![Confirmed, Canceled],
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
