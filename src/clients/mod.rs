//! Typed, validated clients for the portal collections.
//!
//! Every client wraps a [`ResourceClient`](crate::framework::ResourceClient)
//! and checks each response before handing back a parsed entity.

pub mod customer_client;
pub mod entity_service;
pub mod error;
pub mod login_client;
pub mod order_client;
pub mod product_client;

pub use customer_client::*;
pub use entity_service::{EntityService, ResourceDeleter};
pub use error::ApiError;
pub use login_client::*;
pub use order_client::*;
pub use product_client::*;
