use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Customer, Delivery, OrderStatus};

/// A product line inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderProduct {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub amount: u32,
    pub price: f64,
    pub manufacturer: String,
    #[serde(default)]
    pub notes: String,
    pub received: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderComment {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    #[serde(rename = "createdOn")]
    pub created_on: String,
}

/// An order as returned by the portal.
///
/// The order references a customer and the requested products; it must be
/// deleted before either of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: OrderStatus,
    pub customer: Customer,
    pub products: Vec<OrderProduct>,
    pub delivery: Option<Delivery>,
    pub total_price: f64,
    #[serde(rename = "createdOn")]
    pub created_on: String,
    #[serde(default)]
    pub comments: Vec<OrderComment>,
    #[serde(default)]
    pub history: Vec<Value>,
    #[serde(rename = "assignedManager", default)]
    pub assigned_manager: Option<Value>,
}

impl Order {
    pub fn product_ids(&self) -> Vec<String> {
        self.products.iter().map(|p| p.id.clone()).collect()
    }

    /// Products not received yet.
    pub fn pending_product_ids(&self) -> Vec<String> {
        self.products
            .iter()
            .filter(|p| !p.received)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Id of the assigned manager, if any.
    pub fn manager_id(&self) -> Option<&str> {
        self.assigned_manager.as_ref()?.get("_id")?.as_str()
    }

    /// Sum of the requested product prices.
    pub fn expected_total(&self) -> f64 {
        self.products.iter().map(|p| p.price).sum()
    }
}

/// Payload for creating a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer: String,
    pub products: Vec<String>,
}

/// Payload for `PUT /api/orders/{id}`. Only the fields that are set change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<String>>,
}

impl OrderUpdate {
    pub fn customer(id: impl Into<String>) -> Self {
        Self {
            customer: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn products(ids: Vec<String>) -> Self {
        Self {
            products: Some(ids),
            ..Default::default()
        }
    }
}
