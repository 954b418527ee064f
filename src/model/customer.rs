use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{random_country, unique_suffix};

/// A customer as returned by the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house: u32,
    pub flat: u32,
    pub phone: String,
    #[serde(rename = "createdOn")]
    pub created_on: String,
    #[serde(default)]
    pub notes: String,
}

/// Payload for creating a new customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCreate {
    pub email: String,
    pub name: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house: u32,
    pub flat: u32,
    pub phone: String,
    pub notes: String,
}

impl CustomerCreate {
    /// Random but valid customer data.
    pub fn random() -> Self {
        let suffix = unique_suffix();
        let mut rng = rand::thread_rng();
        Self {
            email: format!("customer.{suffix}@example.com"),
            name: format!("Test Customer {suffix}"),
            country: random_country(),
            city: "Springfield".to_string(),
            street: "Evergreen Terrace".to_string(),
            house: rng.gen_range(1..=999),
            flat: rng.gen_range(1..=9_999),
            phone: format!("+1555{:07}", rng.gen_range(0..10_000_000u32)),
            notes: "created by portal-fixtures".to_string(),
        }
    }
}
