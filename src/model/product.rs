use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::unique_suffix;

/// Manufacturers the portal accepts.
pub const MANUFACTURERS: [&str; 8] = [
    "Apple",
    "Samsung",
    "Google",
    "Microsoft",
    "Sony",
    "Xiaomi",
    "Amazon",
    "Tesla",
];

/// A product as returned by the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub price: f64,
    pub amount: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "createdOn")]
    pub created_on: String,
}

/// Payload for creating a new product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub manufacturer: String,
    pub price: f64,
    pub amount: u32,
    pub notes: String,
}

impl ProductCreate {
    /// Random but valid product data. Names are unique, the portal rejects
    /// duplicates with 409.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let suffix = unique_suffix();
        Self {
            name: format!("Widget {suffix}"),
            manufacturer: MANUFACTURERS.choose(&mut rng).copied().unwrap_or("Apple").to_string(),
            price: f64::from(rng.gen_range(1..=99_999u32)),
            amount: rng.gen_range(0..=999),
            notes: format!("fixture product {suffix}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_products_are_valid_and_differ() {
        let products: Vec<_> = (0..32).map(|_| ProductCreate::random()).collect();
        for p in &products {
            assert!(MANUFACTURERS.contains(&p.manufacturer.as_str()));
            assert!((1.0..=99_999.0).contains(&p.price));
            assert!(p.amount <= 999);
        }
        let first = &products[0];
        assert!(products
            .iter()
            .any(|p| p.price != first.price || p.manufacturer != first.manufacturer));
    }
}
