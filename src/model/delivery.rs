use chrono::{Duration, Local};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::random_country;

const CITIES: [&str; 6] = [
    "Springfield",
    "Shelbyville",
    "Riverton",
    "Lakewood",
    "Fairview",
    "Ogdenville",
];
const STREETS: [&str; 5] = [
    "Main Street",
    "Oak Avenue",
    "Elm Street",
    "Harbor Road",
    "Maple Lane",
];

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryCondition {
    Delivery,
    Pickup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub country: String,
    pub city: String,
    pub street: String,
    pub house: u32,
    pub flat: u32,
}

/// Delivery information attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub address: DeliveryAddress,
    pub condition: DeliveryCondition,
    /// `YYYY/MM/DD`, the format the portal accepts.
    #[serde(rename = "finalDate")]
    pub final_date: String,
}

impl Delivery {
    /// Home delivery to a random address, scheduled seven days from now.
    pub fn random() -> Self {
        let final_date = (Local::now() + Duration::days(7)).format("%Y/%m/%d").to_string();
        let mut rng = rand::thread_rng();
        Self {
            address: DeliveryAddress {
                country: random_country(),
                city: CITIES.choose(&mut rng).copied().unwrap_or("Springfield").to_string(),
                street: STREETS.choose(&mut rng).copied().unwrap_or("Main Street").to_string(),
                house: rng.gen_range(1..=999),
                flat: rng.gen_range(1..=9_999),
            },
            condition: DeliveryCondition::Delivery,
            final_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_delivery_uses_slash_date_format() {
        let delivery = Delivery::random();
        assert_eq!(delivery.final_date.len(), 10);
        assert_eq!(delivery.final_date.matches('/').count(), 2);
        assert_eq!(delivery.condition, DeliveryCondition::Delivery);
    }

    #[test]
    fn random_addresses_stay_in_range_and_vary() {
        let deliveries: Vec<_> = (0..32).map(|_| Delivery::random()).collect();
        for d in &deliveries {
            assert!(crate::model::COUNTRIES.contains(&d.address.country.as_str()));
            assert!((1..=999).contains(&d.address.house));
            assert!((1..=9_999).contains(&d.address.flat));
        }
        let first = &deliveries[0].address;
        assert!(deliveries.iter().any(|d| d.address != *first));
    }
}
