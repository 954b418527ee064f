//! Pure data structures (DTOs) exchanged with the sales portal API.
//!
//! Response types deserialize straight from the portal's JSON envelopes; the
//! `*Create` payloads serialize into request bodies and can be generated with
//! random, valid data for fixtures.

pub mod credentials;
pub mod customer;
pub mod delivery;
pub mod order;
pub mod product;
pub mod resource;
pub mod status;

pub use credentials::*;
pub use customer::*;
pub use delivery::*;
pub use order::*;
pub use product::*;
pub use resource::*;
pub use status::*;

use rand::seq::SliceRandom;

/// Countries the portal accepts in customer and delivery addresses.
pub const COUNTRIES: [&str; 8] = [
    "USA",
    "Canada",
    "Belarus",
    "Ukraine",
    "Germany",
    "France",
    "Great Britain",
    "Russia",
];

pub(crate) fn random_country() -> String {
    let mut rng = rand::thread_rng();
    COUNTRIES.choose(&mut rng).copied().unwrap_or("USA").to_string()
}

/// Short random suffix used to keep generated names unique across parallel runs.
pub(crate) fn unique_suffix() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(10);
    id
}
