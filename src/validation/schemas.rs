//! Response contracts of the sales portal.
//!
//! Every body carries the obligatory `IsSuccess`/`ErrorMessage` pair; entity
//! responses add the entity under its envelope key.

use std::sync::LazyLock;

use super::contract::{
    any, array, boolean, integer, nullable, number, object, one_of_str, string, Contract,
    ObjectContract,
};
use crate::model::{OrderStatus, ResourceType};

fn obligatory() -> ObjectContract {
    object()
        .required("IsSuccess", boolean())
        .required("ErrorMessage", nullable(string()))
}

fn envelope(resource: ResourceType, entity: Contract) -> Contract {
    obligatory().required(resource.envelope_key(), entity).into()
}

pub fn customer() -> Contract {
    object()
        .required("_id", string())
        .required("email", string())
        .required("name", string())
        .required("country", string())
        .required("city", string())
        .required("street", string())
        .required("house", integer())
        .required("flat", integer())
        .required("phone", string())
        .required("createdOn", string())
        .optional("notes", string())
        .into()
}

pub fn product() -> Contract {
    object()
        .required("_id", string())
        .required("name", string())
        .required("manufacturer", string())
        .required("price", number())
        .required("amount", integer())
        .required("createdOn", string())
        .optional("notes", string())
        .into()
}

pub fn delivery() -> Contract {
    let address = object()
        .required("country", string())
        .required("city", string())
        .required("street", string())
        .required("house", integer())
        .required("flat", integer());
    object()
        .required("address", address)
        .required("condition", one_of_str(&["Delivery", "Pickup"]))
        .required("finalDate", string())
        .into()
}

pub fn order() -> Contract {
    let statuses: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
    let line = object()
        .required("_id", string())
        .required("name", string())
        .required("amount", integer())
        .required("price", number())
        .required("manufacturer", string())
        .optional("notes", string())
        .required("received", boolean());
    let comment = object()
        .required("_id", string())
        .required("text", string())
        .required("createdOn", string());
    object()
        .required("_id", string())
        .required("status", one_of_str(&statuses))
        .required("customer", customer())
        .required("products", array(line))
        .required("delivery", nullable(delivery()))
        .required("total_price", number())
        .required("createdOn", string())
        .required("comments", array(comment))
        .required("history", array(any()))
        .optional("assignedManager", nullable(any()))
        .into()
}

/// Body of an error response or a body-less success.
pub static ERROR_RESPONSE: LazyLock<Contract> = LazyLock::new(|| obligatory().into());

pub static LOGIN_RESPONSE: LazyLock<Contract> =
    LazyLock::new(|| obligatory().optional("User", any()).into());

pub static CUSTOMER_RESPONSE: LazyLock<Contract> =
    LazyLock::new(|| envelope(ResourceType::Customer, customer()));

pub static PRODUCT_RESPONSE: LazyLock<Contract> =
    LazyLock::new(|| envelope(ResourceType::Product, product()));

pub static ORDER_RESPONSE: LazyLock<Contract> =
    LazyLock::new(|| envelope(ResourceType::Order, order()));

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_contract_reports_nested_product_paths() {
        let body = json!({
            "IsSuccess": true,
            "ErrorMessage": null,
            "Order": {
                "_id": "o1",
                "status": "In Process",
                "customer": {
                    "_id": "c1", "email": "a@b.c", "name": "A", "country": "USA",
                    "city": "X", "street": "Y", "house": 1, "flat": 2,
                    "phone": "+1", "createdOn": "2024-01-01"
                },
                "products": [
                    {"_id": "p1", "name": "P", "amount": 1, "price": 2.0,
                     "manufacturer": "M", "received": false},
                    {"name": "Q", "amount": 1, "price": 2.0,
                     "manufacturer": "M", "received": false}
                ],
                "delivery": null,
                "total_price": 4.0,
                "createdOn": "2024-01-01",
                "comments": [],
                "history": []
            }
        });

        let failures = ORDER_RESPONSE.check(&body);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].check, "$.Order.products[1]._id");
    }

    #[test]
    fn error_body_needs_obligatory_fields() {
        let failures = ERROR_RESPONSE.check(&json!({"IsSuccess": false}));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].check, "$.ErrorMessage");
    }
}
