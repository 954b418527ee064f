use std::fmt::{self, Display};

/// Kinds of portal entities a test can create and must clean up.
///
/// The set is closed but meant to grow: adding a variant means giving it an
/// endpoint, an envelope key and a place in [`ResourceType::TEARDOWN_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Order,
    Customer,
    Product,
}

impl ResourceType {
    /// Deletion order used at teardown.
    ///
    /// Orders reference customers and products, so they go first. The
    /// referenced types follow in a fixed order.
    pub const TEARDOWN_ORDER: [ResourceType; 3] =
        [ResourceType::Order, ResourceType::Customer, ResourceType::Product];

    /// Collection endpoint, relative to the API base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            ResourceType::Order => "/api/orders",
            ResourceType::Customer => "/api/customers",
            ResourceType::Product => "/api/products",
        }
    }

    /// Key holding the entity inside a response envelope (`{"Order": {...}}`).
    pub fn envelope_key(self) -> &'static str {
        match self {
            ResourceType::Order => "Order",
            ResourceType::Customer => "Customer",
            ResourceType::Product => "Product",
        }
    }

    /// Whether this type holds references to other tracked types.
    pub fn is_referencing(self) -> bool {
        matches!(self, ResourceType::Order)
    }

    /// Path of a single entity of this type.
    pub fn item_path(self, id: &str) -> String {
        format!("{}/{}", self.endpoint(), id)
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Order => "order",
            ResourceType::Customer => "customer",
            ResourceType::Product => "product",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_order_starts_with_referencing_types() {
        let first_referenced = ResourceType::TEARDOWN_ORDER
            .iter()
            .position(|t| !t.is_referencing())
            .unwrap();
        assert!(ResourceType::TEARDOWN_ORDER[..first_referenced]
            .iter()
            .all(|t| t.is_referencing()));
        assert!(ResourceType::TEARDOWN_ORDER[first_referenced..]
            .iter()
            .all(|t| !t.is_referencing()));
    }

    #[test]
    fn item_path_joins_endpoint_and_id() {
        assert_eq!(ResourceType::Product.item_path("abc"), "/api/products/abc");
    }
}
