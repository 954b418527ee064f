//! # Composite Order Builder
//!
//! Builds an order together with the customer and products it references,
//! and drives orders through their lifecycle.
//!
//! # Architecture Note
//! Every id goes into the caller's [`EntityStore`] right after its own
//! creation succeeds. If product #2 fails, the customer and product #1 are
//! already tracked, so teardown removes them even though the build returned an
//! error. Sub-resource calls (delivery, status, receive) register nothing.

use tracing::{info, instrument, warn};

use super::error::{AtStep, BuildError, BuildStep};
use crate::clients::{CustomerClient, EntityService, OrderClient, ProductClient};
use crate::model::{Credential, Delivery, Order, OrderCreate, OrderStatus, ResourceType};
use crate::store::EntityStore;

/// An order plus the ids created to support it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOrder {
    pub order: Order,
    pub customer_id: String,
    pub product_ids: Vec<String>,
}

#[derive(Clone)]
pub struct CompositeOrderBuilder {
    customers: CustomerClient,
    products: ProductClient,
    orders: OrderClient,
    manager_id: Option<String>,
}

impl CompositeOrderBuilder {
    pub fn new(customers: CustomerClient, products: ProductClient, orders: OrderClient) -> Self {
        Self {
            customers,
            products,
            orders,
            manager_id: None,
        }
    }

    /// Manager assigned by [`create_order_in_status`](Self::create_order_in_status)
    /// before the order leaves `Draft`.
    pub fn with_manager(mut self, manager_id: impl Into<String>) -> Self {
        self.manager_id = Some(manager_id.into());
        self
    }

    pub fn manager_id(&self) -> Option<&str> {
        self.manager_id.as_deref()
    }

    /// Creates a customer, `product_count` products and a draft order
    /// referencing them.
    #[instrument(skip(self, store, credential))]
    pub async fn create_order_with_entities(
        &self,
        store: &mut EntityStore,
        credential: &Credential,
        product_count: usize,
    ) -> Result<CompositeOrder, BuildError> {
        let customer = self
            .customers
            .create_random(credential)
            .await
            .at(BuildStep::CreateCustomer)?;
        store.add(ResourceType::Customer, customer.id.clone());

        let mut product_ids = Vec::with_capacity(product_count);
        for index in 0..product_count {
            let product = self
                .products
                .create_random(credential)
                .await
                .at(BuildStep::CreateProduct { index })?;
            store.add(ResourceType::Product, product.id.clone());
            product_ids.push(product.id);
        }

        let params = OrderCreate {
            customer: customer.id.clone(),
            products: product_ids.clone(),
        };
        let order = self
            .orders
            .create(credential, &params)
            .await
            .at(BuildStep::CreateOrder)?;
        store.add(ResourceType::Order, order.id.clone());
        info!(order_id = %order.id, products = product_ids.len(), "Composite order created");

        Ok(CompositeOrder {
            order,
            customer_id: customer.id,
            product_ids,
        })
    }

    /// Schedules a delivery; a random one a week out when none is given.
    pub async fn add_delivery(
        &self,
        credential: &Credential,
        order_id: &str,
        delivery: Option<Delivery>,
    ) -> Result<Order, BuildError> {
        let delivery = delivery.unwrap_or_else(Delivery::random);
        self.orders
            .add_delivery(credential, order_id, &delivery)
            .await
            .at(BuildStep::AddDelivery)
    }

    pub async fn assign_manager(
        &self,
        credential: &Credential,
        order_id: &str,
        manager_id: &str,
    ) -> Result<Order, BuildError> {
        self.orders
            .assign_manager(credential, order_id, manager_id)
            .await
            .at(BuildStep::AssignManager)
    }

    /// One validated transition.
    ///
    /// `Partially Received` receives the first pending product, `Received`
    /// receives every pending product; other targets use the status endpoint.
    /// Illegal transitions are left to the portal to reject.
    pub async fn transition(
        &self,
        credential: &Credential,
        order: &Order,
        target: OrderStatus,
    ) -> Result<Order, BuildError> {
        let step = BuildStep::Transition {
            from: order.status,
            to: target,
        };

        let result = if target.is_receiving() {
            let mut pending = order.pending_product_ids();
            if target == OrderStatus::PartiallyReceived {
                pending.truncate(1);
            }
            if pending.is_empty() {
                return Err(BuildError::NothingToReceive {
                    order_id: order.id.clone(),
                });
            }
            self.orders.receive(credential, &order.id, &pending).await
        } else {
            self.orders.update_status(credential, &order.id, target).await
        };

        result
            .inspect_err(|e| warn!(order_id = %order.id, %step, error = %e, "Transition rejected"))
            .at(step)
    }

    /// Applies `path` in order; the first failure stops the sequence.
    pub async fn drive(
        &self,
        credential: &Credential,
        order: Order,
        path: &[OrderStatus],
    ) -> Result<Order, BuildError> {
        let mut order = order;
        for &target in path {
            order = self.transition(credential, &order, target).await?;
        }
        Ok(order)
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    /// A draft order with a scheduled delivery.
    pub async fn create_order_with_delivery(
        &self,
        store: &mut EntityStore,
        credential: &Credential,
        product_count: usize,
    ) -> Result<CompositeOrder, BuildError> {
        let mut composite = self
            .create_order_with_entities(store, credential, product_count)
            .await?;
        composite.order = self
            .add_delivery(credential, &composite.order.id, None)
            .await?;
        Ok(composite)
    }

    /// An order walked from `Draft` to `target`, scheduling the delivery
    /// first when the path passes through `Confirmed`.
    ///
    /// With a manager configured the manager is assigned while the order is
    /// still a draft, for every target including `Draft` itself.
    pub async fn create_order_in_status(
        &self,
        store: &mut EntityStore,
        credential: &Credential,
        target: OrderStatus,
        product_count: usize,
    ) -> Result<CompositeOrder, BuildError> {
        let path = target.path_from_draft();
        let mut composite = if path.contains(&OrderStatus::Confirmed) {
            self.create_order_with_delivery(store, credential, product_count)
                .await?
        } else {
            self.create_order_with_entities(store, credential, product_count)
                .await?
        };
        if let Some(manager_id) = &self.manager_id {
            composite.order = self
                .assign_manager(credential, &composite.order.id, manager_id)
                .await?;
        }
        composite.order = self.drive(credential, composite.order, &path).await?;
        Ok(composite)
    }

    pub async fn create_confirmed_order(
        &self,
        store: &mut EntityStore,
        credential: &Credential,
        product_count: usize,
    ) -> Result<CompositeOrder, BuildError> {
        self.create_order_in_status(store, credential, OrderStatus::Confirmed, product_count)
            .await
    }

    pub async fn create_order_in_process(
        &self,
        store: &mut EntityStore,
        credential: &Credential,
        product_count: usize,
    ) -> Result<CompositeOrder, BuildError> {
        self.create_order_in_status(store, credential, OrderStatus::InProcess, product_count)
            .await
    }

    pub async fn create_canceled_order(
        &self,
        store: &mut EntityStore,
        credential: &Credential,
        product_count: usize,
    ) -> Result<CompositeOrder, BuildError> {
        self.create_order_in_status(store, credential, OrderStatus::Canceled, product_count)
            .await
    }

    /// Receives only the first product, so at least two are created.
    pub async fn create_partially_received_order(
        &self,
        store: &mut EntityStore,
        credential: &Credential,
        product_count: usize,
    ) -> Result<CompositeOrder, BuildError> {
        self.create_order_in_status(
            store,
            credential,
            OrderStatus::PartiallyReceived,
            product_count.max(2),
        )
        .await
    }

    pub async fn create_received_order(
        &self,
        store: &mut EntityStore,
        credential: &Credential,
        product_count: usize,
    ) -> Result<CompositeOrder, BuildError> {
        self.create_order_in_status(store, credential, OrderStatus::Received, product_count)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockApiClient;
    use crate::framework::Method;
    use crate::validation::ResponseValidator;
    use serde_json::json;

    fn builder(mock: &MockApiClient) -> CompositeOrderBuilder {
        let validator = ResponseValidator::default();
        CompositeOrderBuilder::new(
            CustomerClient::new(mock.client(), validator.clone()),
            ProductClient::new(mock.client(), validator.clone()),
            OrderClient::new(mock.client(), validator),
        )
    }

    #[tokio::test]
    async fn failure_at_second_product_keeps_earlier_ids() {
        let mut mock = MockApiClient::new();
        mock.expect(Method::Post, "/api/customers").return_envelope(
            201,
            "Customer",
            json!({
                "_id": "c1", "email": "a@b.c", "name": "A", "country": "USA",
                "city": "X", "street": "Y", "house": 1, "flat": 2, "phone": "+1",
                "createdOn": "2024-01-01T00:00:00.000Z", "notes": ""
            }),
        );
        mock.expect(Method::Post, "/api/products").return_envelope(
            201,
            "Product",
            json!({
                "_id": "p1", "name": "W", "manufacturer": "Apple", "price": 1.0,
                "amount": 1, "createdOn": "2024-01-01T00:00:00.000Z", "notes": ""
            }),
        );
        mock.expect(Method::Post, "/api/products")
            .return_error(500, "Internal server error");

        let mut store = EntityStore::new();
        let err = builder(&mock)
            .create_order_with_entities(&mut store, &Credential::new("tok"), 3)
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(BuildStep::CreateProduct { index: 1 }));
        assert_eq!(store.ids_of(ResourceType::Customer), vec!["c1"]);
        assert_eq!(store.ids_of(ResourceType::Product), vec!["p1"]);
        assert!(store.ids_of(ResourceType::Order).is_empty());
        mock.verify();
    }

    #[tokio::test]
    async fn unknown_default_manager_fails_at_assignment() {
        let mut mock = MockApiClient::new();
        mock.expect(Method::Put, "/api/orders/o1/assign-manager/m1")
            .return_error(404, "Manager with id 'm1' wasn't found");
        let builder = builder(&mock).with_manager("m1");
        assert_eq!(builder.manager_id(), Some("m1"));

        let err = builder
            .assign_manager(&Credential::new("tok"), "o1", "m1")
            .await
            .unwrap_err();
        assert_eq!(err.step(), Some(BuildStep::AssignManager));
        mock.verify();
    }

    #[tokio::test]
    async fn partially_received_sends_only_first_pending_product() {
        let mut mock = MockApiClient::new();
        mock.expect(Method::Post, "/api/orders/o1/receive")
            .return_error(400, "Invalid order status");

        let order: Order = serde_json::from_value(json!({
            "_id": "o1",
            "status": "In Process",
            "customer": {
                "_id": "c1", "email": "a@b.c", "name": "A", "country": "USA",
                "city": "X", "street": "Y", "house": 1, "flat": 2, "phone": "+1",
                "createdOn": "2024-01-01"
            },
            "products": [
                {"_id": "p1", "name": "W", "amount": 1, "price": 1.0, "manufacturer": "M", "received": true},
                {"_id": "p2", "name": "W", "amount": 1, "price": 1.0, "manufacturer": "M", "received": false},
                {"_id": "p3", "name": "W", "amount": 1, "price": 1.0, "manufacturer": "M", "received": false}
            ],
            "delivery": null,
            "total_price": 3.0,
            "createdOn": "2024-01-01"
        }))
        .unwrap();

        let err = builder(&mock)
            .transition(&Credential::new("tok"), &order, OrderStatus::PartiallyReceived)
            .await
            .unwrap_err();

        assert_eq!(
            err.step(),
            Some(BuildStep::Transition {
                from: OrderStatus::InProcess,
                to: OrderStatus::PartiallyReceived
            })
        );
        assert_eq!(mock.requests()[0].body, Some(json!({"products": ["p2"]})));
    }
}
