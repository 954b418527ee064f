use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::clients::entity_service::{parse_entity, EntityService};
use crate::clients::ApiError;
use crate::framework::{ApiClient, ApiEntity, Method, ResourceClient};
use crate::model::{Credential, Delivery, Order, OrderCreate, OrderStatus, OrderUpdate, ResourceType};
use crate::validation::{schemas, Contract, ResponseExpectation, ResponseValidator};

impl ApiEntity for Order {
    type Create = OrderCreate;
    type Update = OrderUpdate;

    const RESOURCE: ResourceType = ResourceType::Order;

    fn id(&self) -> &str {
        &self.id
    }

    fn contract() -> &'static Contract {
        &schemas::ORDER_RESPONSE
    }
}

/// Client for `/api/orders` and the order sub-resources.
///
/// Sub-resource calls (delivery, status, receive, manager, comments) change an
/// existing order and never create a new id. Replacing the customer or the
/// requested products goes through [`EntityService::update`] with an
/// [`OrderUpdate`].
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    validator: ResponseValidator,
}

impl OrderClient {
    pub fn new(transport: Arc<dyn ApiClient>, validator: ResponseValidator) -> Self {
        Self {
            inner: ResourceClient::new(transport),
            validator,
        }
    }

    #[instrument(skip(self, credential, delivery))]
    pub async fn add_delivery(
        &self,
        credential: &Credential,
        order_id: &str,
        delivery: &Delivery,
    ) -> Result<Order, ApiError> {
        let body = serde_json::to_value(delivery).map_err(|e| ApiError::parse("Delivery", e))?;
        self.order_action(credential, Method::Post, order_id, "delivery", Some(body))
            .await
    }

    /// Plain status change (`Confirmed`, `In Process`, `Canceled`).
    #[instrument(skip(self, credential))]
    pub async fn update_status(
        &self,
        credential: &Credential,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let body = json!({ "status": status.as_str() });
        let order = self
            .order_action(credential, Method::Put, order_id, "status", Some(body))
            .await?;
        info!(order_id, status = %order.status, "Order status changed");
        Ok(order)
    }

    /// Marks products as received; the portal moves the order to
    /// `Partially Received` or `Received`.
    #[instrument(skip(self, credential))]
    pub async fn receive(
        &self,
        credential: &Credential,
        order_id: &str,
        product_ids: &[String],
    ) -> Result<Order, ApiError> {
        let body = json!({ "products": product_ids });
        self.order_action(credential, Method::Post, order_id, "receive", Some(body))
            .await
    }

    #[instrument(skip(self, credential))]
    pub async fn assign_manager(
        &self,
        credential: &Credential,
        order_id: &str,
        manager_id: &str,
    ) -> Result<Order, ApiError> {
        let suffix = format!("assign-manager/{manager_id}");
        self.order_action(credential, Method::Put, order_id, &suffix, None)
            .await
    }

    #[instrument(skip(self, credential))]
    pub async fn unassign_manager(
        &self,
        credential: &Credential,
        order_id: &str,
    ) -> Result<Order, ApiError> {
        self.order_action(credential, Method::Put, order_id, "unassign-manager", None)
            .await
    }

    #[instrument(skip(self, credential, text))]
    pub async fn add_comment(
        &self,
        credential: &Credential,
        order_id: &str,
        text: &str,
    ) -> Result<Order, ApiError> {
        let body = json!({ "comment": text });
        self.order_action(credential, Method::Post, order_id, "comments", Some(body))
            .await
    }

    /// Removes one comment; the portal answers `204` with no body.
    #[instrument(skip(self, credential))]
    pub async fn delete_comment(
        &self,
        credential: &Credential,
        order_id: &str,
        comment_id: &str,
    ) -> Result<(), ApiError> {
        let suffix = format!("comments/{comment_id}");
        let response = self
            .inner
            .call_item(credential, Method::Delete, order_id, &suffix, None)
            .await?;
        self.validator
            .check(&response, &ResponseExpectation::status(204))?;
        Ok(())
    }

    async fn order_action(
        &self,
        credential: &Credential,
        method: Method,
        order_id: &str,
        suffix: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Order, ApiError> {
        let response = self
            .inner
            .call_item(credential, method, order_id, suffix, body)
            .await?;
        self.validator
            .check(&response, &ResponseExpectation::ok(200, Order::contract()))?;
        parse_entity(&response)
    }
}

impl EntityService for OrderClient {
    type Entity = Order;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn validator(&self) -> &ResponseValidator {
        &self.validator
    }
}
