//! # In-Memory Portal
//!
//! A stateful stand-in for the sales portal backend. It speaks the same
//! routes and envelopes as the real service and enforces the rules the
//! fixtures depend on:
//!
//! - every call except login needs a live bearer token;
//! - orders must reference existing customers and products;
//! - customers and products referenced by an order cannot be deleted;
//! - status changes follow [`OrderStatus::can_transition_to`], and an order
//!   needs a delivery before it can be confirmed;
//! - an order's customer and products can only be replaced while it is a
//!   draft.
//!
//! Tests can expire all issued tokens, inject one-off failures on a route and
//! inspect every request that reached the backend.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::framework::{ApiClient, ApiResponse, FrameworkError, Method, RequestOptions};
use crate::model::{Credentials, OrderStatus, ResourceType};

const BAD_REQUEST: &str = "Incorrect request body";
const UNAUTHORIZED: &str = "Not authorized";
const INCORRECT_DELIVERY: &str = "Incorrect Delivery";
const CUSTOMER_MISSING: &str = "Missing customer";
const INVALID_ORDER_STATUS: &str = "Invalid order status";
const ORDER_IS_NOT_PROCESSED: &str = "Can't process order. Please, schedule delivery";
const NOT_DRAFT: &str = "Order is not in Draft status";

/// A request as seen by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
}

struct Fault {
    method: Method,
    path_prefix: String,
    status: u16,
    message: String,
}

#[derive(Default)]
struct PortalState {
    next_id: u64,
    next_token: u64,
    tokens: HashSet<String>,
    customers: BTreeMap<String, Value>,
    products: BTreeMap<String, Value>,
    orders: BTreeMap<String, Value>,
    faults: Vec<Fault>,
    log: Vec<RecordedRequest>,
}

impl PortalState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:024x}", self.next_id)
    }

    fn collection(&mut self, resource: ResourceType) -> &mut BTreeMap<String, Value> {
        match resource {
            ResourceType::Order => &mut self.orders,
            ResourceType::Customer => &mut self.customers,
            ResourceType::Product => &mut self.products,
        }
    }

    fn is_referenced(&self, resource: ResourceType, id: &str) -> bool {
        self.orders.values().any(|order| match resource {
            ResourceType::Customer => order["customer"]["_id"] == id,
            ResourceType::Product => order["products"]
                .as_array()
                .is_some_and(|products| products.iter().any(|p| p["_id"] == id)),
            ResourceType::Order => false,
        })
    }
}

/// In-process fake of the sales portal API.
pub struct InMemoryPortal {
    credentials: Credentials,
    managers: Vec<String>,
    state: Mutex<PortalState>,
}

impl InMemoryPortal {
    /// A portal accepting a single admin login.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            managers: Vec::new(),
            state: Mutex::new(PortalState::default()),
        }
    }

    /// Manager ids that `assign-manager` accepts.
    pub fn with_managers(mut self, managers: Vec<String>) -> Self {
        self.managers = managers;
        self
    }

    /// Invalidates every token issued so far, as if they had all expired.
    pub fn expire_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Makes the next request matching `method` and `path_prefix` fail with an
    /// error envelope, after authorization has been checked.
    pub fn fail_next(&self, method: Method, path_prefix: &str, status: u16, message: &str) {
        self.lock().faults.push(Fault {
            method,
            path_prefix: path_prefix.to_string(),
            status,
            message: message.to_string(),
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().log.clone()
    }

    pub fn count(&self, resource: ResourceType) -> usize {
        self.lock().collection(resource).len()
    }

    pub fn contains(&self, resource: ResourceType, id: &str) -> bool {
        self.lock().collection(resource).contains_key(id)
    }

    pub fn order_status(&self, id: &str) -> Option<OrderStatus> {
        let state = self.lock();
        let order = state.orders.get(id)?;
        serde_json::from_value(order["status"].clone()).ok()
    }

    fn lock(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, state: &mut PortalState, request: &RequestOptions) -> ApiResponse {
        let segments: Vec<&str> = request
            .path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let body = request.body.clone().unwrap_or(Value::Null);

        if request.method == Method::Post && segments == ["api", "login"] {
            return self.login(state, &body);
        }

        let authorized = request
            .header("authorization")
            .map(|h| h.trim_start_matches("Bearer ").to_string())
            .is_some_and(|token| state.tokens.contains(&token));
        if !authorized {
            return error(401, UNAUTHORIZED);
        }

        if let Some(i) = state.faults.iter().position(|f| {
            f.method == request.method && request.path.starts_with(&f.path_prefix)
        }) {
            let fault = state.faults.remove(i);
            return error(fault.status, &fault.message);
        }

        let resource = match segments.get(1) {
            Some(&"customers") => ResourceType::Customer,
            Some(&"products") => ResourceType::Product,
            Some(&"orders") => ResourceType::Order,
            _ => return error(404, "Not found"),
        };

        match (request.method, &segments[2..]) {
            (Method::Post, []) => match resource {
                ResourceType::Order => create_order(state, &body),
                _ => create_simple(state, resource, &body),
            },
            (Method::Get, [id]) => match state.collection(resource).get(*id) {
                Some(entity) => envelope(200, resource, entity.clone()),
                None => not_found(resource, id),
            },
            (Method::Put, [id]) => match resource {
                ResourceType::Order => update_order(state, id, &body),
                _ => update_simple(state, resource, id, &body),
            },
            (Method::Delete, [id]) => delete(state, resource, id),
            (Method::Post, [id, "delivery"]) if resource == ResourceType::Order => {
                add_delivery(state, id, &body)
            }
            (Method::Put, [id, "status"]) if resource == ResourceType::Order => {
                update_status(state, id, &body)
            }
            (Method::Post, [id, "receive"]) if resource == ResourceType::Order => {
                receive(state, id, &body)
            }
            (Method::Put, [id, "assign-manager", manager]) if resource == ResourceType::Order => {
                self.assign_manager(state, id, manager)
            }
            (Method::Put, [id, "unassign-manager"]) if resource == ResourceType::Order => {
                unassign_manager(state, id)
            }
            (Method::Post, [id, "comments"]) if resource == ResourceType::Order => {
                add_comment(state, id, &body)
            }
            (Method::Delete, [id, "comments", comment]) if resource == ResourceType::Order => {
                delete_comment(state, id, comment)
            }
            _ => error(404, "Not found"),
        }
    }

    fn login(&self, state: &mut PortalState, body: &Value) -> ApiResponse {
        let username = body["username"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();
        if username != self.credentials.username || password != self.credentials.password {
            return error(401, "Incorrect credentials");
        }
        state.next_token += 1;
        let token = format!("token-{}", state.next_token);
        state.tokens.insert(token.clone());
        let body = json!({
            "IsSuccess": true,
            "ErrorMessage": Value::Null,
            "User": {"username": username},
        });
        ApiResponse::new(200, body).with_header("authorization", token)
    }

    fn assign_manager(&self, state: &mut PortalState, id: &str, manager: &str) -> ApiResponse {
        if !self.managers.iter().any(|m| m == manager) {
            return error(404, &format!("Manager with id '{manager}' wasn't found"));
        }
        let Some(order) = state.orders.get_mut(id) else {
            return not_found(ResourceType::Order, id);
        };
        order["assignedManager"] = json!({"_id": manager, "username": format!("manager-{manager}")});
        push_history(order, "Manager Assigned");
        envelope(200, ResourceType::Order, order.clone())
    }
}

#[async_trait]
impl ApiClient for InMemoryPortal {
    async fn send(&self, request: RequestOptions) -> Result<ApiResponse, FrameworkError> {
        let mut state = self.lock();
        state.log.push(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
            authorization: request.header("authorization").map(str::to_string),
        });
        let response = self.handle(&mut state, &request);
        debug!(method = %request.method, path = %request.path, status = response.status(), "Portal handled request");
        Ok(response)
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn envelope(status: u16, resource: ResourceType, entity: Value) -> ApiResponse {
    let mut body = Map::new();
    body.insert("IsSuccess".to_string(), Value::Bool(true));
    body.insert("ErrorMessage".to_string(), Value::Null);
    body.insert(resource.envelope_key().to_string(), entity);
    ApiResponse::new(status, Value::Object(body))
}

fn error(status: u16, message: &str) -> ApiResponse {
    ApiResponse::new(status, json!({"IsSuccess": false, "ErrorMessage": message}))
}

fn not_found(resource: ResourceType, id: &str) -> ApiResponse {
    let kind = resource.envelope_key();
    error(404, &format!("{kind} with id '{id}' wasn't found"))
}

fn push_history(order: &mut Value, action: &str) {
    let entry = json!({"status": order["status"].clone(), "action": action, "changedOn": now()});
    if let Some(history) = order["history"].as_array_mut() {
        history.push(entry);
    }
}

fn unique_key(resource: ResourceType) -> &'static str {
    match resource {
        ResourceType::Customer => "email",
        _ => "name",
    }
}

/// 409 when another entity than `own_id` already uses the unique field value.
fn conflict(
    state: &mut PortalState,
    resource: ResourceType,
    fields: &Map<String, Value>,
    own_id: Option<&str>,
) -> Option<ApiResponse> {
    let key = unique_key(resource);
    let Some(unique) = fields.get(key).and_then(Value::as_str) else {
        return Some(error(400, BAD_REQUEST));
    };
    let taken = state
        .collection(resource)
        .iter()
        .any(|(id, existing)| Some(id.as_str()) != own_id && existing[key] == unique);
    if taken {
        let kind = resource.envelope_key();
        return Some(error(409, &format!("{kind} with {key} '{unique}' already exists")));
    }
    None
}

fn create_simple(state: &mut PortalState, resource: ResourceType, body: &Value) -> ApiResponse {
    let Some(fields) = body.as_object() else {
        return error(400, BAD_REQUEST);
    };
    if let Some(response) = conflict(state, resource, fields, None) {
        return response;
    }

    let id = state.next_id();
    let mut entity = fields.clone();
    entity.insert("_id".to_string(), Value::String(id.clone()));
    entity.insert("createdOn".to_string(), Value::String(now()));
    let entity = Value::Object(entity);
    state.collection(resource).insert(id, entity.clone());
    envelope(201, resource, entity)
}

fn update_simple(
    state: &mut PortalState,
    resource: ResourceType,
    id: &str,
    body: &Value,
) -> ApiResponse {
    let Some(fields) = body.as_object() else {
        return error(400, BAD_REQUEST);
    };
    if !state.collection(resource).contains_key(id) {
        return not_found(resource, id);
    }
    if let Some(response) = conflict(state, resource, fields, Some(id)) {
        return response;
    }
    let Some(entity) = state.collection(resource).get_mut(id) else {
        return not_found(resource, id);
    };
    if let Some(existing) = entity.as_object_mut() {
        for (key, value) in fields {
            if key != "_id" && key != "createdOn" {
                existing.insert(key.clone(), value.clone());
            }
        }
    }
    envelope(200, resource, entity.clone())
}

fn lookup_customer(state: &PortalState, customer_id: &str) -> Result<Value, ApiResponse> {
    state
        .customers
        .get(customer_id)
        .cloned()
        .ok_or_else(|| error(400, &format!("Customer with id '{customer_id}' wasn't found")))
}

/// Order lines for the requested product ids, none of them received yet.
fn order_lines(state: &PortalState, product_ids: &[Value]) -> Result<Vec<Value>, ApiResponse> {
    if product_ids.is_empty() {
        return Err(error(400, BAD_REQUEST));
    }
    let mut products = Vec::with_capacity(product_ids.len());
    for product_id in product_ids {
        let product_id = product_id.as_str().unwrap_or_default();
        let Some(product) = state.products.get(product_id) else {
            return Err(error(400, &format!("Product with id '{product_id}' wasn't found")));
        };
        let mut line = product.clone();
        if let Some(fields) = line.as_object_mut() {
            fields.remove("createdOn");
            fields.insert("received".to_string(), Value::Bool(false));
        }
        products.push(line);
    }
    Ok(products)
}

fn total_price(products: &[Value]) -> f64 {
    products.iter().filter_map(|p| p["price"].as_f64()).sum()
}

fn create_order(state: &mut PortalState, body: &Value) -> ApiResponse {
    let Some(customer_id) = body.get("customer").and_then(Value::as_str) else {
        return error(400, CUSTOMER_MISSING);
    };
    let Some(product_ids) = body.get("products").and_then(Value::as_array) else {
        return error(400, BAD_REQUEST);
    };
    let customer = match lookup_customer(state, customer_id) {
        Ok(customer) => customer,
        Err(response) => return response,
    };
    let products = match order_lines(state, product_ids) {
        Ok(products) => products,
        Err(response) => return response,
    };
    let total = total_price(&products);

    let id = state.next_id();
    let mut order = json!({
        "_id": id,
        "status": OrderStatus::Draft.as_str(),
        "customer": customer,
        "products": products,
        "delivery": Value::Null,
        "total_price": total,
        "createdOn": now(),
        "comments": [],
        "history": [],
        "assignedManager": Value::Null,
    });
    push_history(&mut order, "Order created");
    state.orders.insert(id, order.clone());
    envelope(201, ResourceType::Order, order)
}

fn update_order(state: &mut PortalState, id: &str, body: &Value) -> ApiResponse {
    let Some(current) = state.orders.get(id).and_then(order_status) else {
        return not_found(ResourceType::Order, id);
    };
    if current != OrderStatus::Draft {
        return error(400, NOT_DRAFT);
    }
    let customer = match body.get("customer").and_then(Value::as_str) {
        Some(customer_id) => match lookup_customer(state, customer_id) {
            Ok(customer) => Some(customer),
            Err(response) => return response,
        },
        None => None,
    };
    let products = match body.get("products") {
        Some(Value::Array(ids)) => match order_lines(state, ids) {
            Ok(products) => Some(products),
            Err(response) => return response,
        },
        Some(_) => return error(400, BAD_REQUEST),
        None => None,
    };

    let Some(order) = state.orders.get_mut(id) else {
        return not_found(ResourceType::Order, id);
    };
    if let Some(customer) = customer {
        order["customer"] = customer;
        push_history(order, "Customer changed");
    }
    if let Some(products) = products {
        order["total_price"] = json!(total_price(&products));
        order["products"] = Value::Array(products);
        push_history(order, "Requested products changed");
    }
    envelope(200, ResourceType::Order, order.clone())
}

fn unassign_manager(state: &mut PortalState, id: &str) -> ApiResponse {
    let Some(order) = state.orders.get_mut(id) else {
        return not_found(ResourceType::Order, id);
    };
    if order["assignedManager"].is_null() {
        return error(400, "Order has no assigned manager");
    }
    order["assignedManager"] = Value::Null;
    push_history(order, "Manager Unassigned");
    envelope(200, ResourceType::Order, order.clone())
}

fn add_comment(state: &mut PortalState, id: &str, body: &Value) -> ApiResponse {
    let text = match body["comment"].as_str() {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => return error(400, BAD_REQUEST),
    };
    let comment_id = state.next_id();
    let Some(order) = state.orders.get_mut(id) else {
        return not_found(ResourceType::Order, id);
    };
    let comment = json!({"_id": comment_id, "text": text, "createdOn": now()});
    if let Some(comments) = order["comments"].as_array_mut() {
        comments.push(comment);
    }
    envelope(200, ResourceType::Order, order.clone())
}

fn delete_comment(state: &mut PortalState, id: &str, comment_id: &str) -> ApiResponse {
    let Some(order) = state.orders.get_mut(id) else {
        return not_found(ResourceType::Order, id);
    };
    let Some(comments) = order["comments"].as_array_mut() else {
        return error(500, "Corrupted order comments");
    };
    let before = comments.len();
    comments.retain(|c| c["_id"] != comment_id);
    if comments.len() == before {
        return error(404, &format!("Comment with id '{comment_id}' wasn't found"));
    }
    ApiResponse::new(204, Value::Null)
}

fn delete(state: &mut PortalState, resource: ResourceType, id: &str) -> ApiResponse {
    if !state.collection(resource).contains_key(id) {
        return not_found(resource, id);
    }
    if state.is_referenced(resource, id) {
        let kind = resource.envelope_key();
        return error(400, &format!("{kind} with id '{id}' is referenced by an order"));
    }
    state.collection(resource).remove(id);
    ApiResponse::new(204, Value::Null)
}

fn order_status(order: &Value) -> Option<OrderStatus> {
    serde_json::from_value(order["status"].clone()).ok()
}

fn add_delivery(state: &mut PortalState, id: &str, body: &Value) -> ApiResponse {
    let Some(order) = state.orders.get_mut(id) else {
        return not_found(ResourceType::Order, id);
    };
    let valid = body["address"].is_object()
        && body["condition"].is_string()
        && body["finalDate"].is_string();
    if !valid {
        return error(400, INCORRECT_DELIVERY);
    }
    if !matches!(order_status(order), Some(OrderStatus::Draft | OrderStatus::Confirmed)) {
        return error(400, INVALID_ORDER_STATUS);
    }
    order["delivery"] = body.clone();
    push_history(order, "Delivery Scheduled");
    envelope(200, ResourceType::Order, order.clone())
}

fn update_status(state: &mut PortalState, id: &str, body: &Value) -> ApiResponse {
    let Some(order) = state.orders.get_mut(id) else {
        return not_found(ResourceType::Order, id);
    };
    let Ok(target) = serde_json::from_value::<OrderStatus>(body["status"].clone()) else {
        return error(400, INVALID_ORDER_STATUS);
    };
    let Some(current) = order_status(order) else {
        return error(500, "Corrupted order status");
    };
    if target.is_receiving() || !current.can_transition_to(target) {
        return error(400, INVALID_ORDER_STATUS);
    }
    if target == OrderStatus::Confirmed && order["delivery"].is_null() {
        return error(400, ORDER_IS_NOT_PROCESSED);
    }
    order["status"] = Value::String(target.as_str().to_string());
    push_history(order, &format!("Status changed to {target}"));
    envelope(200, ResourceType::Order, order.clone())
}

fn receive(state: &mut PortalState, id: &str, body: &Value) -> ApiResponse {
    let Some(order) = state.orders.get_mut(id) else {
        return not_found(ResourceType::Order, id);
    };
    if !matches!(
        order_status(order),
        Some(OrderStatus::InProcess | OrderStatus::PartiallyReceived)
    ) {
        return error(400, INVALID_ORDER_STATUS);
    }
    let Some(requested) = body["products"].as_array() else {
        return error(400, BAD_REQUEST);
    };
    if requested.is_empty() {
        return error(400, BAD_REQUEST);
    }

    let mut lines = order["products"].as_array().cloned().unwrap_or_default();
    for product_id in requested {
        let product_id = product_id.as_str().unwrap_or_default();
        let Some(line) = lines
            .iter_mut()
            .find(|line| line["_id"] == product_id && line["received"] == false)
        else {
            return error(400, &format!("Product with Id '{product_id}' is not requested"));
        };
        line["received"] = Value::Bool(true);
    }
    let all_received = lines.iter().all(|line| line["received"] == true);
    let next = if all_received {
        OrderStatus::Received
    } else {
        OrderStatus::PartiallyReceived
    };
    order["products"] = Value::Array(lines);
    order["status"] = Value::String(next.as_str().to_string());
    push_history(order, if all_received { "All products received" } else { "Received" });
    envelope(200, ResourceType::Order, order.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Credential;

    fn portal() -> InMemoryPortal {
        InMemoryPortal::new(Credentials::new("admin", "secret"))
    }

    async fn login(portal: &InMemoryPortal) -> Credential {
        let request = RequestOptions::new(Method::Post, "/api/login")
            .with_json(json!({"username": "admin", "password": "secret"}));
        let response = portal.send(request).await.unwrap();
        Credential::new(response.header("authorization").unwrap())
    }

    async fn post(portal: &InMemoryPortal, cred: &Credential, path: &str, body: Value) -> ApiResponse {
        let request = RequestOptions::new(Method::Post, path)
            .with_credential(cred)
            .with_json(body);
        portal.send(request).await.unwrap()
    }

    #[tokio::test]
    async fn rejects_calls_without_live_token() {
        let portal = portal();
        let cred = login(&portal).await;
        portal.expire_tokens();

        let response = post(&portal, &cred, "/api/products", json!({"name": "x"})).await;
        assert_eq!(response.status(), 401);
        assert_eq!(response.body()["ErrorMessage"], UNAUTHORIZED);
    }

    #[tokio::test]
    async fn referenced_products_cannot_be_deleted_before_the_order() {
        let portal = portal();
        let cred = login(&portal).await;
        let customer = post(&portal, &cred, "/api/customers", json!({"email": "a@b.c", "name": "A"})).await;
        let product = post(&portal, &cred, "/api/products", json!({"name": "P", "price": 5.0})).await;
        let customer_id = customer.body()["Customer"]["_id"].as_str().unwrap().to_string();
        let product_id = product.body()["Product"]["_id"].as_str().unwrap().to_string();

        let order = post(
            &portal,
            &cred,
            "/api/orders",
            json!({"customer": customer_id, "products": [product_id]}),
        )
        .await;
        assert_eq!(order.status(), 201);
        assert_eq!(order.body()["Order"]["total_price"], 5.0);

        let delete = RequestOptions::new(Method::Delete, format!("/api/products/{product_id}"))
            .with_credential(&cred);
        let response = portal.send(delete).await.unwrap();
        assert_eq!(response.status(), 400);
        assert!(portal.contains(ResourceType::Product, &product_id));
    }

    async fn send(
        portal: &InMemoryPortal,
        cred: &Credential,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResponse {
        let mut request = RequestOptions::new(method, path).with_credential(cred);
        if let Some(body) = body {
            request = request.with_json(body);
        }
        portal.send(request).await.unwrap()
    }

    async fn draft_order(portal: &InMemoryPortal, cred: &Credential) -> (String, String) {
        let customer = post(portal, cred, "/api/customers", json!({"email": "a@b.c", "name": "A"})).await;
        let product = post(portal, cred, "/api/products", json!({"name": "P", "price": 5.0})).await;
        let customer_id = customer.body()["Customer"]["_id"].as_str().unwrap().to_string();
        let product_id = product.body()["Product"]["_id"].as_str().unwrap().to_string();
        let order = post(
            portal,
            cred,
            "/api/orders",
            json!({"customer": customer_id, "products": [product_id]}),
        )
        .await;
        let order_id = order.body()["Order"]["_id"].as_str().unwrap().to_string();
        (order_id, product_id)
    }

    #[tokio::test]
    async fn product_update_keeps_id_and_rejects_taken_names() {
        let portal = portal();
        let cred = login(&portal).await;
        let first = post(&portal, &cred, "/api/products", json!({"name": "First", "price": 1.0})).await;
        post(&portal, &cred, "/api/products", json!({"name": "Second", "price": 1.0})).await;
        let id = first.body()["Product"]["_id"].as_str().unwrap().to_string();
        let path = format!("/api/products/{id}");

        let renamed = send(&portal, &cred, Method::Put, &path, Some(json!({"name": "First", "price": 7.5}))).await;
        assert_eq!(renamed.status(), 200);
        assert_eq!(renamed.body()["Product"]["_id"], id.as_str());
        assert_eq!(renamed.body()["Product"]["price"], 7.5);

        let taken = send(&portal, &cred, Method::Put, &path, Some(json!({"name": "Second"}))).await;
        assert_eq!(taken.status(), 409);
    }

    #[tokio::test]
    async fn order_products_can_only_change_in_draft() {
        let portal = portal();
        let cred = login(&portal).await;
        let (order_id, _) = draft_order(&portal, &cred).await;
        let other = post(&portal, &cred, "/api/products", json!({"name": "Q", "price": 3.0})).await;
        let other_id = other.body()["Product"]["_id"].as_str().unwrap().to_string();
        let path = format!("/api/orders/{order_id}");

        let updated = send(&portal, &cred, Method::Put, &path, Some(json!({"products": [other_id, other_id]}))).await;
        assert_eq!(updated.status(), 200);
        assert_eq!(updated.body()["Order"]["total_price"], 6.0);

        portal.lock().orders.get_mut(&order_id).unwrap()["status"] = json!("Canceled");
        let rejected = send(&portal, &cred, Method::Put, &path, Some(json!({"products": [other_id]}))).await;
        assert_eq!(rejected.status(), 400);
        assert_eq!(rejected.body()["ErrorMessage"], NOT_DRAFT);
    }

    #[tokio::test]
    async fn comments_are_added_and_removed() {
        let portal = portal();
        let cred = login(&portal).await;
        let (order_id, _) = draft_order(&portal, &cred).await;
        let comments = format!("/api/orders/{order_id}/comments");

        let empty = send(&portal, &cred, Method::Post, &comments, Some(json!({"comment": " "}))).await;
        assert_eq!(empty.status(), 400);

        let added = send(&portal, &cred, Method::Post, &comments, Some(json!({"comment": "ring twice"}))).await;
        assert_eq!(added.status(), 200);
        let comment_id = added.body()["Order"]["comments"][0]["_id"].as_str().unwrap().to_string();

        let path = format!("{comments}/{comment_id}");
        assert_eq!(send(&portal, &cred, Method::Delete, &path, None).await.status(), 204);
        assert_eq!(send(&portal, &cred, Method::Delete, &path, None).await.status(), 404);
    }

    #[tokio::test]
    async fn manager_can_be_unassigned_once() {
        let portal = portal().with_managers(vec!["m1".to_string()]);
        let cred = login(&portal).await;
        let (order_id, _) = draft_order(&portal, &cred).await;
        let assign = format!("/api/orders/{order_id}/assign-manager/m1");
        let unassign = format!("/api/orders/{order_id}/unassign-manager");

        assert_eq!(send(&portal, &cred, Method::Put, &assign, None).await.status(), 200);
        let cleared = send(&portal, &cred, Method::Put, &unassign, None).await;
        assert_eq!(cleared.status(), 200);
        assert!(cleared.body()["Order"]["assignedManager"].is_null());
        assert_eq!(send(&portal, &cred, Method::Put, &unassign, None).await.status(), 400);
    }

    #[tokio::test]
    async fn injected_fault_is_consumed_once() {
        let portal = portal();
        let cred = login(&portal).await;
        portal.fail_next(Method::Post, "/api/products", 500, "boom");

        let first = post(&portal, &cred, "/api/products", json!({"name": "P"})).await;
        let second = post(&portal, &cred, "/api/products", json!({"name": "P"})).await;
        assert_eq!(first.status(), 500);
        assert_eq!(second.status(), 201);
    }
}
