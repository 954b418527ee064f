use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use portal_fixtures::builder::{BuildError, BuildStep};
use portal_fixtures::clients::{ApiError, EntityService, ResourceDeleter};
use portal_fixtures::framework::{InMemoryPortal, Method};
use portal_fixtures::lifecycle::{setup_tracing, PortalHarness, TeardownPolicy, TeardownStatus};
use portal_fixtures::model::{Credential, Credentials, ResourceType};
use portal_fixtures::store::EntityStore;
use portal_fixtures::validation::{ResponseExpectation, ValidationError};

fn harness(policy: TeardownPolicy) -> (Arc<InMemoryPortal>, PortalHarness) {
    setup_tracing();
    let admin = Credentials::new("admin", "secret");
    let portal = Arc::new(InMemoryPortal::new(admin.clone()));
    let harness = PortalHarness::new(portal.clone(), admin, policy);
    (portal, harness)
}

fn live_entities(portal: &InMemoryPortal) -> usize {
    ResourceType::TEARDOWN_ORDER
        .iter()
        .map(|t| portal.count(*t))
        .sum()
}

fn deleted_paths(portal: &InMemoryPortal) -> Vec<String> {
    portal
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::Delete)
        .map(|r| r.path)
        .collect()
}

#[tokio::test]
async fn order_failure_keeps_children_tracked_and_cleans_them_up() {
    let (portal, harness) = harness(TeardownPolicy::Lenient);
    portal.fail_next(Method::Post, "/api/orders", 500, "Internal server error");

    let outcome = harness
        .run(async |store: &mut EntityStore| {
            let credential = harness.admin_credential().await.unwrap();
            let result = harness
                .builder
                .create_order_with_entities(store, &credential, 2)
                .await;

            assert_eq!(store.ids_of(ResourceType::Customer).len(), 1);
            assert_eq!(store.ids_of(ResourceType::Product).len(), 2);
            assert!(store.ids_of(ResourceType::Order).is_empty());
            result
        })
        .await;

    let err = outcome.value().as_ref().unwrap_err();
    assert_eq!(err.step(), Some(BuildStep::CreateOrder));
    assert!(matches!(
        err,
        BuildError::Step { source: ApiError::Validation(ValidationError::Hard(f)), .. }
            if f.expected == "201" && f.actual == "500"
    ));

    assert_eq!(outcome.report().deleted().count(), 3);
    assert!(deleted_paths(&portal).iter().all(|p| !p.starts_with("/api/orders")));
    assert_eq!(live_entities(&portal), 0);
}

#[tokio::test]
async fn teardown_deletes_orders_before_what_they_reference() {
    let (portal, harness) = harness(TeardownPolicy::Strict);

    let outcome = harness
        .run(async |store: &mut EntityStore| {
            let credential = harness.admin_credential().await.unwrap();
            harness
                .builder
                .create_order_with_entities(store, &credential, 2)
                .await
                .unwrap()
        })
        .await;

    assert!(outcome.teardown_result().is_ok());
    let paths = deleted_paths(&portal);
    assert_eq!(paths.len(), 4);
    assert_eq!(paths[0], format!("/api/orders/{}", outcome.value().order.id));
    assert!(paths[1].starts_with("/api/customers/"));
    assert!(paths[2..].iter().all(|p| p.starts_with("/api/products/")));
    assert_eq!(live_entities(&portal), 0);
}

#[tokio::test]
async fn teardown_logs_in_again_after_token_expiry() {
    let (portal, harness) = harness(TeardownPolicy::Strict);

    let outcome = harness
        .run(async |store: &mut EntityStore| {
            let credential = harness.admin_credential().await.unwrap();
            harness
                .builder
                .create_order_with_entities(store, &credential, 1)
                .await
                .unwrap();
            portal.expire_tokens();
            credential
        })
        .await;

    assert!(outcome.teardown_result().is_ok());
    let body_token = outcome.value().header_value();

    let requests = portal.requests();
    let expired_at = requests
        .iter()
        .rposition(|r| r.method == Method::Post && r.path == "/api/login")
        .unwrap();
    let deletes: Vec<_> = requests[expired_at..]
        .iter()
        .filter(|r| r.method == Method::Delete)
        .collect();

    assert_eq!(deletes.len(), 3);
    assert!(deletes
        .iter()
        .all(|r| r.authorization.as_deref() != Some(body_token.as_str())));
    assert_eq!(live_entities(&portal), 0);
}

#[tokio::test]
async fn strict_mode_reports_teardown_failures_beside_the_value() {
    let (portal, harness) = harness(TeardownPolicy::Strict);
    portal.fail_next(Method::Delete, "/api/products", 500, "Database unavailable");

    let outcome = harness
        .run(async |store: &mut EntityStore| {
            let credential = harness.admin_credential().await.unwrap();
            let product = harness.products.create_random(&credential).await.unwrap();
            store.add(ResourceType::Product, product.id);
            "body finished"
        })
        .await;

    assert_eq!(*outcome.value(), "body finished");
    let err = outcome.teardown_result().unwrap_err();
    assert_eq!(err.leftovers.len(), 1);
    assert!(matches!(err.leftovers[0].status, TeardownStatus::Failed(_)));
    assert_eq!(portal.count(ResourceType::Product), 1);
}

#[tokio::test]
async fn lenient_mode_only_records_failures() {
    let (portal, harness) = harness(TeardownPolicy::Lenient);
    portal.fail_next(Method::Delete, "/api/customers", 500, "Database unavailable");

    let outcome = harness
        .run(async |store: &mut EntityStore| {
            let credential = harness.admin_credential().await.unwrap();
            let customer = harness.customers.create_random(&credential).await.unwrap();
            store.add(ResourceType::Customer, customer.id);
        })
        .await;

    assert!(outcome.teardown_result().is_ok());
    assert_eq!(outcome.report().leftovers().count(), 1);
}

#[tokio::test]
async fn panicking_body_is_torn_down_and_resumed() {
    let (portal, harness) = harness(TeardownPolicy::Lenient);

    let result = AssertUnwindSafe(harness.run(async |store: &mut EntityStore| {
        let credential = harness.admin_credential().await.unwrap();
        harness
            .builder
            .create_order_with_entities(store, &credential, 1)
            .await
            .unwrap();
        panic!("assertion failed inside test body");
    }))
    .catch_unwind()
    .await;

    assert!(result.is_err());
    assert_eq!(live_entities(&portal), 0);
}

#[tokio::test]
async fn strict_panic_carries_both_the_assertion_and_the_teardown_failure() {
    let (portal, harness) = harness(TeardownPolicy::Strict);
    portal.fail_next(Method::Delete, "/api/products", 500, "Database unavailable");

    let panic = AssertUnwindSafe(harness.run(async |store: &mut EntityStore| {
        let credential = harness.admin_credential().await.unwrap();
        let product = harness.products.create_random(&credential).await.unwrap();
        store.add(ResourceType::Product, product.id);
        panic!("test assertion failed");
    }))
    .catch_unwind()
    .await
    .unwrap_err();

    let message = panic.downcast_ref::<String>().unwrap();
    assert!(message.contains("test assertion failed"));
    assert!(message.contains("Teardown left 1 resource(s) behind"));
    assert!(message.contains("status: expected 204, got 500"));
    assert_eq!(portal.count(ResourceType::Product), 1);
}

struct UnreachableDeleter;

#[async_trait::async_trait]
impl ResourceDeleter for UnreachableDeleter {
    async fn delete_by_id(&self, _credential: &Credential, _id: &str) -> Result<(), ApiError> {
        Err(portal_fixtures::framework::FrameworkError::Transport("connection refused".into()).into())
    }
}

#[tokio::test]
async fn injected_deleter_failure_does_not_stop_other_deletions() {
    let (portal, mut harness) = harness(TeardownPolicy::Lenient);
    harness.cleanup = harness
        .cleanup
        .clone()
        .with_deleter(ResourceType::Customer, Arc::new(UnreachableDeleter));

    let outcome = harness
        .run(async |store: &mut EntityStore| {
            let credential = harness.admin_credential().await.unwrap();
            harness
                .builder
                .create_order_with_entities(store, &credential, 2)
                .await
                .unwrap();
        })
        .await;

    let report = outcome.report();
    assert_eq!(report.deleted().count(), 3);
    let leftover: Vec<_> = report.leftovers().collect();
    assert_eq!(leftover.len(), 1);
    assert_eq!(leftover[0].resource, ResourceType::Customer);
    assert_eq!(portal.count(ResourceType::Customer), 1);
    assert_eq!(portal.count(ResourceType::Product), 0);
}

#[tokio::test]
async fn missing_order_is_reported_with_portal_message() {
    let (_portal, harness) = harness(TeardownPolicy::Lenient);
    let credential = harness.admin_credential().await.unwrap();

    let response = harness.orders.inner().get(&credential, "missing").await.unwrap();
    let outcome = harness
        .validator
        .validate(
            &response,
            &ResponseExpectation::error(404, "Order with id 'missing' wasn't found"),
        )
        .unwrap();
    assert!(outcome.passed());

    let err = harness.orders.get(&credential, "missing").await.unwrap_err();
    assert!(matches!(err.validation(), Some(ValidationError::Hard(_))));
}

#[tokio::test]
async fn expired_token_is_rejected_with_not_authorized() {
    let (portal, harness) = harness(TeardownPolicy::Lenient);
    let credential = harness.admin_credential().await.unwrap();
    portal.expire_tokens();

    let response = harness.products.inner().get(&credential, "any").await.unwrap();
    let result = harness
        .validator
        .check(&response, &ResponseExpectation::error(401, "Not authorized"));
    assert!(result.is_ok());
}
