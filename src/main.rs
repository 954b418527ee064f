//! # Portal Fixtures Demo
//!
//! Runs one order lifecycle against the in-memory portal:
//! 1. Creating a customer, two products and an order.
//! 2. Driving the order to `Partially Received`.
//! 3. Tearing everything down and printing the report.

use std::sync::Arc;

use portal_fixtures::framework::InMemoryPortal;
use portal_fixtures::lifecycle::{setup_tracing, PortalHarness, TeardownPolicy};
use portal_fixtures::model::{Credentials, ResourceType};
use portal_fixtures::store::EntityStore;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let admin = Credentials::new("admin@example.com", "admin-password");
    let portal = Arc::new(InMemoryPortal::new(admin.clone()).with_managers(vec!["manager-1".into()]));
    let harness = PortalHarness::new(portal.clone(), admin, TeardownPolicy::Strict)
        .with_manager_ids(vec!["manager-1".into()]);

    info!("Starting demo scenario");

    let outcome = harness
        .run(async |store: &mut EntityStore| -> Result<String, String> {
            let credential = harness.admin_credential().await.map_err(|e| e.to_string())?;

            let span = tracing::info_span!("order_lifecycle");
            async {
                let composite = harness
                    .builder
                    .create_partially_received_order(store, &credential, 2)
                    .await
                    .map_err(|e| e.to_string())?;
                let order = harness
                    .orders
                    .add_comment(&credential, &composite.order.id, "Second product on back order")
                    .await
                    .map_err(|e| e.to_string())?;
                info!(
                    order_id = %order.id,
                    status = %order.status,
                    manager = ?order.manager_id(),
                    tracked = store.len(),
                    "Order ready"
                );
                Ok::<_, String>(order.id)
            }
            .instrument(span)
            .await
        })
        .await;

    for entry in &outcome.report().entries {
        info!(%entry, "Teardown");
    }
    outcome.teardown_result().map_err(|e| e.to_string())?;

    let left = ResourceType::TEARDOWN_ORDER
        .iter()
        .map(|t| portal.count(*t))
        .sum::<usize>();

    match outcome.into_value() {
        Ok(order_id) => {
            info!(%order_id, left, "Demo complete");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Demo failed");
            Err(e)
        }
    }
}
