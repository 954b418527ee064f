use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::builder::CompositeOrderBuilder;
use crate::clients::{
    AdminLogin, ApiError, CustomerClient, LoginClient, OrderClient, ProductClient,
};
use crate::config::HarnessConfig;
use crate::framework::{ApiClient, FrameworkError, HttpApiClient};
use crate::lifecycle::{CleanupOrchestrator, ScopeOutcome, TeardownPolicy};
use crate::model::{Credential, Credentials, ResourceType};
use crate::store::EntityStore;
use crate::validation::ResponseValidator;

/// The composition root for portal tests.
///
/// `PortalHarness` is responsible for:
/// - **Dependency Wiring**: one transport shared by every client, the
///   builder and the cleanup orchestrator
/// - **Credential Caching**: the admin credential for test bodies is
///   obtained once per harness
/// - **Scoping**: [`run`](Self::run) gives each test body its own store and
///   tears it down afterwards
///
/// Build one per worker and share it by reference.
///
/// # Example
///
/// ```ignore
/// let harness = PortalHarness::from_config(&HarnessConfig::from_env()?)?;
///
/// let outcome = harness
///     .run(async |store: &mut EntityStore| {
///         let credential = harness.admin_credential().await?;
///         harness.builder.create_order_in_process(store, &credential, 2).await
///     })
///     .await;
/// outcome.teardown_result()?;
/// ```
pub struct PortalHarness {
    pub validator: ResponseValidator,
    pub login: LoginClient,
    pub customers: CustomerClient,
    pub products: ProductClient,
    pub orders: OrderClient,
    pub builder: CompositeOrderBuilder,
    pub cleanup: CleanupOrchestrator,
    admin: Credentials,
    admin_credential: OnceCell<Credential>,
    manager_ids: Vec<String>,
}

impl PortalHarness {
    /// Wires every component over `transport`.
    ///
    /// Teardown logs in through its own [`AdminLogin`] on every run; the
    /// cached admin credential is only handed to test bodies.
    pub fn new(transport: Arc<dyn ApiClient>, admin: Credentials, policy: TeardownPolicy) -> Self {
        let validator = ResponseValidator::default();
        let login = LoginClient::new(transport.clone(), validator.clone());
        let customers = CustomerClient::new(transport.clone(), validator.clone());
        let products = ProductClient::new(transport.clone(), validator.clone());
        let orders = OrderClient::new(transport, validator.clone());

        let builder =
            CompositeOrderBuilder::new(customers.clone(), products.clone(), orders.clone());
        let cleanup = CleanupOrchestrator::new(Arc::new(AdminLogin::new(login.clone(), admin.clone())))
            .with_deleter(ResourceType::Order, Arc::new(orders.clone()))
            .with_deleter(ResourceType::Customer, Arc::new(customers.clone()))
            .with_deleter(ResourceType::Product, Arc::new(products.clone()))
            .with_policy(policy);

        Self {
            validator,
            login,
            customers,
            products,
            orders,
            builder,
            cleanup,
            admin,
            admin_credential: OnceCell::new(),
            manager_ids: Vec::new(),
        }
    }

    /// Harness over HTTP for a live portal.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, FrameworkError> {
        let transport = HttpApiClient::new(&config.api_url, config.request_timeout())?;
        info!(api_url = %transport.base_url(), "Portal harness configured");
        Ok(Self::new(Arc::new(transport), config.credentials.clone(), config.teardown_policy())
            .with_manager_ids(config.manager_ids.clone()))
    }

    /// Manager ids available to tests. The first one becomes the builder's
    /// default manager.
    pub fn with_manager_ids(mut self, manager_ids: Vec<String>) -> Self {
        if let Some(first) = manager_ids.first() {
            self.builder = self.builder.with_manager(first.clone());
        }
        self.manager_ids = manager_ids;
        self
    }

    pub fn manager_ids(&self) -> &[String] {
        &self.manager_ids
    }

    /// The admin credential, logging in on first use.
    pub async fn admin_credential(&self) -> Result<Credential, ApiError> {
        self.admin_credential
            .get_or_try_init(|| self.login.login(&self.admin))
            .await
            .cloned()
    }

    /// Drops the cached credential so the next call logs in again.
    pub fn forget_admin_credential(&mut self) {
        self.admin_credential.take();
    }

    /// Runs `body` in a cleanup scope. See [`CleanupOrchestrator::run`].
    pub async fn run<T, F>(&self, body: F) -> ScopeOutcome<T>
    where
        F: AsyncFnOnce(&mut EntityStore) -> T,
    {
        self.cleanup.run(body).await
    }
}
