use std::sync::Arc;

use crate::clients::entity_service::EntityService;
use crate::clients::ApiError;
use crate::framework::{ApiClient, ApiEntity, ResourceClient};
use crate::model::{Credential, Customer, CustomerCreate, ResourceType};
use crate::validation::{schemas, Contract, ResponseValidator};

impl ApiEntity for Customer {
    type Create = CustomerCreate;
    type Update = CustomerCreate;

    const RESOURCE: ResourceType = ResourceType::Customer;

    fn id(&self) -> &str {
        &self.id
    }

    fn contract() -> &'static Contract {
        &schemas::CUSTOMER_RESPONSE
    }
}

/// Client for the `/api/customers` collection.
#[derive(Clone)]
pub struct CustomerClient {
    inner: ResourceClient<Customer>,
    validator: ResponseValidator,
}

impl CustomerClient {
    pub fn new(transport: Arc<dyn ApiClient>, validator: ResponseValidator) -> Self {
        Self {
            inner: ResourceClient::new(transport),
            validator,
        }
    }

    pub async fn create_random(&self, credential: &Credential) -> Result<Customer, ApiError> {
        self.create(credential, &CustomerCreate::random()).await
    }
}

impl EntityService for CustomerClient {
    type Entity = Customer;

    fn inner(&self) -> &ResourceClient<Customer> {
        &self.inner
    }

    fn validator(&self) -> &ResponseValidator {
        &self.validator
    }
}
