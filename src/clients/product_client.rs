use std::sync::Arc;

use crate::clients::entity_service::EntityService;
use crate::clients::ApiError;
use crate::framework::{ApiClient, ApiEntity, ResourceClient};
use crate::model::{Credential, Product, ProductCreate, ResourceType};
use crate::validation::{schemas, Contract, ResponseValidator};

impl ApiEntity for Product {
    type Create = ProductCreate;
    type Update = ProductCreate;

    const RESOURCE: ResourceType = ResourceType::Product;

    fn id(&self) -> &str {
        &self.id
    }

    fn contract() -> &'static Contract {
        &schemas::PRODUCT_RESPONSE
    }
}

/// Client for the `/api/products` collection.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
    validator: ResponseValidator,
}

impl ProductClient {
    pub fn new(transport: Arc<dyn ApiClient>, validator: ResponseValidator) -> Self {
        Self {
            inner: ResourceClient::new(transport),
            validator,
        }
    }

    pub async fn create_random(&self, credential: &Credential) -> Result<Product, ApiError> {
        self.create(credential, &ProductCreate::random()).await
    }
}

impl EntityService for ProductClient {
    type Entity = Product;

    fn inner(&self) -> &ResourceClient<Product> {
        &self.inner
    }

    fn validator(&self) -> &ResponseValidator {
        &self.validator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockApiClient;
    use crate::framework::Method;
    use crate::validation::ValidationError;
    use serde_json::json;

    fn product_json(id: &str) -> serde_json::Value {
        json!({
            "_id": id, "name": "Widget", "manufacturer": "Apple", "price": 100.0,
            "amount": 10, "notes": "", "createdOn": "2024-01-01T00:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn create_parses_validated_entity() {
        let mut mock = MockApiClient::new();
        mock.expect(Method::Post, "/api/products")
            .return_envelope(201, "Product", product_json("p1"));
        let client = ProductClient::new(mock.client(), ResponseValidator::default());

        let product = client.create_random(&Credential::new("tok")).await.unwrap();
        assert_eq!(product.id, "p1");
        mock.verify();
    }

    #[tokio::test]
    async fn create_with_wrong_status_is_a_hard_failure() {
        let mut mock = MockApiClient::new();
        mock.expect(Method::Post, "/api/products")
            .return_envelope(200, "Product", product_json("p1"));
        let client = ProductClient::new(mock.client(), ResponseValidator::default());

        let err = client.create_random(&Credential::new("tok")).await.unwrap_err();
        assert!(matches!(err.validation(), Some(ValidationError::Hard(f)) if f.expected == "201"));
    }

    #[tokio::test]
    async fn delete_expects_no_content() {
        let mut mock = MockApiClient::new();
        mock.expect(Method::Delete, "/api/products/p1")
            .return_error(404, "Product with id 'p1' wasn't found");
        let client = ProductClient::new(mock.client(), ResponseValidator::default());

        let err = client.delete(&Credential::new("tok"), "p1").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
