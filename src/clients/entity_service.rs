use async_trait::async_trait;
use tracing::debug;

use crate::clients::ApiError;
use crate::framework::{ApiEntity, ApiResponse, ResourceClient};
use crate::model::Credential;
use crate::validation::{ResponseExpectation, ResponseValidator};

/// Trait for resource-specific clients to inherit validated CRUD operations.
///
/// Implementors only expose their [`ResourceClient`] and validator; `create`,
/// `get`, `update` and `delete` come with the status and contract checks the portal
/// guarantees for every collection.
#[async_trait]
pub trait EntityService: Send + Sync {
    type Entity: ApiEntity;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<Self::Entity>;

    fn validator(&self) -> &ResponseValidator;

    /// Creates an entity and expects `201 Created`.
    #[tracing::instrument(skip(self, credential, params))]
    async fn create(
        &self,
        credential: &Credential,
        params: &<Self::Entity as ApiEntity>::Create,
    ) -> Result<Self::Entity, ApiError> {
        let response = self.inner().create(credential, params).await?;
        let expectation = ResponseExpectation::ok(201, <Self::Entity as ApiEntity>::contract());
        self.validator().check(&response, &expectation)?;
        let entity = parse_entity::<Self::Entity>(&response)?;
        debug!(id = entity.id(), "Entity created");
        Ok(entity)
    }

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self, credential))]
    async fn get(&self, credential: &Credential, id: &str) -> Result<Self::Entity, ApiError> {
        let response = self.inner().get(credential, id).await?;
        let expectation = ResponseExpectation::ok(200, <Self::Entity as ApiEntity>::contract());
        self.validator().check(&response, &expectation)?;
        parse_entity(&response)
    }

    /// Replaces an entity's editable fields and expects `200 OK`.
    #[tracing::instrument(skip(self, credential, params))]
    async fn update(
        &self,
        credential: &Credential,
        id: &str,
        params: &<Self::Entity as ApiEntity>::Update,
    ) -> Result<Self::Entity, ApiError> {
        let response = self.inner().update(credential, id, params).await?;
        let expectation = ResponseExpectation::ok(200, <Self::Entity as ApiEntity>::contract());
        self.validator().check(&response, &expectation)?;
        let entity = parse_entity::<Self::Entity>(&response)?;
        debug!(id = entity.id(), "Entity updated");
        Ok(entity)
    }

    /// Delete an entity by ID; the portal answers `204` with no body.
    #[tracing::instrument(skip(self, credential))]
    async fn delete(&self, credential: &Credential, id: &str) -> Result<(), ApiError> {
        let response = self.inner().delete(credential, id).await?;
        self.validator()
            .check(&response, &ResponseExpectation::status(204))?;
        Ok(())
    }
}

pub(crate) fn parse_entity<T: ApiEntity>(response: &ApiResponse) -> Result<T, ApiError> {
    T::from_envelope(response.body()).map_err(|e| ApiError::parse(T::RESOURCE.envelope_key(), e))
}

/// Type-erased deletion used by teardown, one per resource type.
#[async_trait]
pub trait ResourceDeleter: Send + Sync {
    async fn delete_by_id(&self, credential: &Credential, id: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl<S: EntityService> ResourceDeleter for S {
    async fn delete_by_id(&self, credential: &Credential, id: &str) -> Result<(), ApiError> {
        EntityService::delete(self, credential, id).await
    }
}
