//! boundary_credential_store_static

use async_trait::async_trait;
use tfplug::schema::Attribute;

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::credential_stores::{
    CreateCredentialStoreRequest, CredentialStore, CredentialStoreAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticCredentialStoreModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl StateModel for StaticCredentialStoreModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref());
    }
}

impl TryFrom<CredentialStore> for Tracked<StaticCredentialStoreModel> {
    type Error = ApiError;

    fn try_from(store: CredentialStore) -> Result<Self, ApiError> {
        if store.kind != "static" {
            return Err(ApiError::ParseError(format!(
                "credential store {} is of type \"{}\", not static",
                store.meta.id, store.kind
            )));
        }
        Ok(Tracked {
            model: StaticCredentialStoreModel {
                scope_id: store.meta.scope_id.clone().unwrap_or_default(),
                name: store.meta.name.clone(),
                description: store.meta.description.clone(),
            },
            meta: store.meta,
        })
    }
}

#[derive(Default)]
pub struct CredentialStoreStaticResource;

#[async_trait]
impl BoundaryResource for CredentialStoreStaticResource {
    type Model = StaticCredentialStoreModel;

    const TYPE_NAME: &'static str = "boundary_credential_store_static";
    const DESCRIPTION: &'static str = "A credential store holding credentials managed by Boundary";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "scope_id",
                "The project the store belongs to",
                BoundaryIdValidator::new(&["p"]),
            ),
            name_attribute(),
            description_attribute(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &StaticCredentialStoreModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<StaticCredentialStoreModel>, ApiError> {
        let request = CreateCredentialStoreRequest {
            scope_id: plan.scope_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: CredentialStoreAttributes::Static {},
        };
        client.credential_stores().create(&request).await?.try_into()
    }

    async fn read(
        &self,
        client: &Client,
        id: &str,
    ) -> Result<Tracked<StaticCredentialStoreModel>, ApiError> {
        client.credential_stores().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<StaticCredentialStoreModel>,
        plan: &StaticCredentialStoreModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<StaticCredentialStoreModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .credential_stores()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.credential_stores().delete(id).await
    }
}
