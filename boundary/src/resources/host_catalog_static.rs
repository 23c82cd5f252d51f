//! boundary_host_catalog_static

use async_trait::async_trait;
use tfplug::schema::Attribute;

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::host_catalogs::{CreateHostCatalogRequest, HostCatalog};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostCatalogModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl StateModel for HostCatalogModel {
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

impl TryFrom<HostCatalog> for Tracked<HostCatalogModel> {
    type Error = ApiError;

    fn try_from(catalog: HostCatalog) -> Result<Self, ApiError> {
        if catalog.kind != "static" {
            return Err(ApiError::ParseError(format!(
                "host catalog {} is of type \"{}\", not static",
                catalog.meta.id, catalog.kind
            )));
        }
        Ok(Tracked {
            model: HostCatalogModel {
                scope_id: catalog.meta.scope_id.clone().unwrap_or_default(),
                name: catalog.meta.name.clone(),
                description: catalog.meta.description.clone(),
            },
            meta: catalog.meta,
        })
    }
}

#[derive(Default)]
pub struct HostCatalogStaticResource;

#[async_trait]
impl BoundaryResource for HostCatalogStaticResource {
    type Model = HostCatalogModel;

    const TYPE_NAME: &'static str = "boundary_host_catalog_static";
    const DESCRIPTION: &'static str = "A catalog of statically defined hosts in a project";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "scope_id",
                "The project the catalog belongs to",
                BoundaryIdValidator::new(&["p"]),
            ),
            name_attribute(),
            description_attribute(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &HostCatalogModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<HostCatalogModel>, ApiError> {
        let request = CreateHostCatalogRequest {
            scope_id: plan.scope_id.clone(),
            kind: "static",
            name: plan.name.clone(),
            description: plan.description.clone(),
        };
        client.host_catalogs().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<HostCatalogModel>, ApiError> {
        client.host_catalogs().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<HostCatalogModel>,
        plan: &HostCatalogModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<HostCatalogModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .host_catalogs()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.host_catalogs().delete(id).await
    }
}
