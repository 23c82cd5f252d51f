//! boundary_host_static

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::hosts::{CreateHostRequest, Host, StaticHostAttributes};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostModel {
    pub host_catalog_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: String,
}

impl StateModel for HostModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            host_catalog_id: state.required_string("host_catalog_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            address: state.required_string("address")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("host_catalog_id", Some(&self.host_catalog_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("address", Some(&self.address));
    }
}

impl From<Host> for Tracked<HostModel> {
    fn from(host: Host) -> Self {
        Tracked {
            model: HostModel {
                host_catalog_id: host.host_catalog_id,
                name: host.meta.name.clone(),
                description: host.meta.description.clone(),
                address: host.attributes.address.unwrap_or_default(),
            },
            meta: host.meta,
        }
    }
}

#[derive(Default)]
pub struct HostStaticResource;

#[async_trait]
impl BoundaryResource for HostStaticResource {
    type Model = HostModel;

    const TYPE_NAME: &'static str = "boundary_host_static";
    const DESCRIPTION: &'static str = "A host in a static host catalog";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "host_catalog_id",
                "The static host catalog the host belongs to",
                BoundaryIdValidator::new(&["hcst"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("address", AttributeType::String)
                .description("IP address or DNS name of the host")
                .required()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &HostModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<HostModel>, ApiError> {
        let request = CreateHostRequest {
            host_catalog_id: plan.host_catalog_id.clone(),
            kind: "static",
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: StaticHostAttributes {
                address: Some(plan.address.clone()),
            },
        };
        Ok(client.hosts().create(&request).await?.into())
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<HostModel>, ApiError> {
        Ok(client.hosts().read(id).await?.into())
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<HostModel>,
        plan: &HostModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<HostModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description)
            .attribute_optional(
                "address",
                &Some(&prior.model.address),
                &Some(&plan.address),
            );
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        Ok(client
            .hosts()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .into())
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.hosts().delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::ItemMeta;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn address_change_is_nested_under_attributes() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", "/v1/hosts/hst_1234567890")
            .match_body(Matcher::Json(json!({
                "version": 1,
                "attributes": {"address": "10.0.0.2"}
            })))
            .with_body(
                r#"{"id":"hst_1234567890","host_catalog_id":"hcst_1234567890","type":"static","version":2,"attributes":{"address":"10.0.0.2"}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let prior = Tracked {
            meta: ItemMeta {
                id: "hst_1234567890".to_string(),
                version: 1,
                ..Default::default()
            },
            model: HostModel {
                host_catalog_id: "hcst_1234567890".to_string(),
                address: "10.0.0.1".to_string(),
                ..Default::default()
            },
        };
        let plan = HostModel {
            address: "10.0.0.2".to_string(),
            ..prior.model.clone()
        };

        let host = HostStaticResource
            .update(&client, &prior, &plan, &Secrets::default())
            .await
            .unwrap();
        patch.assert_async().await;
        assert_eq!(host.model, plan);
    }
}
