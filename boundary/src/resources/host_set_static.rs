//! boundary_host_set_static

use async_trait::async_trait;
use tfplug::schema::Attribute;

use super::{
    description_attribute, name_attribute, parent_attribute, set_changed, string_set,
    BoundaryResource, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::host_sets::{CreateHostSetRequest, HostSet, SetHostsRequest};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostSetModel {
    pub host_catalog_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub host_ids: Vec<String>,
}

impl StateModel for HostSetModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            host_catalog_id: state.required_string("host_catalog_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            host_ids: state.strings("host_ids")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("host_catalog_id", Some(&self.host_catalog_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .strings("host_ids", &self.host_ids);
    }
}

impl From<HostSet> for Tracked<HostSetModel> {
    fn from(set: HostSet) -> Self {
        Tracked {
            model: HostSetModel {
                host_catalog_id: set.host_catalog_id,
                name: set.meta.name.clone(),
                description: set.meta.description.clone(),
                host_ids: set.host_ids,
            },
            meta: set.meta,
        }
    }
}

async fn set_hosts(
    client: &Client,
    id: &str,
    version: u32,
    host_ids: &[String],
) -> Result<HostSet, ApiError> {
    let request = SetHostsRequest {
        version,
        host_ids: host_ids.to_vec(),
    };
    client.host_sets().action(id, "set-hosts", &request).await
}

#[derive(Default)]
pub struct HostSetStaticResource;

#[async_trait]
impl BoundaryResource for HostSetStaticResource {
    type Model = HostSetModel;

    const TYPE_NAME: &'static str = "boundary_host_set_static";
    const DESCRIPTION: &'static str = "A set of hosts from a static host catalog";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "host_catalog_id",
                "The static host catalog the set belongs to",
                BoundaryIdValidator::new(&["hcst"]),
            ),
            name_attribute(),
            description_attribute(),
            string_set("host_ids", "Hosts in the set")
                .validator(BoundaryIdValidator::create(&["hst"]))
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &HostSetModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<HostSetModel>, ApiError> {
        let request = CreateHostSetRequest {
            host_catalog_id: plan.host_catalog_id.clone(),
            kind: "static",
            name: plan.name.clone(),
            description: plan.description.clone(),
        };
        let mut set = client.host_sets().create(&request).await?;
        if !plan.host_ids.is_empty() {
            set = set_hosts(client, &set.meta.id, set.meta.version, &plan.host_ids).await?;
        }
        Ok(set.into())
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<HostSetModel>, ApiError> {
        Ok(client.host_sets().read(id).await?.into())
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<HostSetModel>,
        plan: &HostSetModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<HostSetModel>, ApiError> {
        let id = &prior.meta.id;
        let mut version = prior.meta.version;
        let mut latest = None;

        let mut body = UpdateBody::new(version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
        if body.has_changes() {
            let set = client.host_sets().update(id, &body.into_value()).await?;
            version = set.meta.version;
            latest = Some(set);
        }
        if set_changed(&prior.model.host_ids, &plan.host_ids) {
            latest = Some(set_hosts(client, id, version, &plan.host_ids).await?);
        }

        match latest {
            Some(set) => Ok(set.into()),
            None => self.read(client, id).await,
        }
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.host_sets().delete(id).await
    }
}
