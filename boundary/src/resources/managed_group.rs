//! boundary_managed_group
//!
//! Membership of an OIDC managed group is computed by Boundary from the
//! filter; `member_ids` only reports it.

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::managed_groups::{
    CreateManagedGroupRequest, ManagedGroup, ManagedGroupAttributes, OidcManagedGroupAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagedGroupModel {
    pub auth_method_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub filter: String,
    pub member_ids: Vec<String>,
}

impl StateModel for ManagedGroupModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            auth_method_id: state.required_string("auth_method_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            filter: state.required_string("filter")?,
            member_ids: state.strings("member_ids")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("auth_method_id", Some(&self.auth_method_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("filter", Some(&self.filter))
            .strings("member_ids", &self.member_ids);
    }
}

impl TryFrom<ManagedGroup> for Tracked<ManagedGroupModel> {
    type Error = ApiError;

    fn try_from(group: ManagedGroup) -> Result<Self, ApiError> {
        let ManagedGroupAttributes::Oidc(attrs) = group.variant()? else {
            return Err(ApiError::ParseError(format!(
                "managed group {} is of type \"{}\", not oidc",
                group.meta.id, group.kind
            )));
        };
        Ok(Tracked {
            model: ManagedGroupModel {
                auth_method_id: group.auth_method_id,
                name: group.meta.name.clone(),
                description: group.meta.description.clone(),
                filter: attrs.filter,
                member_ids: group.member_ids,
            },
            meta: group.meta,
        })
    }
}

#[derive(Default)]
pub struct ManagedGroupResource;

#[async_trait]
impl BoundaryResource for ManagedGroupResource {
    type Model = ManagedGroupModel;

    const TYPE_NAME: &'static str = "boundary_managed_group";
    const DESCRIPTION: &'static str = "An OIDC managed group whose members match a claims filter";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "auth_method_id",
                "The OIDC auth method the group belongs to",
                BoundaryIdValidator::new(&["amoidc"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("filter", AttributeType::String)
                .description("Boolean expression over the token and userinfo claims")
                .required()
                .build(),
            AttributeBuilder::new("member_ids", AttributeType::Set(Box::new(AttributeType::String)))
                .description("Accounts currently matching the filter")
                .computed()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &ManagedGroupModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<ManagedGroupModel>, ApiError> {
        let request = CreateManagedGroupRequest {
            auth_method_id: plan.auth_method_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: ManagedGroupAttributes::Oidc(OidcManagedGroupAttributes {
                filter: plan.filter.clone(),
            }),
        };
        client.managed_groups().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<ManagedGroupModel>, ApiError> {
        client.managed_groups().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<ManagedGroupModel>,
        plan: &ManagedGroupModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<ManagedGroupModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description)
            .attribute_optional("filter", &Some(&prior.model.filter), &Some(&plan.filter));
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .managed_groups()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.managed_groups().delete(id).await
    }
}
