//! boundary_managed_group_ldap

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::validator::ListLengthValidator;

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::managed_groups::{
    CreateManagedGroupRequest, LdapManagedGroupAttributes, ManagedGroup, ManagedGroupAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LdapManagedGroupModel {
    pub auth_method_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub group_names: Vec<String>,
    pub member_ids: Vec<String>,
}

impl StateModel for LdapManagedGroupModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            auth_method_id: state.required_string("auth_method_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            group_names: state.strings("group_names")?,
            member_ids: state.strings("member_ids")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("auth_method_id", Some(&self.auth_method_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .strings("group_names", &self.group_names)
            .strings("member_ids", &self.member_ids);
    }
}

impl TryFrom<ManagedGroup> for Tracked<LdapManagedGroupModel> {
    type Error = ApiError;

    fn try_from(group: ManagedGroup) -> Result<Self, ApiError> {
        let ManagedGroupAttributes::Ldap(attrs) = group.variant()? else {
            return Err(ApiError::ParseError(format!(
                "managed group {} is of type \"{}\", not ldap",
                group.meta.id, group.kind
            )));
        };
        Ok(Tracked {
            model: LdapManagedGroupModel {
                auth_method_id: group.auth_method_id,
                name: group.meta.name.clone(),
                description: group.meta.description.clone(),
                group_names: attrs.group_names,
                member_ids: group.member_ids,
            },
            meta: group.meta,
        })
    }
}

#[derive(Default)]
pub struct ManagedGroupLdapResource;

#[async_trait]
impl BoundaryResource for ManagedGroupLdapResource {
    type Model = LdapManagedGroupModel;

    const TYPE_NAME: &'static str = "boundary_managed_group_ldap";
    const DESCRIPTION: &'static str = "An LDAP managed group mapping directory groups to Boundary";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "auth_method_id",
                "The LDAP auth method the group belongs to",
                BoundaryIdValidator::new(&["amldap"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("group_names", AttributeType::List(Box::new(AttributeType::String)))
                .description("Directory groups whose members belong to this group")
                .required()
                .validator(ListLengthValidator::create(Some(1), None))
                .build(),
            AttributeBuilder::new("member_ids", AttributeType::Set(Box::new(AttributeType::String)))
                .description("Accounts currently in one of the groups")
                .computed()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &LdapManagedGroupModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<LdapManagedGroupModel>, ApiError> {
        let request = CreateManagedGroupRequest {
            auth_method_id: plan.auth_method_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: ManagedGroupAttributes::Ldap(LdapManagedGroupAttributes {
                group_names: plan.group_names.clone(),
            }),
        };
        client.managed_groups().create(&request).await?.try_into()
    }

    async fn read(
        &self,
        client: &Client,
        id: &str,
    ) -> Result<Tracked<LdapManagedGroupModel>, ApiError> {
        client.managed_groups().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<LdapManagedGroupModel>,
        plan: &LdapManagedGroupModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<LdapManagedGroupModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
        if prior.model.group_names != plan.group_names {
            body.set_attribute("group_names", &plan.group_names);
        }
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
