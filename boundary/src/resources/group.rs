//! boundary_group

use async_trait::async_trait;
use tfplug::schema::Attribute;

use super::{
    description_attribute, name_attribute, parent_attribute, set_changed, string_set,
    BoundaryResource, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::groups::{CreateGroupRequest, Group, SetMembersRequest};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub member_ids: Vec<String>,
}

impl StateModel for GroupModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            member_ids: state.strings("member_ids")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .strings("member_ids", &self.member_ids);
    }
}

impl From<Group> for Tracked<GroupModel> {
    fn from(group: Group) -> Self {
        Tracked {
            model: GroupModel {
                scope_id: group.meta.scope_id.clone().unwrap_or_default(),
                name: group.meta.name.clone(),
                description: group.meta.description.clone(),
                member_ids: group.member_ids,
            },
            meta: group.meta,
        }
    }
}

#[derive(Default)]
pub struct GroupResource;

#[async_trait]
impl BoundaryResource for GroupResource {
    type Model = GroupModel;

    const TYPE_NAME: &'static str = "boundary_group";
    const DESCRIPTION: &'static str = "A group of users in a global, org or project scope";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "scope_id",
                "The scope the group belongs to",
                BoundaryIdValidator::new(&["o", "p"]).or_literal("global"),
            ),
            name_attribute(),
            description_attribute(),
            string_set("member_ids", "User IDs of the group's members")
                .validator(BoundaryIdValidator::create(&["u"]))
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &GroupModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<GroupModel>, ApiError> {
        let mut group = client
            .groups()
            .create(&CreateGroupRequest {
                scope_id: plan.scope_id.clone(),
                name: plan.name.clone(),
                description: plan.description.clone(),
            })
            .await?;

        if !plan.member_ids.is_empty() {
            group = set_members(client, &group.meta.id, group.meta.version, &plan.member_ids).await?;
        }
        Ok(group.into())
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<GroupModel>, ApiError> {
        Ok(client.groups().read(id).await?.into())
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<GroupModel>,
        plan: &GroupModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<GroupModel>, ApiError> {
        let id = &prior.meta.id;
        let mut version = prior.meta.version;
        let mut latest = None;

        let mut body = UpdateBody::new(version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
        if body.has_changes() {
            let group = client.groups().update(id, &body.into_value()).await?;
            version = group.meta.version;
            latest = Some(group);
        }

        if set_changed(&prior.model.member_ids, &plan.member_ids) {
            latest = Some(set_members(client, id, version, &plan.member_ids).await?);
        }

        match latest {
            Some(group) => Ok(group.into()),
            None => self.read(client, id).await,
        }
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.groups().delete(id).await
    }
}

async fn set_members(
    client: &Client,
    id: &str,
    version: u32,
    member_ids: &[String],
) -> Result<Group, ApiError> {
    client
        .groups()
        .action(
            id,
            "set-members",
            &SetMembersRequest {
                version,
                member_ids: member_ids.to_vec(),
            },
        )
        .await
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::ItemMeta;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn prior(member_ids: &[&str]) -> Tracked<GroupModel> {
        Tracked {
            meta: ItemMeta {
                id: "g_1234567890".to_string(),
                version: 2,
                ..Default::default()
            },
            model: GroupModel {
                scope_id: "global".to_string(),
                name: Some("ops".to_string()),
                description: None,
                member_ids: member_ids.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    #[tokio::test]
    async fn update_chains_versions_across_calls() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", "/v1/groups/g_1234567890")
            .match_body(Matcher::Json(json!({"version": 2, "name": "platform"})))
            .with_body(r#"{"id":"g_1234567890","scope_id":"global","name":"platform","version":3}"#)
            .create_async()
            .await;
        let members = server
            .mock("POST", "/v1/groups/g_1234567890:set-members")
            .match_body(Matcher::Json(json!({"version": 3, "member_ids": ["u_1234567890"]})))
            .with_body(
                r#"{"id":"g_1234567890","scope_id":"global","name":"platform","version":4,"member_ids":["u_1234567890"]}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let plan = GroupModel {
            name: Some("platform".to_string()),
            member_ids: vec!["u_1234567890".to_string()],
            ..prior(&[]).model
        };
        let updated = GroupResource
            .update(&client, &prior(&[]), &plan, &Secrets::default())
            .await
            .unwrap();

        patch.assert_async().await;
        members.assert_async().await;
        assert_eq!(updated.meta.version, 4);
        assert_eq!(updated.model, plan);
    }

    #[tokio::test]
    async fn clearing_description_sends_null() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", "/v1/groups/g_1234567890")
            .match_body(Matcher::Json(json!({"version": 2, "description": null})))
            .with_body(r#"{"id":"g_1234567890","scope_id":"global","name":"ops","version":3}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let mut prior = prior(&[]);
        prior.model.description = Some("old".to_string());
        let plan = GroupModel {
            description: None,
            ..prior.model.clone()
        };
        GroupResource
            .update(&client, &prior, &plan, &Secrets::default())
            .await
            .unwrap();
        patch.assert_async().await;
    }
}
