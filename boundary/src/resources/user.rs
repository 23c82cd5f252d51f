//! boundary_user

use async_trait::async_trait;
use tfplug::schema::Attribute;

use super::{
    description_attribute, name_attribute, parent_attribute, set_changed, string_set,
    BoundaryResource, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::users::{CreateUserRequest, SetAccountsRequest, User};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

pub(crate) const ACCOUNT_PREFIXES: &[&str] = &["acctpw", "acctoidc", "acctldap"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub account_ids: Vec<String>,
}

impl StateModel for UserModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            account_ids: state.strings("account_ids")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .strings("account_ids", &self.account_ids);
    }
}

impl From<User> for Tracked<UserModel> {
    fn from(user: User) -> Self {
        Tracked {
            model: UserModel {
                scope_id: user.meta.scope_id.clone().unwrap_or_default(),
                name: user.meta.name.clone(),
                description: user.meta.description.clone(),
                account_ids: user.account_ids,
            },
            meta: user.meta,
        }
    }
}

#[derive(Default)]
pub struct UserResource;

impl UserResource {
    async fn set_accounts(
        client: &Client,
        id: &str,
        version: u32,
        account_ids: &[String],
    ) -> Result<User, ApiError> {
        let request = SetAccountsRequest {
            version,
            account_ids: account_ids.to_vec(),
        };
        client.users().action(id, "set-accounts", &request).await
    }
}

#[async_trait]
impl BoundaryResource for UserResource {
    type Model = UserModel;

    const TYPE_NAME: &'static str = "boundary_user";
    const DESCRIPTION: &'static str = "A user, optionally linked to auth method accounts";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "scope_id",
                "The global or org scope the user belongs to",
                BoundaryIdValidator::new(&["o"]).or_literal("global"),
            ),
            name_attribute(),
            description_attribute(),
            string_set("account_ids", "Accounts linked to the user")
                .validator(BoundaryIdValidator::create(ACCOUNT_PREFIXES))
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &UserModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<UserModel>, ApiError> {
        let request = CreateUserRequest {
            scope_id: plan.scope_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
        };
        let user = client.users().create(&request).await?;
        if plan.account_ids.is_empty() {
            return Ok(user.into());
        }
        let user = Self::set_accounts(client, &user.meta.id, user.meta.version, &plan.account_ids)
            .await?;
        Ok(user.into())
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<UserModel>, ApiError> {
        Ok(client.users().read(id).await?.into())
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<UserModel>,
        plan: &UserModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<UserModel>, ApiError> {
        let id = &prior.meta.id;
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);

        let mut version = prior.meta.version;
        let mut latest = None;
        if body.has_changes() {
            let user = client.users().update(id, &body.into_value()).await?;
            version = user.meta.version;
            latest = Some(user);
        }

        if set_changed(&prior.model.account_ids, &plan.account_ids) {
            latest = Some(Self::set_accounts(client, id, version, &plan.account_ids).await?);
        }

        match latest {
            Some(user) => Ok(user.into()),
            None => self.read(client, id).await,
        }
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.users().delete(id).await
    }
}
