//! boundary_role

use async_trait::async_trait;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::schema::Attribute;

use super::{
    description_attribute, name_attribute, parent_attribute, set_changed, string_set,
    BoundaryResource, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::roles::{
    CreateRoleRequest, Role, SetGrantScopesRequest, SetGrantsRequest, SetPrincipalsRequest,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub grant_scope_ids: Vec<String>,
    pub principal_ids: Vec<String>,
    pub grant_strings: Vec<String>,
}

impl StateModel for RoleModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            grant_scope_ids: state.strings("grant_scope_ids")?,
            principal_ids: state.strings("principal_ids")?,
            grant_strings: state.strings("grant_strings")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .strings("grant_scope_ids", &self.grant_scope_ids)
            .strings("principal_ids", &self.principal_ids)
            .strings("grant_strings", &self.grant_strings);
    }
}

impl From<Role> for Tracked<RoleModel> {
    fn from(role: Role) -> Self {
        Tracked {
            model: RoleModel {
                scope_id: role.meta.scope_id.clone().unwrap_or_default(),
                name: role.meta.name.clone(),
                description: role.meta.description.clone(),
                grant_scope_ids: role.grant_scope_ids,
                principal_ids: role.principal_ids,
                grant_strings: role.grant_strings,
            },
            meta: role.meta,
        }
    }
}

/// Which of the role's collections a `:set-*` call replaces
enum RoleSet<'a> {
    GrantScopes(&'a [String]),
    Principals(&'a [String]),
    Grants(&'a [String]),
}

impl RoleSet<'_> {
    fn values(&self) -> &[String] {
        match self {
            RoleSet::GrantScopes(values) | RoleSet::Principals(values) | RoleSet::Grants(values) => {
                values
            }
        }
    }
}

async fn apply_set(client: &Client, id: &str, version: u32, set: RoleSet<'_>) -> Result<Role, ApiError> {
    let roles = client.roles();
    match set {
        RoleSet::GrantScopes(ids) => {
            let request = SetGrantScopesRequest {
                version,
                grant_scope_ids: ids.to_vec(),
            };
            roles.action(id, "set-grant-scopes", &request).await
        }
        RoleSet::Principals(ids) => {
            let request = SetPrincipalsRequest {
                version,
                principal_ids: ids.to_vec(),
            };
            roles.action(id, "set-principals", &request).await
        }
        RoleSet::Grants(grants) => {
            let request = SetGrantsRequest {
                version,
                grant_strings: grants.to_vec(),
            };
            roles.action(id, "set-grants", &request).await
        }
    }
}

#[derive(Default)]
pub struct RoleResource;

#[async_trait]
impl BoundaryResource for RoleResource {
    type Model = RoleModel;

    const TYPE_NAME: &'static str = "boundary_role";
    const DESCRIPTION: &'static str =
        "A role granting permissions to principals within one or more scopes";

    fn attributes(&self) -> Vec<Attribute> {
        let scope_ids = BoundaryIdValidator::new(&["o", "p"]).or_literal("global");
        vec![
            parent_attribute("scope_id", "The scope the role is defined in", scope_ids),
            name_attribute(),
            description_attribute(),
            string_set(
                "grant_scope_ids",
                "Scopes the grants apply to; `this`, `children` and `descendants` are accepted. Defaults to the server's choice.",
            )
            .computed()
            .validator(
                BoundaryIdValidator::new(&["o", "p"])
                    .or_literal("global")
                    .or_literal("this")
                    .or_literal("children")
                    .or_literal("descendants")
                    .boxed(),
            )
            .plan_modifier(UseStateForUnknown::create())
            .build(),
            string_set("principal_ids", "Users, groups and managed groups granted the role")
                .validator(BoundaryIdValidator::create(&["u", "g", "mgoidc", "mgldap"]))
                .build(),
            string_set("grant_strings", "Grants, e.g. `ids=*;type=*;actions=read`").build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &RoleModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<RoleModel>, ApiError> {
        let mut role = client
            .roles()
            .create(&CreateRoleRequest {
                scope_id: plan.scope_id.clone(),
                name: plan.name.clone(),
                description: plan.description.clone(),
            })
            .await?;
        let id = role.meta.id.clone();

        for set in [
            RoleSet::GrantScopes(&plan.grant_scope_ids),
            RoleSet::Principals(&plan.principal_ids),
            RoleSet::Grants(&plan.grant_strings),
        ] {
            if !set.values().is_empty() {
                role = apply_set(client, &id, role.meta.version, set).await?;
            }
        }
        Ok(role.into())
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<RoleModel>, ApiError> {
        Ok(client.roles().read(id).await?.into())
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<RoleModel>,
        plan: &RoleModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<RoleModel>, ApiError> {
        let id = &prior.meta.id;
        let mut version = prior.meta.version;
        let mut latest: Option<Role> = None;

        let mut body = UpdateBody::new(version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
        if body.has_changes() {
            let role = client.roles().update(id, &body.into_value()).await?;
            version = role.meta.version;
            latest = Some(role);
        }

        // Unset grant scopes are computed; keep whatever the server chose
        let grant_scopes_changed = !plan.grant_scope_ids.is_empty()
            && set_changed(&prior.model.grant_scope_ids, &plan.grant_scope_ids);
        let changes = [
            (grant_scopes_changed, RoleSet::GrantScopes(&plan.grant_scope_ids)),
            (
                set_changed(&prior.model.principal_ids, &plan.principal_ids),
                RoleSet::Principals(&plan.principal_ids),
            ),
            (
                set_changed(&prior.model.grant_strings, &plan.grant_strings),
                RoleSet::Grants(&plan.grant_strings),
            ),
        ];
        for (changed, set) in changes {
            if changed {
                let role = apply_set(client, id, version, set).await?;
                version = role.meta.version;
                latest = Some(role);
            }
        }

        match latest {
            Some(role) => Ok(role.into()),
            None => self.read(client, id).await,
        }
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.roles().delete(id).await
    }
}
