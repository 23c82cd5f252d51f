//! boundary_scope
//!
//! Orgs live in the global scope and projects in an org. The global scope
//! itself always exists: with `global_scope = true` the resource adopts it
//! instead of creating it, and destroying the resource leaves it in place.

use async_trait::async_trait;
use tfplug::plan_modifier::RequiresReplace;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tracing::info;

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::scopes::{CreateScopeRequest, Scope};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

pub const GLOBAL_SCOPE_ID: &str = "global";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub global_scope: Option<bool>,
    pub auto_create_admin_role: Option<bool>,
    pub auto_create_default_role: Option<bool>,
}

impl ScopeModel {
    fn is_global(&self) -> bool {
        self.global_scope == Some(true)
    }
}

impl StateModel for ScopeModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            global_scope: state.bool("global_scope")?,
            auto_create_admin_role: state.bool("auto_create_admin_role")?,
            auto_create_default_role: state.bool("auto_create_default_role")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .bool("global_scope", self.global_scope)
            .bool("auto_create_admin_role", self.auto_create_admin_role)
            .bool("auto_create_default_role", self.auto_create_default_role);
    }
}

impl From<Scope> for Tracked<ScopeModel> {
    fn from(scope: Scope) -> Self {
        let global = scope.kind == GLOBAL_SCOPE_ID || scope.meta.id == GLOBAL_SCOPE_ID;
        Tracked {
            model: ScopeModel {
                scope_id: scope
                    .meta
                    .scope_id
                    .clone()
                    .unwrap_or_else(|| GLOBAL_SCOPE_ID.to_string()),
                name: scope.meta.name.clone(),
                description: scope.meta.description.clone(),
                global_scope: global.then_some(true),
                auto_create_admin_role: None,
                auto_create_default_role: None,
            },
            meta: scope.meta,
        }
    }
}

/// Carry the create-time flags over from the plan; the API never echoes them
fn with_flags(mut tracked: Tracked<ScopeModel>, plan: &ScopeModel) -> Tracked<ScopeModel> {
    tracked.model.global_scope = plan.global_scope;
    tracked.model.auto_create_admin_role = plan.auto_create_admin_role;
    tracked.model.auto_create_default_role = plan.auto_create_default_role;
    tracked
}

fn flag(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Bool)
        .description(description)
        .optional()
        .plan_modifier(RequiresReplace::create())
        .build()
}

#[derive(Default)]
pub struct ScopeResource;

impl ScopeResource {
    async fn patch(
        client: &Client,
        id: &str,
        version: u32,
        prior: (&Option<String>, &Option<String>),
        plan: &ScopeModel,
    ) -> Result<Option<Scope>, ApiError> {
        let mut body = UpdateBody::new(version);
        body.optional("name", prior.0, &plan.name)
            .optional("description", prior.1, &plan.description);
        if !body.has_changes() {
            return Ok(None);
        }
        Ok(Some(client.scopes().update(id, &body.into_value()).await?))
    }
}

#[async_trait]
impl BoundaryResource for ScopeResource {
    type Model = ScopeModel;

    const TYPE_NAME: &'static str = "boundary_scope";
    const DESCRIPTION: &'static str = "An org or project scope, or the adopted global scope";
    const PRESERVED: &'static [&'static str] = &[
        "global_scope",
        "auto_create_admin_role",
        "auto_create_default_role",
    ];

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "scope_id",
                "The parent scope: `global` for orgs, an org for projects",
                BoundaryIdValidator::new(&["o"]).or_literal(GLOBAL_SCOPE_ID),
            ),
            name_attribute(),
            description_attribute(),
            flag(
                "global_scope",
                "Manage the global scope itself; requires scope_id = \"global\"",
            ),
            flag(
                "auto_create_admin_role",
                "Let Boundary create an admin role for the new scope",
            ),
            flag(
                "auto_create_default_role",
                "Let Boundary create a default role for the new scope",
            ),
        ]
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let global = config
            .get_optional_bool(&AttributePath::new("global_scope"))
            .ok()
            .flatten()
            .unwrap_or(false);
        let scope_id = config
            .get_optional_string(&AttributePath::new("scope_id"))
            .ok()
            .flatten();

        match scope_id {
            Some(scope_id) if global && scope_id != GLOBAL_SCOPE_ID => vec![Diagnostic::error(
                "Invalid scope_id for the global scope",
                format!(
                    "global_scope = true requires scope_id = \"global\", got \"{}\"",
                    scope_id
                ),
            )
            .with_attribute(AttributePath::new("scope_id"))],
            _ => vec![],
        }
    }

    async fn create(
        &self,
        client: &Client,
        plan: &ScopeModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<ScopeModel>, ApiError> {
        if plan.is_global() {
            let global = client.scopes().read(GLOBAL_SCOPE_ID).await?;
            info!("adopting the global scope");
            let remote = (global.meta.name.clone(), global.meta.description.clone());
            let scope = Self::patch(
                client,
                GLOBAL_SCOPE_ID,
                global.meta.version,
                (&remote.0, &remote.1),
                plan,
            )
            .await?
            .unwrap_or(global);
            return Ok(with_flags(scope.into(), plan));
        }

        let scope = client
            .scopes()
            .create(&CreateScopeRequest {
                scope_id: plan.scope_id.clone(),
                name: plan.name.clone(),
                description: plan.description.clone(),
                skip_admin_role_creation: plan.auto_create_admin_role != Some(true),
                skip_default_role_creation: plan.auto_create_default_role != Some(true),
            })
            .await?;
        Ok(with_flags(scope.into(), plan))
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<ScopeModel>, ApiError> {
        Ok(client.scopes().read(id).await?.into())
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<ScopeModel>,
        plan: &ScopeModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<ScopeModel>, ApiError> {
        let id = &prior.meta.id;
        let scope = Self::patch(
            client,
            id,
            prior.meta.version,
            (&prior.model.name, &prior.model.description),
            plan,
        )
        .await?;
        let tracked = match scope {
            Some(scope) => scope.into(),
            None => self.read(client, id).await?,
        };
        Ok(with_flags(tracked, plan))
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        if id == GLOBAL_SCOPE_ID {
            info!("leaving the global scope in place");
            return Ok(());
        }
        client.scopes().delete(id).await
    }
}
