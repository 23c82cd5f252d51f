//! In-process lifecycle driver
//!
//! `ProviderHost` plays Terraform's role for a single provider: it configures
//! the provider, validates and plans resource changes, applies them, refreshes
//! and imports state, and reads data sources. State is kept msgpack-encoded
//! between steps so every transition goes through the same encoding Terraform
//! uses on the wire.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::plan::{self, PlanAction};
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderSchemaRequest,
    ResourceFactory, ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ModifyPlanRequest, ReadResourceRequest, ResourceSchemaRequest,
    ResourceWithConfigure, UpdateResourceRequest, ValidateResourceConfigRequest,
};
use crate::schema::Schema;
use crate::types::{has_errors, AttributePath, Diagnostic, DynamicValue};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Reported to providers as the Terraform version driving them
const HOST_TERRAFORM_VERSION: &str = "1.9.0";

/// Failure of a lifecycle step; carries every diagnostic produced so far
#[derive(Debug, thiserror::Error)]
#[error("{}", summarize(.diagnostics))]
pub struct HostError {
    pub diagnostics: Vec<Diagnostic>,
}

impl HostError {
    fn single(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            diagnostics: vec![Diagnostic::error(summary, detail)],
        }
    }

    /// True when any error diagnostic points at `path`
    pub fn has_attribute_error(&self, path: &AttributePath) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.is_error() && d.attribute.as_ref() == Some(path))
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn check(diagnostics: Vec<Diagnostic>) -> Result<Vec<Diagnostic>, HostError> {
    if has_errors(&diagnostics) {
        Err(HostError { diagnostics })
    } else {
        Ok(diagnostics)
    }
}

/// Resource state as persisted between lifecycle steps
#[derive(Clone, PartialEq)]
pub struct StoredState {
    pub type_name: String,
    pub schema_version: i64,
    data: Vec<u8>,
}

impl StoredState {
    fn encode(
        type_name: &str,
        schema_version: i64,
        state: &DynamicValue,
    ) -> Result<Self, HostError> {
        let data = state
            .encode_msgpack()
            .map_err(|e| HostError::single("Failed to encode state", e.to_string()))?;
        Ok(Self {
            type_name: type_name.to_string(),
            schema_version,
            data,
        })
    }

    pub fn value(&self) -> Result<DynamicValue, HostError> {
        DynamicValue::decode_msgpack(&self.data)
            .map_err(|e| HostError::single("Failed to decode state", e.to_string()))
    }

    /// Convenience accessor for the `id` attribute
    pub fn id(&self) -> Option<String> {
        self.value()
            .ok()
            .and_then(|v| v.get_optional_string(&AttributePath::new("id")).ok().flatten())
    }
}

impl fmt::Debug for StoredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredState")
            .field("type_name", &self.type_name)
            .field("schema_version", &self.schema_version)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A plan ready to be applied
#[derive(Debug)]
pub struct ResourcePlan {
    pub type_name: String,
    pub action: PlanAction,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    /// Warnings raised while planning
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ProviderHost<P: Provider> {
    provider: P,
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    resources: HashMap<String, ResourceFactory>,
    data_sources: HashMap<String, DataSourceFactory>,
}

impl<P: Provider> ProviderHost<P> {
    pub fn new(provider: P) -> Self {
        let resources = provider.resources();
        let data_sources = provider.data_sources();
        Self {
            provider,
            provider_data: None,
            resources,
            data_sources,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn resource_types(&self) -> Vec<String> {
        let mut names: Vec<_> = self.resources.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn data_source_types(&self) -> Vec<String> {
        let mut names: Vec<_> = self.data_sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Validate and apply the provider block
    pub async fn configure(
        &mut self,
        ctx: Context,
        config: DynamicValue,
    ) -> Result<Vec<Diagnostic>, HostError> {
        let schema = self
            .provider
            .schema(ctx.clone(), ProviderSchemaRequest)
            .await;
        let mut diagnostics = schema.diagnostics;
        diagnostics.extend(plan::validate_config(&schema.schema, &config));
        diagnostics.extend(
            self.provider
                .validate(
                    ctx.clone(),
                    ValidateProviderConfigRequest {
                        config: config.clone(),
                    },
                )
                .await
                .diagnostics,
        );
        let mut diagnostics = check(diagnostics)?;

        let response = self
            .provider
            .configure(
                ctx,
                ConfigureProviderRequest {
                    terraform_version: HOST_TERRAFORM_VERSION.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);
        let diagnostics = check(diagnostics)?;

        self.provider_data = response.provider_data;
        info!(provider = self.provider.type_name(), "provider configured");
        Ok(diagnostics)
    }

    async fn resource(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, HostError> {
        let factory = self.resources.get(type_name).ok_or_else(|| {
            HostError::single(
                "Unknown resource type",
                format!("The provider does not support resource type \"{}\"", type_name),
            )
        })?;

        let mut resource = factory();
        let response = resource
            .configure(
                ctx.clone(),
                ConfigureResourceRequest {
                    provider_data: self.provider_data.clone(),
                },
            )
            .await;
        check(response.diagnostics)?;
        Ok(resource)
    }

    async fn data_source(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, HostError> {
        let factory = self.data_sources.get(type_name).ok_or_else(|| {
            HostError::single(
                "Unknown data source type",
                format!(
                    "The provider does not support data source type \"{}\"",
                    type_name
                ),
            )
        })?;

        let mut data_source = factory();
        let response = data_source
            .configure(
                ctx.clone(),
                ConfigureDataSourceRequest {
                    provider_data: self.provider_data.clone(),
                },
            )
            .await;
        check(response.diagnostics)?;
        Ok(data_source)
    }

    async fn resource_schema(
        ctx: &Context,
        resource: &dyn ResourceWithConfigure,
    ) -> Result<Schema, HostError> {
        let response = resource.schema(ctx.clone(), ResourceSchemaRequest).await;
        check(response.diagnostics)?;
        Ok(response.schema)
    }

    /// Schema validation followed by the resource's own cross-field checks
    pub async fn validate_resource_config(
        &self,
        ctx: Context,
        type_name: &str,
        config: &DynamicValue,
    ) -> Result<Vec<Diagnostic>, HostError> {
        let resource = self.resource(&ctx, type_name).await?;
        let schema = Self::resource_schema(&ctx, resource.as_ref()).await?;

        let mut diagnostics = plan::validate_config(&schema, config);
        diagnostics.extend(
            resource
                .validate(
                    ctx,
                    ValidateResourceConfigRequest {
                        type_name: type_name.to_string(),
                        config: config.clone(),
                    },
                )
                .await
                .diagnostics,
        );
        check(diagnostics)
    }

    /// Plan a resource against its prior state; `None` plans a create
    pub async fn plan(
        &self,
        ctx: Context,
        type_name: &str,
        prior: Option<&StoredState>,
        config: DynamicValue,
    ) -> Result<ResourcePlan, HostError> {
        let mut diagnostics = self
            .validate_resource_config(ctx.clone(), type_name, &config)
            .await?;

        let resource = self.resource(&ctx, type_name).await?;
        let schema = Self::resource_schema(&ctx, resource.as_ref()).await?;
        let prior_state = match prior {
            Some(stored) => stored.value()?,
            None => DynamicValue::null(),
        };

        let mut change = self
            .plan_once(&ctx, resource.as_ref(), &schema, &prior_state, &config)
            .await?;
        let action = plan::classify(
            &prior_state,
            &change.planned_state,
            &change.requires_replace,
        );

        // A replacement is planned like a fresh create
        if action == PlanAction::Replace {
            let requires_replace = change.requires_replace;
            let fresh = self
                .plan_once(&ctx, resource.as_ref(), &schema, &DynamicValue::null(), &config)
                .await?;
            change = plan::PlannedChange {
                planned_state: fresh.planned_state,
                requires_replace,
                diagnostics: [change.diagnostics, fresh.diagnostics].concat(),
            };
        }

        diagnostics.extend(change.diagnostics);
        debug!(resource = type_name, ?action, "planned resource change");

        Ok(ResourcePlan {
            type_name: type_name.to_string(),
            action,
            planned_state: change.planned_state,
            config,
            requires_replace: change.requires_replace,
            diagnostics,
        })
    }

    async fn plan_once(
        &self,
        ctx: &Context,
        resource: &dyn ResourceWithConfigure,
        schema: &Schema,
        prior_state: &DynamicValue,
        config: &DynamicValue,
    ) -> Result<plan::PlannedChange, HostError> {
        let mut normalized_config = config.clone();
        plan::normalize(schema, &mut normalized_config);

        let proposed = plan::propose_new_state(schema, prior_state, &normalized_config);
        let modified = resource
            .modify_plan(
                ctx.clone(),
                ModifyPlanRequest {
                    type_name: resource.type_name().to_string(),
                    config: normalized_config.clone(),
                    prior_state: prior_state.clone(),
                    proposed_new_state: proposed,
                },
            )
            .await;
        check(modified.diagnostics.clone())?;

        let mut change = plan::plan_resource_change(
            schema,
            prior_state,
            &normalized_config,
            modified.planned_state,
        );
        if !prior_state.is_null() {
            for path in modified.requires_replace {
                if !change.requires_replace.contains(&path) {
                    change.requires_replace.push(path);
                }
            }
        }
        change.diagnostics.extend(modified.diagnostics);
        let diagnostics = check(change.diagnostics)?;
        change.diagnostics = diagnostics;
        Ok(change)
    }

    /// Apply a plan. Returns the new state; `None` never occurs for a
    /// successful apply but keeps the signature symmetric with refresh.
    pub async fn apply(
        &self,
        ctx: Context,
        plan: &ResourcePlan,
        prior: Option<&StoredState>,
    ) -> Result<Option<StoredState>, HostError> {
        let resource = self.resource(&ctx, &plan.type_name).await?;
        let schema = Self::resource_schema(&ctx, resource.as_ref()).await?;

        let mut new_state = match plan.action {
            PlanAction::NoOp => return Ok(prior.cloned()),
            PlanAction::Create => self.create(&ctx, resource.as_ref(), plan).await?,
            PlanAction::Replace => {
                if let Some(prior) = prior {
                    self.delete(&ctx, resource.as_ref(), prior).await?;
                }
                self.create(&ctx, resource.as_ref(), plan).await?
            }
            PlanAction::Update => {
                let prior_state = prior
                    .ok_or_else(|| {
                        HostError::single("Missing prior state", "An update requires prior state")
                    })?
                    .value()?;
                let response = resource
                    .update(
                        ctx.clone(),
                        UpdateResourceRequest {
                            type_name: plan.type_name.clone(),
                            prior_state,
                            planned_state: plan.planned_state.clone(),
                            config: plan.config.clone(),
                        },
                    )
                    .await;
                check(response.diagnostics)?;
                response.new_state
            }
        };

        plan::normalize(&schema, &mut new_state);
        check(plan::check_applied_state(
            &schema,
            &plan.planned_state,
            &new_state,
        ))?;

        info!(resource = %plan.type_name, action = ?plan.action, "applied resource change");
        StoredState::encode(&plan.type_name, schema.version, &new_state).map(Some)
    }

    async fn create(
        &self,
        ctx: &Context,
        resource: &dyn ResourceWithConfigure,
        plan: &ResourcePlan,
    ) -> Result<DynamicValue, HostError> {
        let response = resource
            .create(
                ctx.clone(),
                CreateResourceRequest {
                    type_name: plan.type_name.clone(),
                    planned_state: plan.planned_state.clone(),
                    config: plan.config.clone(),
                },
            )
            .await;
        check(response.diagnostics)?;
        Ok(response.new_state)
    }

    async fn delete(
        &self,
        ctx: &Context,
        resource: &dyn ResourceWithConfigure,
        prior: &StoredState,
    ) -> Result<(), HostError> {
        let response = resource
            .delete(
                ctx.clone(),
                DeleteResourceRequest {
                    type_name: prior.type_name.clone(),
                    prior_state: prior.value()?,
                },
            )
            .await;
        check(response.diagnostics)?;
        Ok(())
    }

    /// Re-read state from the remote system; `None` when the object is gone
    pub async fn refresh(
        &self,
        ctx: Context,
        state: &StoredState,
    ) -> Result<Option<StoredState>, HostError> {
        let resource = self.resource(&ctx, &state.type_name).await?;
        let schema = Self::resource_schema(&ctx, resource.as_ref()).await?;

        let response = resource
            .read(
                ctx,
                ReadResourceRequest {
                    type_name: state.type_name.clone(),
                    current_state: state.value()?,
                },
            )
            .await;
        check(response.diagnostics)?;

        match response.new_state {
            Some(mut new_state) => {
                plan::normalize(&schema, &mut new_state);
                StoredState::encode(&state.type_name, schema.version, &new_state).map(Some)
            }
            None => {
                info!(resource = %state.type_name, "remote object no longer exists, dropping state");
                Ok(None)
            }
        }
    }

    /// Import an existing object by id, then read it
    pub async fn import(
        &self,
        ctx: Context,
        type_name: &str,
        id: &str,
    ) -> Result<StoredState, HostError> {
        let resource = self.resource(&ctx, type_name).await?;
        let schema = Self::resource_schema(&ctx, resource.as_ref()).await?;

        let response = resource
            .import_state(
                ctx.clone(),
                ImportResourceStateRequest {
                    type_name: type_name.to_string(),
                    id: id.to_string(),
                },
            )
            .await;
        check(response.diagnostics)?;

        let imported = response.imported_resources.into_iter().next().ok_or_else(|| {
            HostError::single("Import failed", "The provider returned no imported resources")
        })?;
        let stored = StoredState::encode(type_name, schema.version, &imported.state)?;

        self.refresh(ctx, &stored).await?.ok_or_else(|| {
            HostError::single(
                "Cannot import non-existent remote object",
                format!("No {} with id \"{}\" exists", type_name, id),
            )
        })
    }

    /// Delete the remote object behind `state`
    pub async fn destroy(&self, ctx: Context, state: &StoredState) -> Result<(), HostError> {
        let resource = self.resource(&ctx, &state.type_name).await?;
        self.delete(&ctx, resource.as_ref(), state).await?;
        info!(resource = %state.type_name, "destroyed resource");
        Ok(())
    }

    pub async fn read_data_source(
        &self,
        ctx: Context,
        type_name: &str,
        config: DynamicValue,
    ) -> Result<DynamicValue, HostError> {
        let data_source = self.data_source(&ctx, type_name).await?;
        let schema = data_source
            .schema(ctx.clone(), DataSourceSchemaRequest)
            .await;
        let mut diagnostics = schema.diagnostics;
        diagnostics.extend(plan::validate_config(&schema.schema, &config));
        diagnostics.extend(
            data_source
                .validate(
                    ctx.clone(),
                    ValidateDataSourceConfigRequest {
                        type_name: type_name.to_string(),
                        config: config.clone(),
                    },
                )
                .await
                .diagnostics,
        );
        check(diagnostics)?;

        let response = data_source
            .read(
                ctx,
                ReadDataSourceRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        check(response.diagnostics)?;

        let mut state = response.state;
        plan::normalize(&schema.schema, &mut state);
        Ok(state)
    }
}
