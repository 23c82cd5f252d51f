//! boundary_worker
//!
//! Workers register in one of two ways. With `worker_generated_auth_token`
//! the worker has already produced a request that the controller accepts
//! (worker-led). Without it the controller issues an activation token the
//! worker presents on first start (controller-led); that token is only
//! returned once, so state keeps it.

use async_trait::async_trait;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tracing::info;

use super::{
    description_attribute, name_attribute, BoundaryResource, Secret, Secrets, StateModel,
    StateReader, StateWriter, Tracked,
};
use crate::api::workers::{CreateWorkerRequest, Worker};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

const WORKER_TOKEN: &str = "worker_generated_auth_token";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub controller_generated_activation_token: Option<String>,
    pub address: Option<String>,
    pub release_version: Option<String>,
}

impl StateModel for WorkerModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            controller_generated_activation_token: state
                .string("controller_generated_activation_token")?,
            address: state.string("address")?,
            release_version: state.string("release_version")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string(
                "controller_generated_activation_token",
                self.controller_generated_activation_token.as_deref(),
            )
            .string("address", self.address.as_deref())
            .string("release_version", self.release_version.as_deref());
    }
}

impl From<Worker> for Tracked<WorkerModel> {
    fn from(worker: Worker) -> Self {
        Tracked {
            model: WorkerModel {
                scope_id: worker.meta.scope_id.clone().unwrap_or_else(|| "global".to_string()),
                name: worker.meta.name.clone(),
                description: worker.meta.description.clone(),
                controller_generated_activation_token: worker.controller_generated_activation_token,
                address: worker.address,
                release_version: worker.release_version,
            },
            meta: worker.meta,
        }
    }
}

#[derive(Default)]
pub struct WorkerResource;

#[async_trait]
impl BoundaryResource for WorkerResource {
    type Model = WorkerModel;

    const TYPE_NAME: &'static str = "boundary_worker";
    const DESCRIPTION: &'static str = "A self-managed worker registered with the controller";
    const SECRETS: &'static [Secret] = &[Secret::force_new(WORKER_TOKEN)];
    const PRESERVED: &'static [&'static str] = &["controller_generated_activation_token"];

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            AttributeBuilder::new("scope_id", AttributeType::String)
                .description("Workers live in the global scope")
                .optional()
                .computed()
                .validator(BoundaryIdValidator::new(&[]).or_literal("global").boxed())
                .default(StaticDefault::string("global"))
                .plan_modifier(RequiresReplace::create())
                .build(),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new(WORKER_TOKEN, AttributeType::String)
                .description("Registration request produced by the worker; switches to worker-led registration")
                .optional()
                .sensitive()
                .write_only()
                .build(),
            AttributeBuilder::new("controller_generated_activation_token", AttributeType::String)
                .description("One-time token for controller-led registration")
                .computed()
                .sensitive()
                .plan_modifier(UseStateForUnknown::create())
                .build(),
            AttributeBuilder::new("address", AttributeType::String)
                .description("Address the worker advertises")
                .computed()
                .build(),
            AttributeBuilder::new("release_version", AttributeType::String)
                .description("Boundary version the worker runs")
                .computed()
                .build(),
        ]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &WorkerModel,
        secrets: &Secrets,
    ) -> Result<Tracked<WorkerModel>, ApiError> {
        let token = secrets.value(WORKER_TOKEN).map(str::to_string);
        let action = if token.is_some() {
            "create:worker-led"
        } else {
            "create:controller-led"
        };
        let request = CreateWorkerRequest {
            scope_id: plan.scope_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            worker_generated_auth_token: token,
        };
        let worker = client.workers().collection_action(action, &request).await?;
        info!(id = %worker.meta.id, registration = action, "registered worker");
        Ok(worker.into())
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<WorkerModel>, ApiError> {
        Ok(client.workers().read(id).await?.into())
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<WorkerModel>,
        plan: &WorkerModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<WorkerModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
        let mut tracked: Tracked<WorkerModel> = if body.has_changes() {
            client
                .workers()
                .update(&prior.meta.id, &body.into_value())
                .await?
                .into()
        } else {
            self.read(client, &prior.meta.id).await?
        };
        tracked.model.controller_generated_activation_token =
            prior.model.controller_generated_activation_token.clone();
        Ok(tracked)
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.workers().delete(id).await
    }
}
