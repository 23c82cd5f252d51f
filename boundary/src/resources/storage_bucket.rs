//! boundary_storage_bucket
//!
//! Plugin attributes and secrets are free-form JSON documents. The API
//! returns attributes in its own canonical form, so state keeps the
//! configured text instead of the server rendering.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tfplug::plan_modifier::RequiresReplace;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secret, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::storage_buckets::{CreateStorageBucketRequest, StorageBucket};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageBucketModel {
    pub scope_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub plugin_name: Option<String>,
    pub bucket_name: String,
    pub bucket_prefix: Option<String>,
    pub worker_filter: String,
    pub attributes_json: Option<String>,
}

impl StateModel for StorageBucketModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            plugin_name: state.string("plugin_name")?,
            bucket_name: state.required_string("bucket_name")?,
            bucket_prefix: state.string("bucket_prefix")?,
            worker_filter: state.required_string("worker_filter")?,
            attributes_json: state.string("attributes_json")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("plugin_name", self.plugin_name.as_deref())
            .string("bucket_name", Some(&self.bucket_name))
            .string("bucket_prefix", self.bucket_prefix.as_deref())
            .string("worker_filter", Some(&self.worker_filter))
            .string("attributes_json", self.attributes_json.as_deref());
    }
}

impl From<StorageBucket> for Tracked<StorageBucketModel> {
    fn from(bucket: StorageBucket) -> Self {
        Tracked {
            model: StorageBucketModel {
                scope_id: bucket.meta.scope_id.clone().unwrap_or_default(),
                name: bucket.meta.name.clone(),
                description: bucket.meta.description.clone(),
                plugin_name: bucket.plugin_name,
                bucket_name: bucket.bucket_name,
                bucket_prefix: bucket.bucket_prefix,
                worker_filter: bucket.worker_filter.unwrap_or_default(),
                attributes_json: None,
            },
            meta: bucket.meta,
        }
    }
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err("the document must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn decode(text: Option<&str>) -> Result<Option<Map<String, Value>>, ApiError> {
    text.map(|text| parse_object(text).map_err(ApiError::Validation))
        .transpose()
}

#[derive(Default)]
pub struct StorageBucketResource;

#[async_trait]
impl BoundaryResource for StorageBucketResource {
    type Model = StorageBucketModel;

    const TYPE_NAME: &'static str = "boundary_storage_bucket";
    const DESCRIPTION: &'static str = "External object storage for session recordings";
    const SECRETS: &'static [Secret] = &[Secret::new("secrets_json")];
    const PRESERVED: &'static [&'static str] = &["attributes_json", "plugin_name"];

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "scope_id",
                "Global or org scope owning the bucket",
                BoundaryIdValidator::new(&["o"]).or_literal("global"),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("plugin_name", AttributeType::String)
                .description("Storage plugin, e.g. aws or minio")
                .required()
                .plan_modifier(RequiresReplace::create())
                .build(),
            AttributeBuilder::new("bucket_name", AttributeType::String)
                .required()
                .plan_modifier(RequiresReplace::create())
                .build(),
            AttributeBuilder::new("bucket_prefix", AttributeType::String)
                .description("Key prefix for objects written to the bucket")
                .optional()
                .plan_modifier(RequiresReplace::create())
                .build(),
            AttributeBuilder::new("worker_filter", AttributeType::String)
                .description("Filter selecting workers with access to the bucket")
                .required()
                .build(),
            AttributeBuilder::new("attributes_json", AttributeType::String)
                .description("Plugin attributes as an encoded JSON object")
                .optional()
                .build(),
            AttributeBuilder::new("secrets_json", AttributeType::String)
                .description("Plugin secrets as an encoded JSON object")
                .optional()
                .sensitive()
                .write_only()
                .build(),
        ]
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];
        for name in ["attributes_json", "secrets_json"] {
            let path = AttributePath::new(name);
            let Ok(Some(text)) = config.get_optional_string(&path) else {
                continue;
            };
            if let Err(detail) = parse_object(&text) {
                diagnostics.push(
                    Diagnostic::error(format!("Invalid {}", name), detail).with_attribute(path),
                );
            }
        }
        diagnostics
    }

    async fn create(
        &self,
        client: &Client,
        plan: &StorageBucketModel,
        secrets: &Secrets,
    ) -> Result<Tracked<StorageBucketModel>, ApiError> {
        let plugin_name = plan
            .plugin_name
            .clone()
            .ok_or_else(|| ApiError::Validation("plugin_name is required".to_string()))?;
        let request = CreateStorageBucketRequest {
            scope_id: plan.scope_id.clone(),
            plugin_name: plugin_name.clone(),
            bucket_name: plan.bucket_name.clone(),
            bucket_prefix: plan.bucket_prefix.clone(),
            worker_filter: plan.worker_filter.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: decode(plan.attributes_json.as_deref())?,
            secrets: decode(secrets.value("secrets_json"))?,
        };
        let mut tracked: Tracked<StorageBucketModel> =
            client.storage_buckets().create(&request).await?.into();
        tracked.model.attributes_json = plan.attributes_json.clone();
        tracked.model.plugin_name.get_or_insert(plugin_name);
        Ok(tracked)
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<StorageBucketModel>, ApiError> {
        Ok(client.storage_buckets().read(id).await?.into())
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<StorageBucketModel>,
        plan: &StorageBucketModel,
        secrets: &Secrets,
    ) -> Result<Tracked<StorageBucketModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description)
            .optional(
                "worker_filter",
                &Some(&prior.model.worker_filter),
                &Some(&plan.worker_filter),
            );
        if prior.model.attributes_json != plan.attributes_json {
            body.set("attributes", decode(plan.attributes_json.as_deref())?);
        }
        if secrets.changed("secrets_json") {
            body.set("secrets", decode(secrets.value("secrets_json"))?);
        }

        let mut tracked: Tracked<StorageBucketModel> = if body.has_changes() {
            client
                .storage_buckets()
                .update(&prior.meta.id, &body.into_value())
                .await?
                .into()
        } else {
            self.read(client, &prior.meta.id).await?
        };
        tracked.model.attributes_json = plan.attributes_json.clone();
        if tracked.model.plugin_name.is_none() {
            tracked.model.plugin_name = plan.plugin_name.clone();
        }
        Ok(tracked)
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.storage_buckets().delete(id).await
    }
}
