//! boundary_credential_json
//!
//! The JSON document is treated as one secret: Terraform only keeps its
//! digest, and any change to the text sends the whole object again.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secret, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::credentials::{
    CreateCredentialRequest, Credential, CredentialAttributes, JsonCredentialAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonCredentialModel {
    pub credential_store_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl StateModel for JsonCredentialModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            credential_store_id: state.required_string("credential_store_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("credential_store_id", Some(&self.credential_store_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref());
    }
}

impl TryFrom<Credential> for Tracked<JsonCredentialModel> {
    type Error = ApiError;

    fn try_from(credential: Credential) -> Result<Self, ApiError> {
        if credential.kind != "json" {
            return Err(ApiError::ParseError(format!(
                "credential {} is of type \"{}\", not json",
                credential.meta.id, credential.kind
            )));
        }
        Ok(Tracked {
            model: JsonCredentialModel {
                credential_store_id: credential.credential_store_id,
                name: credential.meta.name.clone(),
                description: credential.meta.description.clone(),
            },
            meta: credential.meta,
        })
    }
}

/// The `object` attribute must be a JSON object, not any JSON value
fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err("the document must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn object_from(secrets: &Secrets) -> Result<Option<Map<String, Value>>, ApiError> {
    secrets
        .value("object")
        .map(|text| parse_object(text).map_err(ApiError::Validation))
        .transpose()
}

#[derive(Default)]
pub struct CredentialJsonResource;

#[async_trait]
impl BoundaryResource for CredentialJsonResource {
    type Model = JsonCredentialModel;

    const TYPE_NAME: &'static str = "boundary_credential_json";
    const DESCRIPTION: &'static str = "A JSON document held in a static credential store";
    const SECRETS: &'static [Secret] = &[Secret::new("object")];

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "credential_store_id",
                "The static credential store holding the credential",
                BoundaryIdValidator::new(&["csst"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("object", AttributeType::String)
                .description("The credential as an encoded JSON object, e.g. from jsonencode()")
                .required()
                .sensitive()
                .write_only()
                .build(),
        ]
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let Ok(Some(text)) = config.get_optional_string(&AttributePath::new("object")) else {
            return vec![];
        };
        match parse_object(&text) {
            Ok(_) => vec![],
            Err(detail) => vec![Diagnostic::error("Invalid JSON credential", detail)
                .with_attribute(AttributePath::new("object"))],
        }
    }

    async fn create(
        &self,
        client: &Client,
        plan: &JsonCredentialModel,
        secrets: &Secrets,
    ) -> Result<Tracked<JsonCredentialModel>, ApiError> {
        let request = CreateCredentialRequest {
            credential_store_id: plan.credential_store_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            attributes: CredentialAttributes::Json(JsonCredentialAttributes {
                object: object_from(secrets)?,
            }),
        };
        client.credentials().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<JsonCredentialModel>, ApiError> {
        client.credentials().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<JsonCredentialModel>,
        plan: &JsonCredentialModel,
        secrets: &Secrets,
    ) -> Result<Tracked<JsonCredentialModel>, ApiError> {
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &prior.model.name, &plan.name)
            .optional("description", &prior.model.description, &plan.description);
        if secrets.changed("object") {
            body.set_attribute("object", object_from(secrets)?);
        }
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .credentials()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.credentials().delete(id).await
    }
}
