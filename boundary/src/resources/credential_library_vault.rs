//! boundary_credential_library_vault

use async_trait::async_trait;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::RequiresReplace;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::OneOfValidator;

use super::{
    description_attribute, name_attribute, parent_attribute, BoundaryResource, Secrets,
    StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::credential_libraries::{
    CreateCredentialLibraryRequest, CredentialLibrary, CredentialLibraryAttributes,
    VaultGenericAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

const HTTP_METHODS: &[&str] = &["GET", "POST"];
const CREDENTIAL_TYPES: &[&str] = &["username_password", "ssh_private_key"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultLibraryModel {
    pub credential_store_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub path: String,
    pub http_method: Option<String>,
    pub http_request_body: Option<String>,
    pub credential_type: Option<String>,
}

impl StateModel for VaultLibraryModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            credential_store_id: state.required_string("credential_store_id")?,
            name: state.string("name")?,
            description: state.string("description")?,
            path: state.required_string("path")?,
            http_method: state.string("http_method")?,
            http_request_body: state.string("http_request_body")?,
            credential_type: state.string("credential_type")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("credential_store_id", Some(&self.credential_store_id))
            .string("name", self.name.as_deref())
            .string("description", self.description.as_deref())
            .string("path", Some(&self.path))
            .string("http_method", self.http_method.as_deref())
            .string("http_request_body", self.http_request_body.as_deref())
            .string("credential_type", self.credential_type.as_deref());
    }
}

impl TryFrom<CredentialLibrary> for Tracked<VaultLibraryModel> {
    type Error = ApiError;

    fn try_from(library: CredentialLibrary) -> Result<Self, ApiError> {
        let CredentialLibraryAttributes::VaultGeneric(attrs) = library.variant()? else {
            return Err(ApiError::ParseError(format!(
                "credential library {} is of type \"{}\", not vault-generic",
                library.meta.id, library.kind
            )));
        };
        Ok(Tracked {
            model: VaultLibraryModel {
                credential_store_id: library.credential_store_id,
                name: library.meta.name.clone(),
                description: library.meta.description.clone(),
                path: attrs.path,
                http_method: Some(attrs.http_method.unwrap_or_else(|| "GET".to_string())),
                http_request_body: attrs.http_request_body,
                credential_type: library.credential_type,
            },
            meta: library.meta,
        })
    }
}

#[derive(Default)]
pub struct CredentialLibraryVaultResource;

#[async_trait]
impl BoundaryResource for CredentialLibraryVaultResource {
    type Model = VaultLibraryModel;

    const TYPE_NAME: &'static str = "boundary_credential_library_vault";
    const DESCRIPTION: &'static str = "A library issuing credentials from a Vault path";

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            parent_attribute(
                "credential_store_id",
                "The Vault credential store the library belongs to",
                BoundaryIdValidator::new(&["csvlt"]),
            ),
            name_attribute(),
            description_attribute(),
            AttributeBuilder::new("path", AttributeType::String)
                .description("Vault path to read or post to")
                .required()
                .build(),
            AttributeBuilder::new("http_method", AttributeType::String)
                .description("GET or POST")
                .optional()
                .computed()
                .validator(OneOfValidator::create(HTTP_METHODS))
                .default(StaticDefault::string("GET"))
                .build(),
            AttributeBuilder::new("http_request_body", AttributeType::String)
                .description("Body sent with POST requests")
                .optional()
                .build(),
            AttributeBuilder::new("credential_type", AttributeType::String)
                .description("Type of the credentials issued, for brokering them by shape")
                .optional()
                .validator(OneOfValidator::create(CREDENTIAL_TYPES))
                .plan_modifier(RequiresReplace::create())
                .build(),
        ]
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        // Unset means the GET default; unknown values are checked at apply
        let not_post = match config.get(&AttributePath::new("http_method")) {
            None | Some(Dynamic::Null) => true,
            Some(Dynamic::String(method)) => method != "POST",
            Some(_) => false,
        };
        let body = config
            .get_optional_string(&AttributePath::new("http_request_body"))
            .ok()
            .flatten();

        match body {
            Some(_) if not_post => vec![Diagnostic::error(
                "http_request_body requires POST",
                "A request body can only be sent when http_method is \"POST\"",
            )
            .with_attribute(AttributePath::new("http_request_body"))],
            _ => vec![],
        }
    }

    async fn create(
        &self,
        client: &Client,
        plan: &VaultLibraryModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<VaultLibraryModel>, ApiError> {
        let request = CreateCredentialLibraryRequest {
            credential_store_id: plan.credential_store_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            credential_type: plan.credential_type.clone(),
            attributes: CredentialLibraryAttributes::VaultGeneric(VaultGenericAttributes {
                path: plan.path.clone(),
                http_method: plan.http_method.clone(),
                http_request_body: plan.http_request_body.clone(),
            }),
        };
        client.credential_libraries().create(&request).await?.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<VaultLibraryModel>, ApiError> {
        client.credential_libraries().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<VaultLibraryModel>,
        plan: &VaultLibraryModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<VaultLibraryModel>, ApiError> {
        let old = &prior.model;
        let mut body = UpdateBody::new(prior.meta.version);
        body.optional("name", &old.name, &plan.name)
            .optional("description", &old.description, &plan.description)
            .attribute_optional("path", &Some(&old.path), &Some(&plan.path))
            .attribute_computed("http_method", &old.http_method, &plan.http_method)
            .attribute_optional(
                "http_request_body",
                &old.http_request_body,
                &plan.http_request_body,
            );
        if !body.has_changes() {
            return self.read(client, &prior.meta.id).await;
        }
        client
            .credential_libraries()
            .update(&prior.meta.id, &body.into_value())
            .await?
            .try_into()
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.credential_libraries().delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn request_body_needs_post() {
        let config = DynamicValue::from_pairs([
            ("http_method", Dynamic::from("GET")),
            ("http_request_body", Dynamic::from("{}")),
        ]);
        let diagnostics = CredentialLibraryVaultResource.validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some(AttributePath::new("http_request_body"))
        );

        let config = DynamicValue::from_pairs([
            ("http_method", Dynamic::from("POST")),
            ("http_request_body", Dynamic::from("{}")),
        ]);
        assert!(CredentialLibraryVaultResource.validate(&config).is_empty());
    }

    #[test]
    fn http_method_defaults_to_get() {
        let library: CredentialLibrary = serde_json::from_value(serde_json::json!({
            "id": "clvlt_1234567890",
            "credential_store_id": "csvlt_1234567890",
            "type": "vault-generic",
            "version": 1,
            "attributes": {"path": "secret/data/db"}
        }))
        .unwrap();
        let tracked: Tracked<VaultLibraryModel> = library.try_into().unwrap();
        assert_eq!(tracked.model.http_method.as_deref(), Some("GET"));
        assert_eq!(tracked.model.credential_type, None);
    }
}
