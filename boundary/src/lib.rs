//! Terraform provider for HashiCorp Boundary, built on tfplug

pub mod api;
pub mod config;
pub mod data_sources;
pub mod digest;
pub mod provider_data;
pub mod resources;
pub mod validators;

pub use provider_data::BoundaryProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
    ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic};
use tracing::info;

use crate::config::ProviderSettings;
use crate::validators::BoundaryIdValidator;

pub const PROVIDER_TYPE_NAME: &str = "boundary";

pub struct BoundaryProvider {
    provider_data: Option<BoundaryProviderData>,
}

impl Default for BoundaryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn provider_data(&self) -> Option<&BoundaryProviderData> {
        self.provider_data.as_ref()
    }
}

#[async_trait]
impl Provider for BoundaryProvider {
    fn type_name(&self) -> &str {
        PROVIDER_TYPE_NAME
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .description("Manage HashiCorp Boundary")
            .attribute(
                AttributeBuilder::new("addr", AttributeType::String)
                    .description("Boundary controller address, e.g. https://boundary.example.com:9200. Falls back to BOUNDARY_ADDR.")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("token", AttributeType::String)
                    .description("Auth token. Falls back to BOUNDARY_TOKEN.")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auth_method_id", AttributeType::String)
                    .description("Password auth method used to log in. Falls back to BOUNDARY_AUTH_METHOD_ID.")
                    .optional()
                    .validator(BoundaryIdValidator::create(&["ampw"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auth_method_login_name", AttributeType::String)
                    .description("Login name for the auth method. Falls back to BOUNDARY_AUTH_METHOD_LOGIN_NAME.")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auth_method_password", AttributeType::String)
                    .description("Password for the auth method. Falls back to BOUNDARY_AUTH_METHOD_PASSWORD.")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tls_insecure", AttributeType::Bool)
                    .description("Skip TLS certificate verification. Falls back to BOUNDARY_TLS_INSECURE.")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        match ProviderSettings::from_config(&request.config) {
            Ok(settings) => {
                info!(addr = %settings.addr, "configuring Boundary provider");
                let data = BoundaryProviderData::new(settings);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics: vec![],
                    provider_data: Some(Arc::new(data)),
                }
            }
            Err(diagnostics) => ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            },
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        let mut diagnostics = vec![];
        let configured = |name: &str| {
            matches!(
                request.config.get(&AttributePath::new(name)),
                Some(Dynamic::String(_)) | Some(Dynamic::Unknown)
            )
        };

        if configured("token") && configured("auth_method_password") {
            diagnostics.push(
                Diagnostic::error(
                    "Conflicting credentials",
                    "token and auth_method_password cannot both be set",
                )
                .with_attribute(AttributePath::new("token")),
            );
        }

        ValidateProviderConfigResponse { diagnostics }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        resources::factories()
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        data_sources::factories()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::config::{
        Credentials, ENV_ADDR, ENV_AUTH_METHOD_ID, ENV_LOGIN_NAME, ENV_PASSWORD,
        ENV_TLS_INSECURE, ENV_TOKEN,
    };
    use serial_test::serial;
    use tfplug::types::DynamicValue;

    fn clear_env() {
        for key in [
            ENV_ADDR,
            ENV_TOKEN,
            ENV_AUTH_METHOD_ID,
            ENV_LOGIN_NAME,
            ENV_PASSWORD,
            ENV_TLS_INSECURE,
        ] {
            std::env::remove_var(key);
        }
    }

    async fn configure(provider: &mut BoundaryProvider, config: DynamicValue) -> ConfigureProviderResponse {
        provider
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    terraform_version: "1.9.0".to_string(),
                    config,
                },
            )
            .await
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_successfully_with_env_vars() {
        clear_env();
        std::env::set_var(ENV_ADDR, "https://localhost:9200");
        std::env::set_var(ENV_TOKEN, "at_1234567890_token");
        std::env::set_var(ENV_TLS_INSECURE, "true");

        let mut provider = BoundaryProvider::new();
        let response = configure(&mut provider, DynamicValue::object()).await;
        assert!(response.diagnostics.is_empty());
        assert!(response.provider_data.is_some());

        let settings = provider.provider_data().unwrap().settings();
        assert_eq!(settings.addr, "https://localhost:9200");
        assert!(settings.tls_insecure);
        assert_eq!(
            settings.credentials,
            Credentials::Token("at_1234567890_token".to_string())
        );

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_requires_addr() {
        clear_env();
        std::env::set_var(ENV_TOKEN, "at_1234567890_token");

        let mut provider = BoundaryProvider::new();
        let response = configure(&mut provider, DynamicValue::object()).await;
        assert!(!response.diagnostics.is_empty());
        assert!(response.diagnostics[0].summary.contains("addr is required"));
        assert!(response.diagnostics[0].detail.contains(ENV_ADDR));
        assert!(response.provider_data.is_none());
        assert!(provider.provider_data().is_none());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_requires_credentials() {
        clear_env();

        let mut provider = BoundaryProvider::new();
        let config = DynamicValue::from_pairs([("addr", Dynamic::from("http://127.0.0.1:9200"))]);
        let response = configure(&mut provider, config).await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Missing credentials");
    }

    #[tokio::test]
    #[serial]
    async fn provider_config_takes_precedence_over_env() {
        clear_env();
        std::env::set_var(ENV_ADDR, "https://from-env:9200");
        std::env::set_var(ENV_AUTH_METHOD_ID, "ampw_1234567890");
        std::env::set_var(ENV_LOGIN_NAME, "admin");
        std::env::set_var(ENV_PASSWORD, "from-env");

        let mut provider = BoundaryProvider::new();
        let config = DynamicValue::from_pairs([
            ("addr", Dynamic::from("https://from-config:9200")),
            ("auth_method_password", Dynamic::from("from-config")),
        ]);
        let response = configure(&mut provider, config).await;
        assert!(response.diagnostics.is_empty());

        let settings = provider.provider_data().unwrap().settings();
        assert_eq!(settings.addr, "https://from-config:9200");
        assert_eq!(
            settings.credentials,
            Credentials::Password {
                auth_method_id: "ampw_1234567890".to_string(),
                login_name: "admin".to_string(),
                password: "from-config".to_string(),
            }
        );

        clear_env();
    }

    #[tokio::test]
    async fn validate_rejects_token_with_password() {
        let provider = BoundaryProvider::new();
        let response = provider
            .validate(
                Context::new(),
                ValidateProviderConfigRequest {
                    config: DynamicValue::from_pairs([
                        ("token", Dynamic::from("at_x")),
                        ("auth_method_password", Dynamic::from("secret")),
                    ]),
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("token"))
        );
    }

    #[test]
    fn provider_exposes_resources_and_data_sources() {
        let provider = BoundaryProvider::new();
        let resources = provider.resources();
        assert!(resources.contains_key("boundary_scope"));
        assert!(resources.contains_key("boundary_target"));
        let data_sources = provider.data_sources();
        assert!(data_sources.contains_key("boundary_scope"));
        assert!(data_sources.contains_key("boundary_sessions"));
    }
}
