//! data.boundary_auth_method

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{lookup_attributes, BoundaryDataSource, Lookup};
use crate::api::common::encode_attributes;
use crate::api::{ApiError, Client};
use crate::resources::StateWriter;
use crate::validators::BoundaryIdValidator;

/// Flatten type-specific attributes into strings. Strings are kept as is,
/// everything else is rendered as JSON; nulls and empty lists are dropped.
fn render_attributes(attributes: &Value) -> HashMap<String, String> {
    let Value::Object(entries) = attributes else {
        return HashMap::new();
    };
    entries
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::Array(items) if items.is_empty() => None,
            Value::String(s) => Some((key.clone(), s.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}

#[derive(Default)]
pub struct AuthMethodDataSource;

#[async_trait]
impl BoundaryDataSource for AuthMethodDataSource {
    const TYPE_NAME: &'static str = "boundary_auth_method";
    const DESCRIPTION: &'static str = "Look up an auth method of any type";

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes =
            lookup_attributes("scope_id", BoundaryIdValidator::new(&["o"]).or_literal("global"));
        attributes.extend([
            AttributeBuilder::new("type", AttributeType::String)
                .description("password, oidc or ldap")
                .computed()
                .build(),
            AttributeBuilder::new("is_primary_for_scope", AttributeType::Bool)
                .computed()
                .build(),
            AttributeBuilder::new("attributes", AttributeType::Map(Box::new(AttributeType::String)))
                .description("Type-specific settings; non-string values are JSON encoded")
                .computed()
                .build(),
        ]);
        attributes
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        Lookup::validate(config, "scope_id")
    }

    async fn read(&self, client: &Client, config: &DynamicValue) -> Result<DynamicValue, ApiError> {
        let lookup = Lookup::from_config(config, "scope_id")?;
        let method = lookup.find(client.auth_methods()).await?;
        let (kind, attributes) = encode_attributes(&method.variant()?)?;

        let mut state = StateWriter::new();
        state
            .string("id", Some(&method.meta.id))
            .string("name", method.meta.name.as_deref())
            .string("description", method.meta.description.as_deref())
            .string("scope_id", method.meta.scope_id.as_deref())
            .string("type", Some(&kind))
            .bool("is_primary_for_scope", Some(method.is_primary))
            .string_map("attributes", &render_attributes(&attributes));
        Ok(state.finish())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;
    use tfplug::types::AttributePath;
    use tfplug::types::Dynamic;

    #[test]
    fn attributes_render_as_strings() {
        let rendered = render_attributes(&json!({
            "issuer": "https://idp.example.com",
            "max_age": 300,
            "signing_algorithms": ["RS256"],
            "claims_scopes": [],
            "state": null
        }));
        assert_eq!(rendered["issuer"], "https://idp.example.com");
        assert_eq!(rendered["max_age"], "300");
        assert_eq!(rendered["signing_algorithms"], r#"["RS256"]"#);
        assert!(!rendered.contains_key("claims_scopes"));
        assert!(!rendered.contains_key("state"));
    }

    #[tokio::test]
    async fn reads_by_id() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/auth-methods/ampw_1234567890")
            .with_body(
                r#"{"id":"ampw_1234567890","scope_id":"global","type":"password","version":1,"is_primary":true,"attributes":{"min_login_name_length":3,"min_password_length":8}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let config = DynamicValue::from_pairs([("id", Dynamic::from("ampw_1234567890"))]);
        let state = AuthMethodDataSource.read(&client, &config).await.unwrap();

        assert_eq!(
            state.get_optional_bool(&AttributePath::new("is_primary_for_scope")).unwrap(),
            Some(true)
        );
        let attributes = state
            .get_optional_string_map(&AttributePath::new("attributes"))
            .unwrap()
            .unwrap();
        assert_eq!(attributes["min_password_length"], "8");
    }
}
