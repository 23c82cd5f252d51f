//! data.boundary_account

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{lookup_attributes, BoundaryDataSource, Lookup};
use crate::api::{ApiError, Client};
use crate::resources::StateWriter;
use crate::validators::BoundaryIdValidator;

#[derive(Default)]
pub struct AccountDataSource;

#[async_trait]
impl BoundaryDataSource for AccountDataSource {
    const TYPE_NAME: &'static str = "boundary_account";
    const DESCRIPTION: &'static str = "Look up an account of any auth method type";

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes =
            lookup_attributes("auth_method_id", BoundaryIdValidator::new(&["ampw", "amoidc", "amldap"]));
        attributes.extend([
            AttributeBuilder::new("type", AttributeType::String)
                .computed()
                .build(),
            AttributeBuilder::new("login_name", AttributeType::String)
                .description("Set for password and LDAP accounts")
                .computed()
                .build(),
        ]);
        attributes
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        Lookup::validate(config, "auth_method_id")
    }

    async fn read(&self, client: &Client, config: &DynamicValue) -> Result<DynamicValue, ApiError> {
        let lookup = Lookup::from_config(config, "auth_method_id")?;
        let account = lookup.find(client.accounts()).await?;

        let mut state = StateWriter::new();
        state
            .string("id", Some(&account.meta.id))
            .string("name", account.meta.name.as_deref())
            .string("description", account.meta.description.as_deref())
            .string("auth_method_id", Some(&account.auth_method_id))
            .string("type", Some(&account.kind))
            .string("login_name", account.login_name().as_deref());
        Ok(state.finish())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use tfplug::types::{AttributePath, Dynamic};

    #[tokio::test]
    async fn name_lookup_lists_the_auth_method() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/v1/accounts")
            .match_query(Matcher::UrlEncoded("auth_method_id".into(), "ampw_1234567890".into()))
            .with_body(
                r#"{"items":[{"id":"acctpw_1234567890","auth_method_id":"ampw_1234567890","name":"admin","type":"password","version":1,"attributes":{"login_name":"admin"}}]}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let config = DynamicValue::from_pairs([
            ("name", Dynamic::from("admin")),
            ("auth_method_id", Dynamic::from("ampw_1234567890")),
        ]);
        let state = AccountDataSource.read(&client, &config).await.unwrap();

        list.assert_async().await;
        assert_eq!(
            state.get_optional_string(&AttributePath::new("login_name")).unwrap(),
            Some("admin".to_string())
        );
    }
}
