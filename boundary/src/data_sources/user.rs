//! data.boundary_user

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{lookup_attributes, BoundaryDataSource, Lookup};
use crate::api::{ApiError, Client};
use crate::resources::StateWriter;
use crate::validators::BoundaryIdValidator;

#[derive(Default)]
pub struct UserDataSource;

#[async_trait]
impl BoundaryDataSource for UserDataSource {
    const TYPE_NAME: &'static str = "boundary_user";
    const DESCRIPTION: &'static str = "Look up a user";

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes =
            lookup_attributes("scope_id", BoundaryIdValidator::new(&["o"]).or_literal("global"));
        attributes.extend([
            AttributeBuilder::new("account_ids", AttributeType::Set(Box::new(AttributeType::String)))
                .computed()
                .build(),
            AttributeBuilder::new("primary_account_id", AttributeType::String)
                .computed()
                .build(),
            AttributeBuilder::new("login_name", AttributeType::String)
                .description("Login name of the primary account")
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
        let user = lookup.find(client.users()).await?;

        let mut state = StateWriter::new();
        state
            .string("id", Some(&user.meta.id))
            .string("name", user.meta.name.as_deref())
            .string("description", user.meta.description.as_deref())
            .string("scope_id", user.meta.scope_id.as_deref())
            .strings("account_ids", &user.account_ids)
            .string("primary_account_id", user.primary_account_id.as_deref())
            .string("login_name", user.login_name.as_deref());
        Ok(state.finish())
    }
}
