//! data.boundary_scope

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{lookup_attributes, BoundaryDataSource, Lookup};
use crate::api::{ApiError, Client};
use crate::resources::StateWriter;
use crate::validators::BoundaryIdValidator;

#[derive(Default)]
pub struct ScopeDataSource;

#[async_trait]
impl BoundaryDataSource for ScopeDataSource {
    const TYPE_NAME: &'static str = "boundary_scope";
    const DESCRIPTION: &'static str = "Look up a scope by ID or by name within its parent scope";

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes =
            lookup_attributes("scope_id", BoundaryIdValidator::new(&["o"]).or_literal("global"));
        attributes.push(
            AttributeBuilder::new("type", AttributeType::String)
                .description("global, org or project")
                .computed()
                .build(),
        );
        attributes
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        Lookup::validate(config, "scope_id")
    }

    async fn read(&self, client: &Client, config: &DynamicValue) -> Result<DynamicValue, ApiError> {
        let lookup = Lookup::from_config(config, "scope_id")?;
        let scope = lookup.find(client.scopes()).await?;

        let mut state = StateWriter::new();
        state
            .string("id", Some(&scope.meta.id))
            .string("name", scope.meta.name.as_deref())
            .string("description", scope.meta.description.as_deref())
            .string("scope_id", scope.meta.scope_id.as_deref())
            .string("type", Some(&scope.kind));
        Ok(state.finish())
    }
}
