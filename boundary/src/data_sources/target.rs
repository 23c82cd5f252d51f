//! data.boundary_target

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{lookup_attributes, BoundaryDataSource, Lookup};
use crate::api::{ApiError, Client};
use crate::resources::StateWriter;
use crate::validators::BoundaryIdValidator;

#[derive(Default)]
pub struct TargetDataSource;

#[async_trait]
impl BoundaryDataSource for TargetDataSource {
    const TYPE_NAME: &'static str = "boundary_target";
    const DESCRIPTION: &'static str = "Look up a target in a project";

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = lookup_attributes("scope_id", BoundaryIdValidator::new(&["p"]));
        attributes.extend([
            AttributeBuilder::new("type", AttributeType::String)
                .computed()
                .build(),
            AttributeBuilder::new("default_port", AttributeType::Number)
                .computed()
                .build(),
            AttributeBuilder::new("session_max_seconds", AttributeType::Number)
                .computed()
                .build(),
            AttributeBuilder::new("session_connection_limit", AttributeType::Number)
                .computed()
                .build(),
            AttributeBuilder::new("address", AttributeType::String)
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
        let target = lookup.find(client.targets()).await?;
        let default_port = target.variant()?.default_port();

        let mut state = StateWriter::new();
        state
            .string("id", Some(&target.meta.id))
            .string("name", target.meta.name.as_deref())
            .string("description", target.meta.description.as_deref())
            .string("scope_id", target.meta.scope_id.as_deref())
            .string("type", Some(&target.kind))
            .number("default_port", default_port)
            .number("session_max_seconds", target.session_max_seconds)
            .number("session_connection_limit", target.session_connection_limit)
            .string("address", target.address.as_deref());
        Ok(state.finish())
    }
}
