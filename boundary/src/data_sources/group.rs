//! data.boundary_group

use async_trait::async_trait;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{lookup_attributes, BoundaryDataSource, Lookup};
use crate::api::{ApiError, Client};
use crate::resources::StateWriter;
use crate::validators::BoundaryIdValidator;

#[derive(Default)]
pub struct GroupDataSource;

#[async_trait]
impl BoundaryDataSource for GroupDataSource {
    const TYPE_NAME: &'static str = "boundary_group";
    const DESCRIPTION: &'static str = "Look up a group and its members";

    fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = lookup_attributes(
            "scope_id",
            BoundaryIdValidator::new(&["o", "p"]).or_literal("global"),
        );
        attributes.push(
            AttributeBuilder::new("member_ids", AttributeType::Set(Box::new(AttributeType::String)))
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
        let group = lookup.find(client.groups()).await?;

        let mut state = StateWriter::new();
        state
            .string("id", Some(&group.meta.id))
            .string("name", group.meta.name.as_deref())
            .string("description", group.meta.description.as_deref())
            .string("scope_id", group.meta.scope_id.as_deref())
            .strings("member_ids", &group.member_ids);
        Ok(state.finish())
    }
}
