//! Schemas for the provider, resources and data sources
//!
//! Attributes carry their own validators, plan modifiers and default, so the
//! planner in [`crate::plan`] can work from the schema alone.

use crate::types::{AttributePath, Diagnostic, DynamicValue};
use std::collections::HashMap;

/// Terraform's value types. Numbers are always `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    /// Unordered; the planner normalises element order before comparing
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    pub fn is_set(&self) -> bool {
        matches!(self, AttributeType::Set(_))
    }
}

#[derive(Debug)]
pub struct Schema {
    /// Recorded with stored state; bump it when the state layout changes
    pub version: i64,
    pub description: String,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Accepted in configuration but never persisted in state
    pub write_only: bool,
    pub validators: Vec<Box<dyn Validator>>,
    pub plan_modifiers: Vec<Box<dyn PlanModifier>>,
    pub default: Option<Box<dyn DefaultValue>>,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let describe = |items: Vec<String>| items.join(", ");
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("write_only", &self.write_only)
            .field(
                "validators",
                &describe(self.validators.iter().map(|v| v.description()).collect()),
            )
            .field(
                "plan_modifiers",
                &describe(self.plan_modifiers.iter().map(|m| m.description()).collect()),
            )
            .field("default", &self.default.as_ref().map(|d| d.description()))
            .finish()
    }
}

/// Checks a configured value. Only called for known, non-null values.
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse;
}

pub struct ValidatorRequest {
    pub config_value: DynamicValue,
    pub path: AttributePath,
}

#[derive(Default)]
pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Adjusts one attribute's planned value, or flags it as forcing replacement
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;
    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse;
}

pub struct PlanModifierRequest {
    pub config_value: DynamicValue,
    /// Null on create
    pub state_value: DynamicValue,
    pub plan_value: DynamicValue,
    pub path: AttributePath,
}

pub struct PlanModifierResponse {
    pub plan_value: DynamicValue,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Value planned for an optional attribute left out of configuration
pub trait DefaultValue: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: DynamicValue,
}

pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, r#type: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                write_only: false,
                validators: vec![],
                plan_modifiers: vec![],
                default: None,
            },
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.attribute.description = description.to_string();
        self
    }

    /// Clears `optional`
    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    /// Clears `required`
    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    /// Secrets that are sent to the remote system but never stored in state.
    /// Implies sensitive.
    pub fn write_only(mut self) -> Self {
        self.attribute.write_only = true;
        self.attribute.sensitive = true;
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(validator);
        self
    }

    pub fn plan_modifier(mut self, modifier: Box<dyn PlanModifier>) -> Self {
        self.attribute.plan_modifiers.push(modifier);
        self
    }

    pub fn default(mut self, default: Box<dyn DefaultValue>) -> Self {
        self.attribute.default = Some(default);
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

#[derive(Default)]
pub struct SchemaBuilder {
    version: i64,
    description: String,
    attributes: Vec<Attribute>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            version: self.version,
            description: self.description,
            attributes: self.attributes,
        }
    }
}
