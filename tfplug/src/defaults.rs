//! Default value providers for attributes
//!
//! Defaults are evaluated during planning when an optional attribute is absent
//! from configuration. An explicit value always wins.
//!
//! ```no_run
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//! use tfplug::defaults::StaticDefault;
//!
//! let port = AttributeBuilder::new("default_port", AttributeType::Number)
//!     .optional()
//!     .computed()
//!     .default(StaticDefault::number(22.0))
//!     .build();
//! ```

use crate::schema::{DefaultRequest, DefaultResponse, DefaultValue};
use crate::types::{Dynamic, DynamicValue};

/// StaticDefault provides a static default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn DefaultValue> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn DefaultValue> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn DefaultValue> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn DefaultValue> {
        Self::create(Dynamic::Bool(value))
    }
}

impl DefaultValue for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: DynamicValue::new(self.value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    #[test]
    fn static_default_string() {
        let default = StaticDefault::string("global");
        let response = default.default_value(DefaultRequest {
            path: AttributePath::new("scope_id"),
        });
        assert_eq!(response.value.value, Dynamic::String("global".to_string()));
    }

    #[test]
    fn static_default_bool() {
        let default = StaticDefault::bool(false);
        let response = default.default_value(DefaultRequest {
            path: AttributePath::new("is_primary_for_scope"),
        });
        assert_eq!(response.value.value, Dynamic::Bool(false));
        assert!(default.description().contains("Bool(false)"));
    }
}
