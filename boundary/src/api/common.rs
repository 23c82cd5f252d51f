//! Common types and utilities for the Boundary API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::error::ApiError;

/// Envelope of every list call
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub status: Option<u16>,
    pub kind: Option<String>,
    pub message: Option<String>,
    pub details: Option<ApiErrorDetails>,
}

#[derive(Debug, Default, Deserialize, thiserror::Error)]
#[error("API error details: request_fields={request_fields:?}")]
pub struct ApiErrorDetails {
    #[serde(default)]
    pub request_fields: Vec<RequestField>,
}

/// A single rejected request field, e.g. `attributes.address`
#[derive(Debug, Clone, Deserialize)]
pub struct RequestField {
    pub name: String,
    pub description: String,
}

/// Fields every Boundary resource carries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemMeta {
    pub id: String,
    #[serde(default)]
    pub scope_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub updated_time: Option<String>,
    #[serde(default)]
    pub authorized_actions: Vec<String>,
}

pub trait BoundaryApiResource: DeserializeOwned + Send {
    /// Collection segment under `/v1`, e.g. `scopes`
    const COLLECTION: &'static str;

    /// Query parameter that names the parent on list calls
    const PARENT_PARAM: &'static str = "scope_id";

    fn api_path() -> String {
        format!("/v1/{}", Self::COLLECTION)
    }

    fn resource_path(id: &str) -> String {
        format!("{}/{}", Self::api_path(), urlencoding::encode(id))
    }

    /// Custom methods such as `:set-members`
    fn action_path(id: &str, action: &str) -> String {
        format!("{}:{}", Self::resource_path(id), action)
    }
}

/// Decode the `attributes` object of a typed resource into its variant enum.
/// The enums are adjacently tagged on `type`/`attributes`.
pub fn decode_attributes<V: DeserializeOwned>(kind: &str, attributes: &Value) -> Result<V, ApiError> {
    let attributes = if attributes.is_null() {
        json!({})
    } else {
        attributes.clone()
    };
    serde_json::from_value(json!({ "type": kind, "attributes": attributes })).map_err(|e| {
        ApiError::ParseError(format!("unsupported attributes for type \"{}\": {}", kind, e))
    })
}

/// Split a variant enum back into its `type` and `attributes` parts
pub fn encode_attributes<V: Serialize>(variant: &V) -> Result<(String, Value), ApiError> {
    let mut value =
        serde_json::to_value(variant).map_err(|e| ApiError::Validation(e.to_string()))?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Validation("variant has no type".to_string()))?;
    let attributes = value
        .get_mut("attributes")
        .map(Value::take)
        .unwrap_or_else(|| json!({}));
    Ok((kind, attributes))
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Body of a PATCH request.
///
/// Only changed fields are written. Clearing an optional field sends `null`;
/// an optional and computed field left unset keeps the server's value.
#[derive(Debug, Clone)]
pub struct UpdateBody {
    fields: Map<String, Value>,
    attributes: Map<String, Value>,
}

impl UpdateBody {
    pub fn new(version: u32) -> Self {
        let mut fields = Map::new();
        fields.insert("version".to_string(), json!(version));
        Self {
            fields,
            attributes: Map::new(),
        }
    }

    pub fn optional<T: Serialize + PartialEq>(
        &mut self,
        key: &str,
        prior: &Option<T>,
        planned: &Option<T>,
    ) -> &mut Self {
        if prior != planned {
            self.fields.insert(key.to_string(), json!(planned));
        }
        self
    }

    pub fn computed<T: Serialize + PartialEq>(
        &mut self,
        key: &str,
        prior: &Option<T>,
        planned: &Option<T>,
    ) -> &mut Self {
        if planned.is_some() && prior != planned {
            self.fields.insert(key.to_string(), json!(planned));
        }
        self
    }

    pub fn attribute_optional<T: Serialize + PartialEq>(
        &mut self,
        key: &str,
        prior: &Option<T>,
        planned: &Option<T>,
    ) -> &mut Self {
        if prior != planned {
            self.attributes.insert(key.to_string(), json!(planned));
        }
        self
    }

    pub fn attribute_computed<T: Serialize + PartialEq>(
        &mut self,
        key: &str,
        prior: &Option<T>,
        planned: &Option<T>,
    ) -> &mut Self {
        if planned.is_some() && prior != planned {
            self.attributes.insert(key.to_string(), json!(planned));
        }
        self
    }

    /// Write a field regardless of prior state, e.g. a rotated secret
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> &mut Self {
        self.fields.insert(key.to_string(), json!(value));
        self
    }

    pub fn set_attribute<T: Serialize>(&mut self, key: &str, value: T) -> &mut Self {
        self.attributes.insert(key.to_string(), json!(value));
        self
    }

    /// True when the body carries more than the version
    pub fn has_changes(&self) -> bool {
        self.fields.len() > 1 || !self.attributes.is_empty()
    }

    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        if !self.attributes.is_empty() {
            fields.insert("attributes".to_string(), Value::Object(self.attributes));
        }
        Value::Object(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", content = "attributes", rename_all = "lowercase")]
    enum Shape {
        Circle { radius: u32 },
        Square {},
    }

    #[test]
    fn update_body_sends_only_changes() {
        let mut body = UpdateBody::new(3);
        body.optional("name", &Some("a".to_string()), &Some("a".to_string()))
            .optional("description", &Some("old".to_string()), &None)
            .computed("primary", &Some(true), &None)
            .attribute_computed("min_password_length", &Some(8u32), &Some(12u32));

        assert!(body.has_changes());
        assert_eq!(
            body.into_value(),
            json!({
                "version": 3,
                "description": null,
                "attributes": {"min_password_length": 12}
            })
        );
    }

    #[test]
    fn update_body_without_changes() {
        let mut body = UpdateBody::new(1);
        body.optional("name", &None::<String>, &None);
        assert!(!body.has_changes());
    }

    #[test]
    fn decodes_empty_and_missing_attributes() {
        let square: Shape = decode_attributes("square", &Value::Null).unwrap();
        assert_eq!(square, Shape::Square {});

        let circle: Shape = decode_attributes("circle", &json!({"radius": 4})).unwrap();
        assert_eq!(circle, Shape::Circle { radius: 4 });

        let err = decode_attributes::<Shape>("hexagon", &json!({})).unwrap_err();
        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[test]
    fn encodes_variant_parts() {
        let (kind, attributes) = encode_attributes(&Shape::Circle { radius: 2 }).unwrap();
        assert_eq!(kind, "circle");
        assert_eq!(attributes, json!({"radius": 2}));
    }

    #[test]
    fn query_string_is_encoded() {
        let params = ApiQueryParams::new()
            .add("scope_id", "o_1234567890")
            .add("filter", "\"/item/name\" == \"dev\"")
            .add_optional("recursive", None::<bool>);
        assert_eq!(
            params.to_query_string(),
            "?scope_id=o_1234567890&filter=%22%2Fitem%2Fname%22%20%3D%3D%20%22dev%22"
        );
        assert!(params.contains("filter"));
    }
}
