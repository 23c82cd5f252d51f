//! Values, attribute paths and diagnostics
//!
//! Configuration, plans and state are all [`DynamicValue`]s: untyped trees
//! checked against a schema at the edges. Stored state is msgpack encoded.

use crate::error::{Result, TfplugError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One Terraform value. Objects and maps share the `Map` representation;
/// lists and sets share `List`.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Dynamic>),
    Map(HashMap<String, Dynamic>),
    /// Only ever present in plans
    Unknown,
}

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    /// True when the value is fully known, recursively
    pub fn is_wholly_known(&self) -> bool {
        match self {
            Dynamic::Unknown => false,
            Dynamic::List(items) => items.iter().all(Dynamic::is_wholly_known),
            Dynamic::Map(map) => map.values().all(Dynamic::is_wholly_known),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(value)
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Number(value as f64)
    }
}

impl<T: Into<Dynamic>> From<Vec<T>> for Dynamic {
    fn from(values: Vec<T>) -> Self {
        Dynamic::List(values.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serializer.serialize_f64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(l) => l.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
            Dynamic::Unknown => serializer.serialize_str("__unknown__"),
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct DynamicVisitor;

        impl<'de> Visitor<'de> for DynamicVisitor {
            type Value = Dynamic;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a valid Dynamic value")
            }

            fn visit_unit<E>(self) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Null)
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                if value == "__unknown__" {
                    Ok(Dynamic::Unknown)
                } else {
                    Ok(Dynamic::String(value.to_string()))
                }
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                if value == "__unknown__" {
                    Ok(Dynamic::Unknown)
                } else {
                    Ok(Dynamic::String(value))
                }
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Dynamic::List(vec))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut hashmap = HashMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    hashmap.insert(key, value);
                }
                Ok(Dynamic::Map(hashmap))
            }
        }

        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// A root value with path-based typed access
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::Unknown,
        }
    }

    /// Empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    /// Build an object from `(attribute, value)` pairs
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Dynamic)>,
    {
        Self {
            value: Dynamic::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Null encodes to an empty buffer
    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        match &self.value {
            Dynamic::Null => Ok(vec![]),
            Dynamic::Map(map) => rmp_serde::encode::to_vec(map)
                .map_err(|e| TfplugError::EncodingError(format!("msgpack encoding failed: {}", e))),
            _ => rmp_serde::encode::to_vec(&self.value)
                .map_err(|e| TfplugError::EncodingError(format!("msgpack encoding failed: {}", e))),
        }
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }

        // Objects are by far the most common payload
        match rmp_serde::decode::from_slice::<HashMap<String, Dynamic>>(data) {
            Ok(map) => Ok(Self {
                value: Dynamic::Map(map),
            }),
            Err(_) => rmp_serde::decode::from_slice::<Dynamic>(data)
                .map(Self::new)
                .map_err(|e| TfplugError::DecodingError(format!("msgpack decoding failed: {}", e))),
        }
    }

    /// Required accessors fail when the path is missing or mistyped
    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::String(s) => Ok(s.clone()),
            _ => Err(type_mismatch("string", value)),
        }
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::Number(n) => Ok(*n),
            _ => Err(type_mismatch("number", value)),
        }
    }

    /// Numbers that must be whole, e.g. ports and counters
    pub fn get_int(&self, path: &AttributePath) -> Result<i64> {
        let n = self.get_number(path)?;
        as_whole_number(n)
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::List(l) => Ok(l.clone()),
            _ => Err(type_mismatch("list", value)),
        }
    }

    /// Optional accessors treat a missing attribute, null and unknown alike:
    /// all three mean "not set". A value of the wrong type is still an error.
    pub fn get_optional_string(&self, path: &AttributePath) -> Result<Option<String>> {
        match self.lookup(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_mismatch("string", other)),
        }
    }

    pub fn get_optional_bool(&self, path: &AttributePath) -> Result<Option<bool>> {
        match self.lookup(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(type_mismatch("bool", other)),
        }
    }

    pub fn get_optional_int(&self, path: &AttributePath) -> Result<Option<i64>> {
        match self.lookup(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::Number(n)) => as_whole_number(*n).map(Some),
            Some(other) => Err(type_mismatch("number", other)),
        }
    }

    /// Lists and sets of strings; unknown elements are skipped
    pub fn get_optional_strings(&self, path: &AttributePath) -> Result<Option<Vec<String>>> {
        match self.lookup(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::List(items)) => items
                .iter()
                .filter(|item| !item.is_unknown())
                .map(|item| match item {
                    Dynamic::String(s) => Ok(s.clone()),
                    other => Err(type_mismatch("string", other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(other) => Err(type_mismatch("list", other)),
        }
    }

    pub fn get_optional_string_map(
        &self,
        path: &AttributePath,
    ) -> Result<Option<HashMap<String, String>>> {
        match self.lookup(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(Dynamic::Map(entries)) => entries
                .iter()
                .map(|(k, v)| match v {
                    Dynamic::String(s) => Ok((k.clone(), s.clone())),
                    other => Err(type_mismatch("string", other)),
                })
                .collect::<Result<HashMap<_, _>>>()
                .map(Some),
            Some(other) => Err(type_mismatch("map", other)),
        }
    }

    /// Raw access without type checks; `None` when the path does not resolve
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        self.lookup(path)
    }

    /// Setters create intermediate objects as needed
    pub fn set_string(&mut self, path: &AttributePath, value: String) -> Result<()> {
        self.set_value(path, Dynamic::String(value))
    }

    pub fn set(&mut self, path: &AttributePath, value: Dynamic) -> Result<()> {
        self.set_value(path, value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.value, Dynamic::Unknown)
    }

    fn lookup(&self, path: &AttributePath) -> Option<&Dynamic> {
        let mut current = &self.value;

        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m.get(name)?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    l.get(usize::try_from(*idx).ok()?)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    fn navigate_path<'a>(&'a self, path: &AttributePath) -> Result<&'a Dynamic> {
        self.lookup(path)
            .ok_or_else(|| TfplugError::AttributeNotFound(path.to_string()))
    }

    fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        if !path.steps.is_empty() && !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }
        place(&mut self.value, &path.steps, new_value)
            .map_err(|detail| TfplugError::InvalidPath(format!("{}: {}", path, detail)))
    }
}

/// Write `new_value` at `steps` below `slot`. Missing object members are
/// created on the way down; list elements must already exist.
fn place(
    slot: &mut Dynamic,
    steps: &[AttributePathStep],
    new_value: Dynamic,
) -> std::result::Result<(), String> {
    let Some((step, rest)) = steps.split_first() else {
        *slot = new_value;
        return Ok(());
    };

    let next = match (slot, step) {
        (Dynamic::Map(members), AttributePathStep::AttributeName(name))
        | (Dynamic::Map(members), AttributePathStep::ElementKeyString(name)) => {
            members.entry(name.clone()).or_insert_with(|| match rest.first() {
                Some(AttributePathStep::ElementKeyInt(_)) => Dynamic::List(vec![]),
                _ => Dynamic::Map(HashMap::new()),
            })
        }
        (Dynamic::List(items), AttributePathStep::ElementKeyInt(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get_mut(i))
            .ok_or_else(|| format!("list index {} out of bounds", i))?,
        (other, _) => return Err(format!("cannot descend into {}", other.type_name())),
    };
    place(next, rest, new_value)
}

fn type_mismatch(expected: &str, actual: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

fn as_whole_number(n: f64) -> Result<i64> {
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(TfplugError::TypeMismatch {
            expected: "whole number".to_string(),
            actual: n.to_string(),
        });
    }
    Ok(n as i64)
}

/// AttributePath represents a path to an attribute within a DynamicValue
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[{:?}]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Individual step in an AttributePath
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributePathStep {
    /// Access attribute by name in object/map
    AttributeName(String),
    /// Access element by string key (for maps)
    ElementKeyString(String),
    /// Access element by integer index (for lists)
    ElementKeyInt(i64),
}

/// Diagnostic represents a warning or error from the provider
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(path) => write!(f, "{}: {} ({})", path, self.summary, self.detail),
            None => write!(f, "{} ({})", self.summary, self.detail),
        }
    }
}

/// True when any diagnostic is an error
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Invalid,
    Error,
    Warning,
}
