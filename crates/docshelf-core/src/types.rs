//! Strong type definitions for docshelf.
//!
//! Documents are an id plus an opaque attribute tree. Scopes name the
//! partition a document lives in.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Attribute payload of a document: string keys to arbitrary JSON values.
pub type Attributes = Map<String, Value>;

/// Persisted name of the database-level partition.
pub const DEFAULT_COLLECTION: &str = "_default";

/// Maximum length of a collection name.
pub const MAX_COLLECTION_NAME_LEN: usize = 251;

/// One stored record: a stable id plus an optional attribute payload.
///
/// The wire shape is `{"id": ..., "attributes": {...}}`; `attributes` is
/// omitted when absent. Attributes are never validated against a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identity within the owning scope. Must be non-empty.
    pub id: String,
    /// Opaque payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl Document {
    /// Create a document with no attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: None,
        }
    }

    /// Create a document with the given attributes.
    pub fn with_attributes(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes: Some(attributes),
        }
    }

    /// Build a document from any serializable value.
    ///
    /// The value must serialize to a JSON object.
    pub fn from_serialize<T: Serialize + ?Sized>(id: impl Into<String>, value: &T) -> Result<Self> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self::with_attributes(id, map)),
            Ok(other) => Err(CoreError::Encoding(format!(
                "expected an object, got {}",
                kind_name(&other)
            ))),
            Err(e) => Err(CoreError::Encoding(e.to_string())),
        }
    }

    /// Look up a top-level attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.as_ref().and_then(|attrs| attrs.get(key))
    }

    /// Look up a top-level attribute as a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Check the invariants required before persisting.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(CoreError::EmptyDocumentId);
        }
        Ok(())
    }

    /// The wire-shape JSON value of this document.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        if let Some(attrs) = &self.attributes {
            map.insert("attributes".to_string(), Value::Object(attrs.clone()));
        }
        Value::Object(map)
    }

    /// Encode the wire shape as JSON text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Parse the wire shape from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Decode the attribute map into a typed value.
    ///
    /// A document without attributes decodes from an empty map.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let value = Value::Object(self.attributes.clone().unwrap_or_default());
        serde_json::from_value(value).map_err(|e| CoreError::Decoding {
            id: self.id.clone(),
            message: e.to_string(),
        })
    }
}

/// Human-readable name of a JSON value's kind.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A validated collection name.
///
/// 1 to 251 characters from `[A-Za-z0-9_%-]`, not starting with `_` or `%`.
/// Names starting with `_` are reserved for the engine.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionName(String);

impl CollectionName {
    /// Validate and wrap a collection name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason| CoreError::InvalidCollectionName {
            name: name.clone(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.len() > MAX_COLLECTION_NAME_LEN {
            return Err(invalid("name is longer than 251 characters"));
        }
        if name.starts_with('_') || name.starts_with('%') {
            return Err(invalid("name must not start with '_' or '%'"));
        }
        if !name.chars().all(is_name_char) {
            return Err(invalid("name may only contain A-Z, a-z, 0-9, '_', '-' and '%'"));
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '%')
}

impl fmt::Debug for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionName({})", self.0)
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CollectionName {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

/// The partition a handle operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The database-level partition.
    Default,
    /// A named collection inside the database.
    Collection(CollectionName),
}

impl Scope {
    /// Scope for a named collection, validating the name.
    pub fn collection(name: impl Into<String>) -> Result<Self> {
        CollectionName::new(name).map(Scope::Collection)
    }

    /// The persisted partition name.
    pub fn name(&self) -> &str {
        match self {
            Scope::Default => DEFAULT_COLLECTION,
            Scope::Collection(name) => name.as_str(),
        }
    }

    /// Whether this is the database-level partition.
    pub fn is_default(&self) -> bool {
        matches!(self, Scope::Default)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brad() -> Document {
        let attrs = json!({"name": "Brad", "last_name": "Depp"});
        Document::with_attributes("1", attrs.as_object().unwrap().clone())
    }

    #[test]
    fn test_wire_shape() {
        let doc = brad();
        let value = doc.to_value();
        assert_eq!(value["id"], "1");
        assert_eq!(value["attributes"]["name"], "Brad");

        let parsed = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_missing_attributes_are_omitted() {
        let doc = Document::new("bare");
        assert_eq!(doc.to_json().unwrap(), r#"{"id":"bare"}"#);
        assert_eq!(doc.to_value(), json!({"id": "bare"}));
    }

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(Document::new("").validate(), Err(CoreError::EmptyDocumentId));
        assert!(brad().validate().is_ok());
    }

    #[test]
    fn test_from_serialize_requires_object() {
        #[derive(Serialize)]
        struct User<'a> {
            name: &'a str,
        }

        let doc = Document::from_serialize("u", &User { name: "Brad" }).unwrap();
        assert_eq!(doc.get_str("name"), Some("Brad"));

        let err = Document::from_serialize("n", &42).unwrap_err();
        assert!(matches!(err, CoreError::Encoding(_)));
    }

    #[test]
    fn test_decode_reports_document_id() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Named {
            name: String,
            age: u32,
        }

        let err = brad().decode::<Named>().unwrap_err();
        assert!(matches!(err, CoreError::Decoding { ref id, .. } if id == "1"));
    }

    #[test]
    fn test_collection_name_rules() {
        assert!(CollectionName::new("users").is_ok());
        assert!(CollectionName::new("user-profiles_2%").is_ok());
        assert!(CollectionName::new("").is_err());
        assert!(CollectionName::new("_default").is_err());
        assert!(CollectionName::new("%x").is_err());
        assert!(CollectionName::new("has space").is_err());
        assert!(CollectionName::new("a".repeat(252)).is_err());
        assert!(CollectionName::new("a".repeat(251)).is_ok());
    }

    #[test]
    fn test_scope_names() {
        assert_eq!(Scope::Default.name(), DEFAULT_COLLECTION);
        assert_eq!(Scope::collection("users").unwrap().name(), "users");
        assert!(Scope::collection("bad name").is_err());
    }
}
