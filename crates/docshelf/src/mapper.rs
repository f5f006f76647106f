//! Declarative mapping between attribute maps and application types.
//!
//! A [`Mappable`] type lists its fields once in [`Mappable::mapping`]; the
//! same binding reads fields out of a document and writes them back. Keys
//! may be dotted (`"address.city"`) to reach into nested maps.
//!
//! ```
//! use docshelf::mapper::{Map, Mappable};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct User {
//!     name: String,
//!     city: Option<String>,
//! }
//!
//! impl Mappable for User {
//!     fn mapping(&mut self, map: &mut Map) {
//!         map.field("name", &mut self.name);
//!         map.field("address.city", &mut self.city);
//!     }
//! }
//!
//! let user = User { name: "Brad".into(), city: Some("Austin".into()) };
//! let attributes = user.to_attributes();
//! assert_eq!(attributes["address"]["city"], "Austin");
//! assert_eq!(User::from_attributes(&attributes), user);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use docshelf_core::{Attributes, Document, Query, Value};

use crate::error::Result;
use crate::handle::Documents;

/// A type with a declared field mapping.
pub trait Mappable: Default + Clone {
    /// Bind each field to its key.
    fn mapping(&mut self, map: &mut Map);

    /// Build a value from an attribute map. Missing or mistyped fields keep
    /// their default.
    fn from_attributes(attributes: &Attributes) -> Self {
        let mut value = Self::default();
        let mut map = Map::reading(attributes);
        value.mapping(&mut map);
        value
    }

    /// The attribute map this value maps to.
    fn to_attributes(&self) -> Attributes {
        let mut map = Map::writing();
        // The mapping takes `&mut self`; write from a copy.
        self.clone().mapping(&mut map);
        map.into_attributes()
    }

    fn to_document(&self, id: impl Into<String>) -> Document {
        Document::with_attributes(id, self.to_attributes())
    }
}

/// Direction-aware field binder passed to [`Mappable::mapping`].
pub struct Map {
    source: Option<Attributes>,
    target: Attributes,
}

impl Map {
    fn reading(attributes: &Attributes) -> Self {
        Self {
            source: Some(attributes.clone()),
            target: Attributes::new(),
        }
    }

    fn writing() -> Self {
        Self {
            source: None,
            target: Attributes::new(),
        }
    }

    /// Whether the mapping is filling a value from attributes.
    pub fn is_reading(&self) -> bool {
        self.source.is_some()
    }

    /// Bind `value` to `key`.
    pub fn field<T>(&mut self, key: &str, value: &mut T) -> &mut Self
    where
        T: Serialize + DeserializeOwned,
    {
        match &self.source {
            Some(source) => {
                let found = lookup(source, key).cloned();
                if let Some(decoded) = found.and_then(|raw| serde_json::from_value(raw).ok()) {
                    *value = decoded;
                }
            }
            None => match serde_json::to_value(&*value) {
                Ok(encoded) => insert(&mut self.target, key, encoded),
                Err(e) => tracing::warn!(key, error = %e, "field does not serialize; omitted"),
            },
        }
        self
    }

    fn into_attributes(self) -> Attributes {
        self.target
    }
}

fn lookup<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = attributes.get(segments.next()?)?;
    segments.try_fold(first, |current, segment| current.as_object()?.get(segment))
}

fn insert(attributes: &mut Attributes, key: &str, value: Value) {
    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = attributes;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Attributes::new()));
        if !slot.is_object() {
            *slot = Value::Object(Attributes::new());
        }
        current = match slot {
            Value::Object(nested) => nested,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}

/// Map every document that has attributes. Documents without attributes
/// are left out.
pub fn map_documents<T, I>(documents: I) -> Vec<T>
where
    T: Mappable,
    I: IntoIterator<Item = Document>,
{
    documents
        .into_iter()
        .filter_map(|document| document.attributes.as_ref().map(T::from_attributes))
        .collect()
}

/// Mapped fetch and save operations for any handle.
pub trait MapExt: Documents {
    /// Fetch one document and map it. `Ok(None)` when absent or attribute-less.
    fn fetch_mapped<T: Mappable>(&self, id: &str) -> Result<Option<T>> {
        Ok(self
            .fetch(id)?
            .and_then(|document| document.attributes.as_ref().map(T::from_attributes)))
    }

    /// Fetch every match and map it.
    fn fetch_all_mapped<T, Q>(&self, query: Q) -> Result<Vec<T>>
    where
        T: Mappable,
        Q: Into<Query>,
    {
        Ok(map_documents(self.fetch_all(query)?))
    }

    /// Save `value` under `id` through its mapping.
    fn save_mapped<T: Mappable>(&self, id: &str, value: &T) -> Result<()> {
        self.save(value.to_document(id))
    }
}

impl<D: Documents + ?Sized> MapExt for D {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use docshelf_core::{attr, json};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct User {
        name: String,
        last_name: String,
        age: Option<u32>,
        city: String,
    }

    impl Mappable for User {
        fn mapping(&mut self, map: &mut Map) {
            map.field("name", &mut self.name)
                .field("last_name", &mut self.last_name)
                .field("age", &mut self.age)
                .field("address.city", &mut self.city);
        }
    }

    fn attributes(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reading_keeps_defaults() {
        let user = User::from_attributes(&attributes(json!({
            "name": "Brad",
            "age": "not a number",
            "address": {"city": "Austin"}
        })));
        assert_eq!(user.name, "Brad");
        assert_eq!(user.last_name, "");
        assert_eq!(user.age, None);
        assert_eq!(user.city, "Austin");
    }

    #[test]
    fn test_writing_nests_dotted_keys() {
        let user = User {
            name: "Brad".into(),
            last_name: "Depp".into(),
            age: Some(40),
            city: "Austin".into(),
        };
        assert_eq!(
            Value::Object(user.to_attributes()),
            json!({
                "name": "Brad",
                "last_name": "Depp",
                "age": 40,
                "address": {"city": "Austin"}
            })
        );
        assert_eq!(User::from_attributes(&user.to_attributes()), user);
    }

    #[test]
    fn test_map_documents_drops_bare_documents() {
        let users: Vec<User> = map_documents([
            Document::with_attributes("1", attributes(json!({"name": "Brad"}))),
            Document::new("2"),
        ]);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Brad");
    }

    #[test]
    fn test_mapped_handle_operations() {
        let db = Database::open_in_memory("people").unwrap();
        let users = db.collection("users");
        let brad = User {
            name: "Brad".into(),
            last_name: "Depp".into(),
            ..User::default()
        };

        users.save_mapped("1", &brad).unwrap();
        assert_eq!(users.fetch_mapped::<User>("1").unwrap(), Some(brad.clone()));
        assert_eq!(users.fetch_mapped::<User>("2").unwrap(), None);

        let found: Vec<User> = users.fetch_all_mapped(attr("last_name").eq("Depp")).unwrap();
        assert_eq!(found, vec![brad]);
    }
}
