//! Proptest generators for property-based testing.
//!
//! Values are drawn from small alphabets and a fixed set of keys so that
//! generated filters actually hit generated documents.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::{Map, Value};

use docshelf_core::{
    Attributes, CollectionName, CompareOp, Direction, Document, Expression, FieldPath, Ordering,
    Query,
};

/// Attribute keys used by generated documents.
pub const KEYS: &[&str] = &["name", "last_name", "age", "tags", "address"];

/// Paths used by generated filters and orderings.
pub const PATHS: &[&str] = &[
    "id",
    "attributes.name",
    "attributes.last_name",
    "attributes.age",
    "attributes.tags",
    "attributes.address",
    "attributes.address.city",
    "attributes.missing",
];

/// Short ASCII text, including characters that are wildcards in patterns.
pub fn text() -> impl Strategy<Value = String> {
    "[a-cA-C%_ ]{0,4}"
}

/// A scalar JSON value: null, bool, small integer, finite float or text.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(Value::from),
        (-50.0f64..50.0).prop_map(|f| Value::from((f * 4.0).round() / 4.0)),
        text().prop_map(Value::String),
    ]
}

/// Any attribute value: scalars, arrays of integers and text, small objects.
pub fn attribute_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => scalar(),
        1 => prop::collection::vec(
            prop_oneof![(-5i64..5).prop_map(Value::from), text().prop_map(Value::String)],
            0..3
        )
        .prop_map(Value::Array),
        1 => prop::option::of(text()).prop_map(|city| {
            let mut object = Map::new();
            if let Some(city) = city {
                object.insert("city".to_string(), Value::String(city));
            }
            Value::Object(object)
        }),
    ]
}

/// An attribute map over a subset of [`KEYS`].
pub fn attributes() -> impl Strategy<Value = Attributes> {
    prop::collection::vec((prop::sample::select(KEYS), attribute_value()), 0..5).prop_map(
        |entries| {
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect()
        },
    )
}

/// A document id.
pub fn document_id() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,4}"
}

/// A document, sometimes without attributes.
pub fn document() -> impl Strategy<Value = Document> {
    (document_id(), prop::option::weighted(0.9, attributes())).prop_map(|(id, attributes)| {
        Document {
            id,
            attributes,
        }
    })
}

/// Up to `max` documents with distinct ids.
pub fn documents(max: usize) -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(document(), 0..=max).prop_map(|docs| {
        docs.into_iter()
            .map(|doc| (doc.id.clone(), doc))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect()
    })
}

/// A valid collection name.
pub fn collection_name() -> impl Strategy<Value = CollectionName> {
    "[A-Za-z0-9-][A-Za-z0-9_%-]{0,15}".prop_map(|name| {
        CollectionName::new(name).expect("generated name is valid")
    })
}

/// A path from [`PATHS`].
pub fn field_path() -> impl Strategy<Value = FieldPath> {
    prop::sample::select(PATHS).prop_map(FieldPath::new)
}

fn compare_op() -> impl Strategy<Value = CompareOp> {
    prop_oneof![
        Just(CompareOp::Eq),
        Just(CompareOp::Ne),
        Just(CompareOp::Gt),
        Just(CompareOp::Gte),
        Just(CompareOp::Lt),
        Just(CompareOp::Lte),
    ]
}

/// A `LIKE` pattern.
pub fn like_pattern() -> impl Strategy<Value = String> {
    "[abAB%_]{0,4}"
}

/// A `GLOB` pattern, including character classes.
pub fn glob_pattern() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("*".to_string()),
            Just("?".to_string()),
            Just("[ab]".to_string()),
            Just("[^a]".to_string()),
            Just("[a-c]".to_string()),
            "[abcABC ]".prop_map(String::from),
        ],
        0..4,
    )
    .prop_map(|parts| parts.concat())
}

/// A leaf predicate.
pub fn predicate() -> impl Strategy<Value = Expression> {
    prop_oneof![
        (field_path(), compare_op(), scalar()).prop_map(|(path, op, value)| {
            Expression::Compare { path, op, value }
        }),
        (field_path(), prop::collection::vec(scalar(), 0..3))
            .prop_map(|(path, values)| Expression::In { path, values }),
        (field_path(), like_pattern()).prop_map(|(path, pattern)| Expression::Like { path, pattern }),
        (field_path(), glob_pattern()).prop_map(|(path, pattern)| Expression::Glob { path, pattern }),
        field_path().prop_map(Expression::Exists),
    ]
}

/// A filter expression: predicates combined with `and`, `or` and `not`.
pub fn expression() -> impl Strategy<Value = Expression> {
    predicate().prop_recursive(3, 12, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Expression::And),
            prop::collection::vec(inner.clone(), 0..3).prop_map(Expression::Or),
            inner.prop_map(|e| Expression::Not(Box::new(e))),
        ]
    })
}

/// An ordering over one of [`PATHS`].
pub fn ordering() -> impl Strategy<Value = Ordering> {
    (field_path(), any::<bool>()).prop_map(|(path, ascending)| Ordering {
        path,
        direction: if ascending {
            Direction::Ascending
        } else {
            Direction::Descending
        },
    })
}

/// A full query: optional filter, up to two orderings, optional paging.
pub fn query() -> impl Strategy<Value = Query> {
    (
        prop::option::of(expression()),
        prop::collection::vec(ordering(), 0..3),
        prop::option::of(0usize..8),
        0usize..4,
    )
        .prop_map(|(filter, order_by, limit, offset)| Query {
            filter,
            order_by,
            limit,
            offset,
        })
}
