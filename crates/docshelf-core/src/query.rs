//! Query expressions: filters, orderings and index specifications.
//!
//! These values only describe a query. Engines translate them into their own
//! execution (SQL for SQLite, direct evaluation for the in-memory store).
//!
//! Paths address the document wire shape, so `"id"` is the document id and
//! `"attributes.name"` is the `name` attribute. [`attr`] is a shorthand for
//! the latter.
//!
//! ```
//! use docshelf_core::query::{attr, Query};
//!
//! let query = Query::matching(attr("name").glob("Br*")).order_by(attr("name").asc());
//! assert!(query.validate().is_ok());
//! ```

use std::ops::Not;

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::types::{is_name_char, MAX_COLLECTION_NAME_LEN};

/// A dot-separated path into the document wire shape.
///
/// Every `.` separates segments and there is no escape, so an attribute key
/// that itself contains `.` (`{"a.b": 1}`) is stored and fetched by id
/// intact but cannot be addressed by a filter, ordering or index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Wrap a path. Validation is deferred to [`FieldPath::segments`].
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The raw path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the path into validated segments.
    pub fn segments(&self) -> Result<Vec<&str>> {
        let invalid = |reason| CoreError::InvalidPath {
            path: self.0.clone(),
            reason,
        };

        if self.0.is_empty() {
            return Err(invalid("path is empty"));
        }
        self.0
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    Err(invalid("path contains an empty segment"))
                } else if segment
                    .chars()
                    .any(|c| matches!(c, '"' | '\'' | '[' | ']' | '\\' | '$') || c.is_control())
                {
                    Err(invalid("path segments must not contain quotes, brackets, '$' or '\\'"))
                } else {
                    Ok(segment)
                }
            })
            .collect()
    }

    /// Resolve the path against a wire-shape value.
    ///
    /// Returns `None` when any segment is missing or crosses a non-object.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0
            .split('.')
            .try_fold(root, |current, segment| current.as_object()?.get(segment))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Comparison operator for [`Expression::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A filter predicate over documents.
///
/// Operands only compare within the same kind of value (null, bool, number,
/// text, array, object). A missing field matches nothing except the negation
/// of [`Expression::Exists`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `path <op> value`. `Ne` matches present, non-null values that differ.
    Compare {
        path: FieldPath,
        op: CompareOp,
        value: Value,
    },
    /// `path` equals one of `values`.
    In { path: FieldPath, values: Vec<Value> },
    /// SQL `LIKE` over text: `%` any run, `_` one character, ASCII case-insensitive.
    Like { path: FieldPath, pattern: String },
    /// Shell-style match over text: `*`, `?` and `[...]` classes, case-sensitive.
    Glob { path: FieldPath, pattern: String },
    /// The field is present and not null.
    Exists(FieldPath),
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    /// Both `self` and `other` must hold.
    pub fn and(self, other: Expression) -> Expression {
        match self {
            Expression::And(mut terms) => {
                terms.push(other);
                Expression::And(terms)
            }
            first => Expression::And(vec![first, other]),
        }
    }

    /// Either `self` or `other` must hold.
    pub fn or(self, other: Expression) -> Expression {
        match self {
            Expression::Or(mut terms) => {
                terms.push(other);
                Expression::Or(terms)
            }
            first => Expression::Or(vec![first, other]),
        }
    }

    /// Validate every path in the expression.
    pub fn validate(&self) -> Result<()> {
        match self {
            Expression::Compare { path, .. }
            | Expression::In { path, .. }
            | Expression::Like { path, .. }
            | Expression::Glob { path, .. }
            | Expression::Exists(path) => path.segments().map(|_| ()),
            Expression::And(terms) | Expression::Or(terms) => {
                terms.iter().try_for_each(Expression::validate)
            }
            Expression::Not(inner) => inner.validate(),
        }
    }
}

impl Not for Expression {
    type Output = Expression;

    fn not(self) -> Expression {
        match self {
            Expression::Not(inner) => *inner,
            other => Expression::Not(Box::new(other)),
        }
    }
}

/// Start a filter or ordering on a wire-shape path.
pub fn field(path: impl Into<String>) -> FieldFilter {
    FieldFilter {
        path: FieldPath::new(path),
    }
}

/// Start a filter or ordering on a top-level attribute.
pub fn attr(key: &str) -> FieldFilter {
    field(format!("attributes.{key}"))
}

/// Fluent builder bound to one path.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    path: FieldPath,
}

impl FieldFilter {
    fn compare(self, op: CompareOp, value: Value) -> Expression {
        Expression::Compare {
            path: self.path,
            op,
            value,
        }
    }

    pub fn eq<T: Into<Value>>(self, value: T) -> Expression {
        self.compare(CompareOp::Eq, value.into())
    }

    pub fn ne<T: Into<Value>>(self, value: T) -> Expression {
        self.compare(CompareOp::Ne, value.into())
    }

    pub fn gt<T: Into<Value>>(self, value: T) -> Expression {
        self.compare(CompareOp::Gt, value.into())
    }

    pub fn gte<T: Into<Value>>(self, value: T) -> Expression {
        self.compare(CompareOp::Gte, value.into())
    }

    pub fn lt<T: Into<Value>>(self, value: T) -> Expression {
        self.compare(CompareOp::Lt, value.into())
    }

    pub fn lte<T: Into<Value>>(self, value: T) -> Expression {
        self.compare(CompareOp::Lte, value.into())
    }

    /// Matches when the field equals any of `values`. An empty list matches nothing.
    pub fn is_in<I, T>(self, values: I) -> Expression
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Expression::In {
            path: self.path,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn like(self, pattern: impl Into<String>) -> Expression {
        Expression::Like {
            path: self.path,
            pattern: pattern.into(),
        }
    }

    pub fn glob(self, pattern: impl Into<String>) -> Expression {
        Expression::Glob {
            path: self.path,
            pattern: pattern.into(),
        }
    }

    pub fn exists(self) -> Expression {
        Expression::Exists(self.path)
    }

    pub fn not_exists(self) -> Expression {
        !Expression::Exists(self.path)
    }

    pub fn asc(self) -> Ordering {
        Ordering::asc(self.path)
    }

    pub fn desc(self) -> Ordering {
        Ordering::desc(self.path)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub path: FieldPath,
    pub direction: Direction,
}

impl Ordering {
    pub fn asc(path: impl Into<FieldPath>) -> Self {
        Self {
            path: path.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(path: impl Into<FieldPath>) -> Self {
        Self {
            path: path.into(),
            direction: Direction::Descending,
        }
    }
}

/// A select-all query over one scope.
///
/// Orderings apply whether or not a filter is present. Engines break ties
/// by ascending document id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Expression>,
    pub order_by: Vec<Ordering>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Query {
    /// Every document in the scope.
    pub fn all() -> Self {
        Self::default()
    }

    /// Documents matching `filter`.
    pub fn matching(filter: Expression) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Replace the filter.
    pub fn with_filter(mut self, filter: Option<Expression>) -> Self {
        self.filter = filter;
        self
    }

    /// Append a sort criterion.
    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.order_by.push(ordering);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Validate every path in the filter and orderings.
    pub fn validate(&self) -> Result<()> {
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        self.order_by
            .iter()
            .try_for_each(|ordering| ordering.path.segments().map(|_| ()))
    }
}

impl From<Expression> for Query {
    fn from(filter: Expression) -> Self {
        Query::matching(filter)
    }
}

/// A value index over one or more paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    paths: Vec<FieldPath>,
}

impl IndexSpec {
    /// Index the given paths, in order.
    pub fn value<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    /// Check the paths and the index name.
    pub fn validate(&self, name: &str) -> Result<()> {
        validate_index_name(name)?;
        if self.paths.is_empty() {
            return Err(CoreError::EmptyIndex);
        }
        self.paths
            .iter()
            .try_for_each(|path| path.segments().map(|_| ()))
    }
}

/// Index names follow the collection-name character rules.
pub fn validate_index_name(name: &str) -> Result<()> {
    let invalid = |reason| CoreError::InvalidIndexName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(invalid("name is longer than 251 characters"));
    }
    if name.starts_with('_') {
        return Err(invalid("name must not start with '_'"));
    }
    if !name.chars().all(is_name_char) {
        return Err(invalid("name may only contain A-Z, a-z, 0-9, '_', '-' and '%'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_segments() {
        assert_eq!(
            FieldPath::new("attributes.name").segments().unwrap(),
            vec!["attributes", "name"]
        );
        assert!(FieldPath::new("").segments().is_err());
        assert!(FieldPath::new("attributes..name").segments().is_err());
        assert!(FieldPath::new("attributes.\"name\"").segments().is_err());
        assert!(FieldPath::new("tags[0]").segments().is_err());
    }

    #[test]
    fn test_path_resolve() {
        let doc = json!({"id": "1", "attributes": {"address": {"city": "Lisbon"}, "n": 3}});
        assert_eq!(
            FieldPath::new("attributes.address.city").resolve(&doc),
            Some(&json!("Lisbon"))
        );
        assert_eq!(FieldPath::new("id").resolve(&doc), Some(&json!("1")));
        assert_eq!(FieldPath::new("attributes.n.deeper").resolve(&doc), None);
        assert_eq!(FieldPath::new("attributes.missing").resolve(&doc), None);
    }

    #[test]
    fn test_builders() {
        let expr = attr("name").eq("Brad");
        assert_eq!(
            expr,
            Expression::Compare {
                path: FieldPath::new("attributes.name"),
                op: CompareOp::Eq,
                value: json!("Brad"),
            }
        );

        assert_eq!(
            attr("name").not_exists(),
            Expression::Not(Box::new(Expression::Exists(FieldPath::new(
                "attributes.name"
            ))))
        );
        assert_eq!(!!attr("age").exists(), attr("age").exists());
    }

    #[test]
    fn test_and_or_flatten() {
        let expr = attr("a").eq(1).and(attr("b").eq(2)).and(attr("c").eq(3));
        assert!(matches!(expr, Expression::And(ref terms) if terms.len() == 3));

        let expr = attr("a").eq(1).or(attr("b").eq(2)).or(attr("c").eq(3));
        assert!(matches!(expr, Expression::Or(ref terms) if terms.len() == 3));
    }

    #[test]
    fn test_query_validation() {
        let ok = Query::matching(attr("name").eq("Brad")).order_by(attr("name").asc());
        assert!(ok.validate().is_ok());

        let bad_filter = Query::matching(field("attributes..x").eq(1));
        assert!(matches!(bad_filter.validate(), Err(CoreError::InvalidPath { .. })));

        let bad_order = Query::all().order_by(Ordering::desc("x[1]"));
        assert!(bad_order.validate().is_err());
    }

    proptest::proptest! {
        #[test]
        fn test_valid_segments_resolve(segments in proptest::collection::vec("[a-z_][a-z0-9_-]{0,8}", 1..5)) {
            let path = FieldPath::new(segments.join("."));
            proptest::prop_assert_eq!(path.segments().unwrap(), segments.iter().map(String::as_str).collect::<Vec<_>>());

            let nested = segments
                .iter()
                .rev()
                .fold(json!("leaf"), |inner, key| json!({ key.as_str(): inner }));
            proptest::prop_assert_eq!(path.resolve(&nested), Some(&json!("leaf")));
        }
    }

    #[test]
    fn test_index_spec_validation() {
        let spec = IndexSpec::value(["attributes.name", "attributes.last_name"]);
        assert_eq!(spec.paths().len(), 2);
        assert!(spec.validate("by_name").is_ok());
        assert!(spec.validate("_hidden").is_err());
        assert!(spec.validate("bad name").is_err());
        assert_eq!(
            IndexSpec::value(Vec::<String>::new()).validate("empty"),
            Err(CoreError::EmptyIndex)
        );
    }
}
