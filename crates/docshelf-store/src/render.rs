//! Rendering query expressions to SQLite SQL.
//!
//! Documents live as JSON text in `documents.body`, so every field access is a
//! `json_extract`/`json_type` over a literal JSON path. Paths are rendered as
//! literals (never bound) so the expressions match those of value indexes.
//! Segment validation in [`FieldPath::segments`] rules out quotes, which keeps
//! the literals well-formed.
//!
//! Each leaf predicate is wrapped in `COALESCE(.., 0)` so that SQL's three-valued
//! logic never leaks out: `NOT` of a leaf that could not match is true.

use docshelf_core::{CompareOp, Direction, Expression, FieldPath, IndexSpec, Query, Value};
use rusqlite::types::Value as SqlValue;

use crate::error::Result;

/// A SQL fragment plus its positional parameters, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Render `path` as a quoted SQLite JSON path literal, e.g. `'$."attributes"."name"'`.
pub fn json_path(path: &FieldPath) -> Result<String> {
    let mut rendered = String::from("'$");
    for segment in path.segments()? {
        rendered.push_str(".\"");
        rendered.push_str(segment);
        rendered.push('"');
    }
    rendered.push('\'');
    Ok(rendered)
}

/// `json_extract(body, <path>)`.
pub fn extract(path: &FieldPath) -> Result<String> {
    Ok(format!("json_extract(body, {})", json_path(path)?))
}

/// Render a filter expression into a boolean SQL fragment.
pub fn render_filter(expr: &Expression, params: &mut Vec<SqlValue>) -> Result<String> {
    match expr {
        Expression::Compare { path, op, value } => {
            let leaf = Leaf::new(path)?;
            Ok(coalesce(leaf.compare(*op, value, params)))
        }
        Expression::In { path, values } => {
            if values.is_empty() {
                return Ok("0".to_string());
            }
            let leaf = Leaf::new(path)?;
            let terms: Vec<String> = values.iter().map(|value| leaf.eq(value, params)).collect();
            Ok(coalesce(terms.join(" OR ")))
        }
        Expression::Like { path, pattern } => {
            let leaf = Leaf::new(path)?;
            params.push(SqlValue::Text(pattern.clone()));
            Ok(coalesce(format!("{} = 'text' AND {} LIKE ?", leaf.kind, leaf.value)))
        }
        Expression::Glob { path, pattern } => {
            let leaf = Leaf::new(path)?;
            params.push(SqlValue::Text(pattern.clone()));
            Ok(coalesce(format!("{} = 'text' AND {} GLOB ?", leaf.kind, leaf.value)))
        }
        Expression::Exists(path) => Ok(coalesce(Leaf::new(path)?.present())),
        Expression::And(terms) => join(terms, " AND ", "1", params),
        Expression::Or(terms) => join(terms, " OR ", "0", params),
        Expression::Not(inner) => Ok(format!("NOT ({})", render_filter(inner, params)?)),
    }
}

/// Render the full select for `query` against one partition.
pub fn select(collection: &str, query: &Query) -> Result<Rendered> {
    query.validate()?;

    let mut params = vec![SqlValue::Text(collection.to_string())];
    let mut sql = String::from("SELECT body FROM documents WHERE collection = ?");

    if let Some(filter) = &query.filter {
        sql.push_str(" AND ");
        sql.push_str(&render_filter(filter, &mut params)?);
    }

    sql.push_str(" ORDER BY ");
    for ordering in &query.order_by {
        let direction = match ordering.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        sql.push_str(&format!("{} {}, ", extract(&ordering.path)?, direction));
    }
    sql.push_str("id ASC LIMIT ? OFFSET ?");

    let limit = query.limit.map_or(-1, |limit| to_i64(limit));
    params.push(SqlValue::Integer(limit));
    params.push(SqlValue::Integer(to_i64(query.offset)));

    Ok(Rendered { sql, params })
}

/// Render the delete for every document in a partition matching `filter`.
pub fn delete(collection: &str, filter: Option<&Expression>) -> Result<Rendered> {
    let mut params = vec![SqlValue::Text(collection.to_string())];
    let mut sql = String::from("DELETE FROM documents WHERE collection = ?");

    if let Some(filter) = filter {
        filter.validate()?;
        sql.push_str(" AND ");
        sql.push_str(&render_filter(filter, &mut params)?);
    }

    Ok(Rendered { sql, params })
}

/// Name of the SQLite index backing a user index.
pub fn index_sql_name(collection: &str, name: &str) -> String {
    format!("docshelf_idx:{}:{}", collection, name)
}

/// `CREATE INDEX` statement for a value index.
///
/// Collection and index names are restricted to `[A-Za-z0-9_%-]`, so quoting
/// them as identifiers is safe.
pub fn create_index(sql_name: &str, spec: &IndexSpec) -> Result<String> {
    let columns = spec
        .paths()
        .iter()
        .map(extract)
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "CREATE INDEX \"{}\" ON documents (collection, {})",
        sql_name,
        columns.join(", ")
    ))
}

/// `DROP INDEX` statement for a value index.
pub fn drop_index(sql_name: &str) -> String {
    format!("DROP INDEX IF EXISTS \"{}\"", sql_name)
}

/// Convert a JSON operand to a SQL parameter as `json_extract` would return it.
pub fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::MAX)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        // Arrays and objects come back from json_extract as minified JSON text.
        other => SqlValue::Text(other.to_string()),
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn coalesce(predicate: String) -> String {
    format!("COALESCE(({}), 0)", predicate)
}

fn join(
    terms: &[Expression],
    separator: &str,
    empty: &str,
    params: &mut Vec<SqlValue>,
) -> Result<String> {
    if terms.is_empty() {
        return Ok(empty.to_string());
    }
    let rendered = terms
        .iter()
        .map(|term| render_filter(term, params))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", rendered.join(separator)))
}

/// The `json_type` and `json_extract` of one path.
struct Leaf {
    kind: String,
    value: String,
}

impl Leaf {
    fn new(path: &FieldPath) -> Result<Self> {
        let path = json_path(path)?;
        Ok(Self {
            kind: format!("json_type(body, {})", path),
            value: format!("json_extract(body, {})", path),
        })
    }

    fn present(&self) -> String {
        format!("{kind} IS NOT NULL AND {kind} != 'null'", kind = self.kind)
    }

    /// SQL `json_type` names that belong to the operand's kind.
    fn kinds(value: &Value) -> &'static str {
        match value {
            Value::Null => "('null')",
            Value::Bool(_) => "('true', 'false')",
            Value::Number(_) => "('integer', 'real')",
            Value::String(_) => "('text')",
            Value::Array(_) => "('array')",
            Value::Object(_) => "('object')",
        }
    }

    fn eq(&self, value: &Value, params: &mut Vec<SqlValue>) -> String {
        match value {
            Value::Null => format!("{} = 'null'", self.kind),
            Value::Bool(true) => format!("{} = 'true'", self.kind),
            Value::Bool(false) => format!("{} = 'false'", self.kind),
            other => {
                params.push(sql_value(other));
                format!(
                    "({} IN {} AND {} = ?)",
                    self.kind,
                    Self::kinds(other),
                    self.value
                )
            }
        }
    }

    fn compare(&self, op: CompareOp, value: &Value, params: &mut Vec<SqlValue>) -> String {
        let symbol = match op {
            CompareOp::Eq => return self.eq(value, params),
            CompareOp::Ne => {
                return format!("{} AND NOT ({})", self.present(), self.eq(value, params));
            }
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        };

        match value {
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                params.push(sql_value(value));
                format!(
                    "{} IN {} AND {} {} ?",
                    self.kind,
                    Self::kinds(value),
                    self.value,
                    symbol
                )
            }
            // Null, arrays and objects have no ordering.
            _ => "0".to_string(),
        }
    }
}
