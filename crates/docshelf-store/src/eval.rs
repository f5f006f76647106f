//! Direct evaluation of query expressions against wire-shape values.
//!
//! Mirrors the SQL produced by [`crate::render`] so the in-memory store and
//! SQLite return the same documents in the same order.

use std::cmp::Ordering as CmpOrdering;

use docshelf_core::{CompareOp, Direction, Expression, Ordering, Value};

use crate::pattern::{glob_match, like_match};

/// Whether the wire-shape `doc` satisfies `expr`.
pub fn matches(expr: &Expression, doc: &Value) -> bool {
    match expr {
        Expression::Compare { path, op, value } => compare(path.resolve(doc), *op, value),
        Expression::In { path, values } => match valued(path.resolve(doc)) {
            Some(found) => values.iter().any(|value| same_value(found, value)),
            None => values.iter().any(Value::is_null) && is_null(path.resolve(doc)),
        },
        Expression::Like { path, pattern } => {
            text(path.resolve(doc)).is_some_and(|found| like_match(pattern, found))
        }
        Expression::Glob { path, pattern } => {
            text(path.resolve(doc)).is_some_and(|found| glob_match(pattern, found))
        }
        Expression::Exists(path) => valued(path.resolve(doc)).is_some(),
        Expression::And(terms) => terms.iter().all(|term| matches(term, doc)),
        Expression::Or(terms) => terms.iter().any(|term| matches(term, doc)),
        Expression::Not(inner) => !matches(inner, doc),
    }
}

fn valued(found: Option<&Value>) -> Option<&Value> {
    found.filter(|value| !value.is_null())
}

fn is_null(found: Option<&Value>) -> bool {
    matches!(found, Some(Value::Null))
}

fn text(found: Option<&Value>) -> Option<&str> {
    found.and_then(Value::as_str)
}

fn compare(raw: Option<&Value>, op: CompareOp, operand: &Value) -> bool {
    let found = valued(raw);
    if operand.is_null() {
        // `eq null` matches an explicit null only; ordering against null never matches.
        return match op {
            CompareOp::Eq => is_null(raw),
            CompareOp::Ne => found.is_some(),
            _ => false,
        };
    }

    let Some(found) = found else {
        return false;
    };

    match op {
        CompareOp::Eq => same_value(found, operand),
        CompareOp::Ne => !same_value(found, operand),
        CompareOp::Gt => order_within_kind(found, operand) == Some(CmpOrdering::Greater),
        CompareOp::Gte => matches!(
            order_within_kind(found, operand),
            Some(CmpOrdering::Greater | CmpOrdering::Equal)
        ),
        CompareOp::Lt => order_within_kind(found, operand) == Some(CmpOrdering::Less),
        CompareOp::Lte => matches!(
            order_within_kind(found, operand),
            Some(CmpOrdering::Less | CmpOrdering::Equal)
        ),
    }
}

/// Equality within one kind. Numbers compare numerically.
fn same_value(found: &Value, operand: &Value) -> bool {
    match (found, operand) {
        (Value::Number(_), Value::Number(_)) => {
            order_within_kind(found, operand) == Some(CmpOrdering::Equal)
        }
        _ => found == operand,
    }
}

/// Order two values of the same scalar kind; `None` across kinds.
fn order_within_kind(found: &Value, operand: &Value) -> Option<CmpOrdering> {
    match (found, operand) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        _ => None,
    }
}

/// Sort key following SQLite's ordering of `json_extract` results.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Null,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(found: Option<&Value>) -> Self {
        match found {
            None | Some(Value::Null) => SortKey::Null,
            Some(Value::Bool(b)) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
            Some(Value::Number(n)) => SortKey::Number(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) => SortKey::Text(s.clone()),
            Some(other) => SortKey::Text(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> CmpOrdering {
        match (self, other) {
            // JSON numbers are never NaN; -0.0 and 0.0 compare equal as in SQLite.
            (SortKey::Number(a), SortKey::Number(b)) => {
                a.partial_cmp(b).unwrap_or(CmpOrdering::Equal)
            }
            (SortKey::Text(a), SortKey::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Compare two wire-shape documents by `orderings`, then by ascending id.
pub fn compare_documents(a: &Value, b: &Value, orderings: &[Ordering]) -> CmpOrdering {
    for ordering in orderings {
        let left = SortKey::of(ordering.path.resolve(a));
        let right = SortKey::of(ordering.path.resolve(b));
        let result = match ordering.direction {
            Direction::Ascending => left.compare(&right),
            Direction::Descending => right.compare(&left),
        };
        if result != CmpOrdering::Equal {
            return result;
        }
    }

    let id = |doc: &Value| doc.get("id").and_then(Value::as_str).map(str::to_owned);
    id(a).cmp(&id(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshelf_core::{attr, field, json};

    fn user(id: &str, name: Value) -> Value {
        json!({"id": id, "attributes": {"name": name}})
    }

    #[test]
    fn test_eq_and_ne() {
        let brad = user("1", json!("Brad"));
        assert!(matches(&attr("name").eq("Brad"), &brad));
        assert!(!matches(&attr("name").eq("Charles"), &brad));
        assert!(matches(&attr("name").ne("Charles"), &brad));
        assert!(!matches(&attr("name").ne("Brad"), &brad));
        assert!(matches(&field("id").eq("1"), &brad));
    }

    #[test]
    fn test_missing_fields() {
        let doc = json!({"id": "1"});
        assert!(!matches(&attr("name").eq("Brad"), &doc));
        assert!(!matches(&attr("name").ne("Brad"), &doc));
        assert!(!matches(&attr("name").exists(), &doc));
        assert!(matches(&attr("name").not_exists(), &doc));
        assert!(matches(&!attr("name").eq("Brad"), &doc));
    }

    #[test]
    fn test_null_values() {
        let doc = user("1", Value::Null);
        assert!(!matches(&attr("name").exists(), &doc));
        assert!(!matches(&attr("name").ne("Brad"), &doc));
        assert!(!matches(&attr("name").ne(Value::Null), &doc));
        assert!(matches(&attr("name").eq(Value::Null), &doc));
        assert!(!matches(&attr("name").eq(Value::Null), &json!({"id": "2"})));
        assert!(matches(&attr("name").is_in([Value::Null]), &doc));
    }

    #[test]
    fn test_kinds_do_not_mix() {
        let numeric = user("1", json!(42));
        assert!(!matches(&attr("name").eq("42"), &numeric));
        assert!(!matches(&attr("name").gt("a"), &numeric));
        assert!(matches(&attr("name").ne("42"), &numeric));
        assert!(matches(&attr("name").eq(42.0), &numeric));
        assert!(matches(&attr("name").gte(42), &numeric));
        assert!(matches(&attr("name").lt(42.5), &numeric));
    }

    #[test]
    fn test_patterns_need_text() {
        assert!(matches(&attr("name").glob("Br*"), &user("1", json!("Brad"))));
        assert!(matches(&attr("name").like("br%"), &user("1", json!("Brad"))));
        assert!(!matches(&attr("name").glob("4*"), &user("1", json!(42))));
    }

    #[test]
    fn test_in_and_combinators() {
        let brad = user("1", json!("Brad"));
        assert!(matches(&attr("name").is_in(["Brad", "Brian"]), &brad));
        assert!(!matches(&attr("name").is_in(Vec::<String>::new()), &brad));
        assert!(matches(
            &attr("name").eq("x").or(attr("name").eq("Brad")),
            &brad
        ));
        assert!(!matches(
            &attr("name").eq("Brad").and(field("id").eq("2")),
            &brad
        ));
        assert!(matches(&Expression::And(vec![]), &brad));
        assert!(!matches(&Expression::Or(vec![]), &brad));
    }

    #[test]
    fn test_ordering_follows_sqlite_type_order() {
        let docs = [
            user("a", json!("Brian")),
            user("b", json!(7)),
            json!({"id": "c"}),
            user("d", json!("Brad")),
            user("e", json!(true)),
        ];
        let mut sorted: Vec<&Value> = docs.iter().collect();
        sorted.sort_by(|a, b| compare_documents(a, b, &[attr("name").asc()]));
        let ids: Vec<&str> = sorted.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c", "e", "b", "d", "a"]);

        sorted.sort_by(|a, b| compare_documents(a, b, &[attr("name").desc()]));
        let ids: Vec<&str> = sorted.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "d", "b", "e", "c"]);
    }

    #[test]
    fn test_ties_break_by_id() {
        let docs = [user("2", json!("Same")), user("1", json!("Same"))];
        let mut sorted: Vec<&Value> = docs.iter().collect();
        sorted.sort_by(|a, b| compare_documents(a, b, &[attr("name").desc()]));
        assert_eq!(sorted[0]["id"], "1");
    }
}
