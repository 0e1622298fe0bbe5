//! Direct evaluation of a condition tree against in-memory entities.
//!
//! This is the reference semantics every compiled artifact must agree with:
//! the equivalence tests run a compiled filter and this evaluator over the
//! same data set and compare. It also doubles as a trivial memory backend.

use crate::{core::value::Value, query::condition::Condition, records::entity::Entity};
use std::cmp::Ordering;

impl Condition {
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Condition::Equals { field, value } => {
                let actual = entity.get(field);
                if value.is_null() {
                    // Equality against NULL means "absent or null".
                    return actual.is_none_or(Value::is_null);
                }
                actual.is_some_and(|a| a.equal(value))
            }
            Condition::GreaterThan { field, value } => {
                compare_field(entity, field, value) == Some(Ordering::Greater)
            }
            Condition::GreaterEquals { field, value } => matches!(
                compare_field(entity, field, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::LesserThan { field, value } => {
                compare_field(entity, field, value) == Some(Ordering::Less)
            }
            Condition::LesserEquals { field, value } => matches!(
                compare_field(entity, field, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::Like { field, pattern } => {
                text_of(entity, field).is_some_and(|text| like_match(pattern, &text))
            }
            Condition::StartsWith { field, prefix } => {
                text_of(entity, field).is_some_and(|text| text.starts_with(prefix.as_str()))
            }
            Condition::EndsWith { field, suffix } => {
                text_of(entity, field).is_some_and(|text| text.ends_with(suffix.as_str()))
            }
            Condition::Contains { field, needle } => {
                text_of(entity, field).is_some_and(|text| text.contains(needle.as_str()))
            }
            Condition::In { field, values } => entity
                .get(field)
                .is_some_and(|actual| values.iter().any(|v| actual.equal(v))),
            Condition::Between {
                field,
                lower,
                upper,
            } => {
                let lower_ok = matches!(
                    compare_field(entity, field, lower),
                    Some(Ordering::Greater | Ordering::Equal)
                );
                let upper_ok = matches!(
                    compare_field(entity, field, upper),
                    Some(Ordering::Less | Ordering::Equal)
                );
                lower_ok && upper_ok
            }
            Condition::And(children) => children.iter().all(|child| child.matches(entity)),
            Condition::Or(children) => children.iter().any(|child| child.matches(entity)),
            Condition::Not(child) => !child.matches(entity),
        }
    }
}

fn compare_field(entity: &Entity, field: &str, value: &Value) -> Option<Ordering> {
    entity.get(field).and_then(|actual| actual.compare(value))
}

fn text_of(entity: &Entity, field: &str) -> Option<String> {
    entity.get(field).and_then(Value::as_text)
}

/// SQL LIKE semantics: `%` matches any run of characters (including the
/// empty run), `_` matches exactly one character.
fn like_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    like_rec(&pattern, &text)
}

fn like_rec(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|i| like_rec(rest, &text[i..])),
        Some(('_', rest)) => !text.is_empty() && like_rec(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && like_rec(rest, &text[1..]),
    }
}
