//! The backend-agnostic condition tree shared by every compiler.

use crate::{core::value::Value, query::errors::ConditionError};
use std::fmt;

/// The operator tag of a condition node. Mostly used to name the offending
/// operator when a target rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    GreaterThan,
    GreaterEquals,
    LesserThan,
    LesserEquals,
    Like,
    StartsWith,
    EndsWith,
    Contains,
    In,
    Between,
    And,
    Or,
    Not,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Equals => "EQUALS",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterEquals => "GREATER_EQUALS",
            Operator::LesserThan => "LESSER_THAN",
            Operator::LesserEquals => "LESSER_EQUALS",
            Operator::Like => "LIKE",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::Contains => "CONTAINS",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        };
        f.write_str(name)
    }
}

/// An immutable predicate tree over named fields.
///
/// Trees are built bottom-up through the constructors below (or the fluent
/// query builders) and never mutated afterwards, so they are safe to share
/// across concurrent compilations. `Between` carries its two bounds as
/// separate fields, which makes a wrong-arity tuple unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals { field: String, value: Value },
    GreaterThan { field: String, value: Value },
    GreaterEquals { field: String, value: Value },
    LesserThan { field: String, value: Value },
    LesserEquals { field: String, value: Value },
    Like { field: String, pattern: String },
    StartsWith { field: String, prefix: String },
    EndsWith { field: String, suffix: String },
    Contains { field: String, needle: String },
    In { field: String, values: Vec<Value> },
    Between { field: String, lower: Value, upper: Value },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn greater_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::GreaterThan {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn greater_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::GreaterEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lesser_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::LesserThan {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lesser_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::LesserEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Condition::StartsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn ends_with(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Condition::EndsWith {
            field: field.into(),
            suffix: suffix.into(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Condition::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn in_list(
        field: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<Self, ConditionError> {
        if values.is_empty() {
            return Err(ConditionError::EmptyIn);
        }
        Ok(Condition::In {
            field: field.into(),
            values,
        })
    }

    pub fn between(
        field: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        Condition::Between {
            field: field.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// Slice-based variant of [`Condition::between`] for callers that receive
    /// the bounds as a dynamic list.
    pub fn between_pair(
        field: impl Into<String>,
        bounds: &[Value],
    ) -> Result<Self, ConditionError> {
        match bounds {
            [lower, upper] => Ok(Condition::Between {
                field: field.into(),
                lower: lower.clone(),
                upper: upper.clone(),
            }),
            other => Err(ConditionError::BetweenArity(other.len())),
        }
    }

    pub fn and(children: Vec<Condition>) -> Result<Self, ConditionError> {
        if children.is_empty() {
            return Err(ConditionError::EmptyComposite);
        }
        Ok(Condition::And(children))
    }

    pub fn or(children: Vec<Condition>) -> Result<Self, ConditionError> {
        if children.is_empty() {
            return Err(ConditionError::EmptyComposite);
        }
        Ok(Condition::Or(children))
    }

    pub fn not(child: Condition) -> Self {
        Condition::Not(Box::new(child))
    }

    pub fn operator(&self) -> Operator {
        match self {
            Condition::Equals { .. } => Operator::Equals,
            Condition::GreaterThan { .. } => Operator::GreaterThan,
            Condition::GreaterEquals { .. } => Operator::GreaterEquals,
            Condition::LesserThan { .. } => Operator::LesserThan,
            Condition::LesserEquals { .. } => Operator::LesserEquals,
            Condition::Like { .. } => Operator::Like,
            Condition::StartsWith { .. } => Operator::StartsWith,
            Condition::EndsWith { .. } => Operator::EndsWith,
            Condition::Contains { .. } => Operator::Contains,
            Condition::In { .. } => Operator::In,
            Condition::Between { .. } => Operator::Between,
            Condition::And(_) => Operator::And,
            Condition::Or(_) => Operator::Or,
            Condition::Not(_) => Operator::Not,
        }
    }

    /// The field a leaf node predicates over. Composite nodes have none.
    pub fn field(&self) -> Option<&str> {
        match self {
            Condition::Equals { field, .. }
            | Condition::GreaterThan { field, .. }
            | Condition::GreaterEquals { field, .. }
            | Condition::LesserThan { field, .. }
            | Condition::LesserEquals { field, .. }
            | Condition::Like { field, .. }
            | Condition::StartsWith { field, .. }
            | Condition::EndsWith { field, .. }
            | Condition::Contains { field, .. }
            | Condition::In { field, .. }
            | Condition::Between { field, .. } => Some(field),
            Condition::And(_) | Condition::Or(_) | Condition::Not(_) => None,
        }
    }

    /// The children of an AND/OR node.
    pub fn children(&self) -> Option<&[Condition]> {
        match self {
            Condition::And(children) | Condition::Or(children) => Some(children),
            _ => None,
        }
    }

    /// True when this node is `EQUALS(field, NULL)`. Negation compilers
    /// rewrite that shape into an existence check.
    pub fn is_null_equality(&self) -> bool {
        matches!(self, Condition::Equals { value, .. } if value.is_null())
    }
}
