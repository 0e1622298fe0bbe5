use crate::{
    core::value::Value,
    query::{builder::UpdateBuilder, condition::Condition},
};

/// An update-with-assignments query. Assignments keep their declaration
/// order. Compilers require a condition and fail fast without one.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub(crate) entity: String,
    pub(crate) condition: Option<Condition>,
    pub(crate) assignments: Vec<(String, Value)>,
}

impl UpdateQuery {
    pub fn update(entity: impl Into<String>) -> UpdateBuilder {
        UpdateBuilder::new(entity.into())
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }
}
