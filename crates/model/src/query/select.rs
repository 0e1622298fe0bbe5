//! The read-query variant: filter, sort, projection and page bounds.

use crate::query::{Sort, builder::SelectBuilder, condition::Condition};

/// An immutable select query. Built once through [`SelectBuilder`], then
/// handed to any compiler; compilers never mutate it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub(crate) entity: String,
    pub(crate) condition: Option<Condition>,
    pub(crate) sorts: Vec<Sort>,
    pub(crate) fields: Vec<String>,
    pub(crate) skip: u64,
    pub(crate) limit: u64,
}

impl SelectQuery {
    /// Entry point of the fluent builder.
    pub fn from(entity: impl Into<String>) -> SelectBuilder {
        SelectBuilder::new(entity.into())
    }

    /// The collection/table the query targets.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    /// Projected field names; empty means all fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    /// Maximum number of rows; 0 means unbounded.
    pub fn limit(&self) -> u64 {
        self.limit
    }
}
