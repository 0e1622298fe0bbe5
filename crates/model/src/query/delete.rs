use crate::query::{builder::DeleteBuilder, condition::Condition};

/// A delete-by-filter query. The optional field list narrows the delete to
/// specific attributes on targets that support partial removal.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub(crate) entity: String,
    pub(crate) condition: Option<Condition>,
    pub(crate) fields: Vec<String>,
}

impl DeleteQuery {
    pub fn from(entity: impl Into<String>) -> DeleteBuilder {
        DeleteBuilder::new(entity.into())
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}
