//! Fluent builders producing the immutable query variants.
//!
//! A chain reads like the query it produces:
//! `SelectQuery::from("people").filter("age").gt(10).and("name").starts_with("Pol").build()`.
//! Fallible steps (an empty IN list, for instance) park their error and
//! surface it from `build()`, so chains never need intermediate `?`.

use crate::{
    core::value::Value,
    query::{
        Sort, SortDirection,
        condition::Condition,
        delete::DeleteQuery,
        errors::{ConditionError, QueryError},
        select::SelectQuery,
        update::UpdateQuery,
    },
};

/// How the next leaf joins the condition built so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// Implemented by every builder that accumulates a condition tree.
pub trait ConditionSink: Sized {
    fn push_condition(self, connective: Connective, condition: Condition) -> Self;
    fn record_error(self, error: ConditionError) -> Self;
}

fn combine(root: Option<Condition>, connective: Connective, next: Condition) -> Condition {
    match (root, connective) {
        (None, _) => next,
        (Some(Condition::And(mut children)), Connective::And) => {
            children.push(next);
            Condition::And(children)
        }
        (Some(Condition::Or(mut children)), Connective::Or) => {
            children.push(next);
            Condition::Or(children)
        }
        (Some(current), Connective::And) => Condition::And(vec![current, next]),
        (Some(current), Connective::Or) => Condition::Or(vec![current, next]),
    }
}

/// A half-built predicate: the field is chosen, the comparison is pending.
#[derive(Debug)]
pub struct FieldStep<B> {
    owner: B,
    field: String,
    connective: Connective,
    negated: bool,
}

impl<B: ConditionSink> FieldStep<B> {
    fn new(owner: B, field: String, connective: Connective) -> Self {
        FieldStep {
            owner,
            field,
            connective,
            negated: false,
        }
    }

    fn apply(self, condition: Condition) -> B {
        let condition = if self.negated {
            Condition::not(condition)
        } else {
            condition
        };
        self.owner.push_condition(self.connective, condition)
    }

    /// Negates the comparison that terminates this step.
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn eq(self, value: impl Into<Value>) -> B {
        let cond = Condition::equals(self.field.clone(), value);
        self.apply(cond)
    }

    pub fn gt(self, value: impl Into<Value>) -> B {
        let cond = Condition::greater_than(self.field.clone(), value);
        self.apply(cond)
    }

    pub fn gte(self, value: impl Into<Value>) -> B {
        let cond = Condition::greater_equals(self.field.clone(), value);
        self.apply(cond)
    }

    pub fn lt(self, value: impl Into<Value>) -> B {
        let cond = Condition::lesser_than(self.field.clone(), value);
        self.apply(cond)
    }

    pub fn lte(self, value: impl Into<Value>) -> B {
        let cond = Condition::lesser_equals(self.field.clone(), value);
        self.apply(cond)
    }

    pub fn like(self, pattern: impl Into<String>) -> B {
        let cond = Condition::like(self.field.clone(), pattern);
        self.apply(cond)
    }

    pub fn starts_with(self, prefix: impl Into<String>) -> B {
        let cond = Condition::starts_with(self.field.clone(), prefix);
        self.apply(cond)
    }

    pub fn ends_with(self, suffix: impl Into<String>) -> B {
        let cond = Condition::ends_with(self.field.clone(), suffix);
        self.apply(cond)
    }

    pub fn contains(self, needle: impl Into<String>) -> B {
        let cond = Condition::contains(self.field.clone(), needle);
        self.apply(cond)
    }

    pub fn in_list(self, values: Vec<Value>) -> B {
        match Condition::in_list(self.field.clone(), values) {
            Ok(cond) => self.apply(cond),
            Err(err) => self.owner.record_error(err),
        }
    }

    pub fn between(self, lower: impl Into<Value>, upper: impl Into<Value>) -> B {
        let cond = Condition::between(self.field.clone(), lower, upper);
        self.apply(cond)
    }
}

// --- Select ---

#[derive(Debug)]
pub struct SelectBuilder {
    entity: String,
    condition: Option<Condition>,
    sorts: Vec<Sort>,
    fields: Vec<String>,
    skip: u64,
    limit: u64,
    error: Option<QueryError>,
}

impl SelectBuilder {
    pub(crate) fn new(entity: String) -> Self {
        SelectBuilder {
            entity,
            condition: None,
            sorts: Vec::new(),
            fields: Vec::new(),
            skip: 0,
            limit: 0,
            error: None,
        }
    }

    /// Restricts the projection; without it, all fields are returned.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Starts the condition (the `where` step).
    pub fn filter(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::And)
    }

    pub fn and(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::And)
    }

    pub fn or(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::Or)
    }

    pub fn order_by(self, field: impl Into<String>) -> OrderStep {
        OrderStep {
            owner: self,
            field: field.into(),
        }
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn build(self) -> Result<SelectQuery, QueryError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        require_entity(&self.entity)?;
        Ok(SelectQuery {
            entity: self.entity,
            condition: self.condition,
            sorts: self.sorts,
            fields: self.fields,
            skip: self.skip,
            limit: self.limit,
        })
    }
}

impl ConditionSink for SelectBuilder {
    fn push_condition(mut self, connective: Connective, condition: Condition) -> Self {
        self.condition = Some(combine(self.condition.take(), connective, condition));
        self
    }

    fn record_error(mut self, error: ConditionError) -> Self {
        self.error.get_or_insert(error.into());
        self
    }
}

/// Pending ORDER BY entry awaiting its direction.
#[derive(Debug)]
pub struct OrderStep {
    owner: SelectBuilder,
    field: String,
}

impl OrderStep {
    pub fn asc(mut self) -> SelectBuilder {
        self.owner.sorts.push(Sort {
            field: self.field,
            direction: SortDirection::Asc,
        });
        self.owner
    }

    pub fn desc(mut self) -> SelectBuilder {
        self.owner.sorts.push(Sort {
            field: self.field,
            direction: SortDirection::Desc,
        });
        self.owner
    }
}

// --- Delete ---

#[derive(Debug)]
pub struct DeleteBuilder {
    entity: String,
    condition: Option<Condition>,
    fields: Vec<String>,
    error: Option<QueryError>,
}

impl DeleteBuilder {
    pub(crate) fn new(entity: String) -> Self {
        DeleteBuilder {
            entity,
            condition: None,
            fields: Vec::new(),
            error: None,
        }
    }

    /// Narrows the delete to specific attributes on capable targets.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::And)
    }

    pub fn and(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::And)
    }

    pub fn or(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::Or)
    }

    pub fn build(self) -> Result<DeleteQuery, QueryError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        require_entity(&self.entity)?;
        Ok(DeleteQuery {
            entity: self.entity,
            condition: self.condition,
            fields: self.fields,
        })
    }
}

impl ConditionSink for DeleteBuilder {
    fn push_condition(mut self, connective: Connective, condition: Condition) -> Self {
        self.condition = Some(combine(self.condition.take(), connective, condition));
        self
    }

    fn record_error(mut self, error: ConditionError) -> Self {
        self.error.get_or_insert(error.into());
        self
    }
}

// --- Update ---

#[derive(Debug)]
pub struct UpdateBuilder {
    entity: String,
    condition: Option<Condition>,
    assignments: Vec<(String, Value)>,
    error: Option<QueryError>,
}

impl UpdateBuilder {
    pub(crate) fn new(entity: String) -> Self {
        UpdateBuilder {
            entity,
            condition: None,
            assignments: Vec::new(),
            error: None,
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((field.into(), value.into()));
        self
    }

    pub fn filter(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::And)
    }

    pub fn and(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::And)
    }

    pub fn or(self, field: impl Into<String>) -> FieldStep<Self> {
        FieldStep::new(self, field.into(), Connective::Or)
    }

    pub fn build(self) -> Result<UpdateQuery, QueryError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        require_entity(&self.entity)?;
        if self.assignments.is_empty() {
            return Err(QueryError::InvalidArgument(
                "update requires at least one assignment".into(),
            ));
        }
        Ok(UpdateQuery {
            entity: self.entity,
            condition: self.condition,
            assignments: self.assignments,
        })
    }
}

impl ConditionSink for UpdateBuilder {
    fn push_condition(mut self, connective: Connective, condition: Condition) -> Self {
        self.condition = Some(combine(self.condition.take(), connective, condition));
        self
    }

    fn record_error(mut self, error: ConditionError) -> Self {
        self.error.get_or_insert(error.into());
        self
    }
}

fn require_entity(entity: &str) -> Result<(), QueryError> {
    if entity.trim().is_empty() {
        return Err(QueryError::InvalidArgument(
            "query requires a non-empty entity name".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::condition::Operator;

    #[test]
    fn test_build_simple_select() {
        let query = SelectQuery::from("people")
            .filter("name")
            .eq("Poliana")
            .build()
            .unwrap();

        assert_eq!(query.entity(), "people");
        assert_eq!(
            query.condition(),
            Some(&Condition::equals("name", "Poliana"))
        );
        assert!(query.fields().is_empty());
        assert_eq!(query.limit(), 0);
    }

    #[test]
    fn test_and_chain_flattens() {
        let query = SelectQuery::from("people")
            .filter("age")
            .gt(10)
            .and("age")
            .lt(20)
            .and("name")
            .starts_with("Pol")
            .build()
            .unwrap();

        let root = query.condition().unwrap();
        assert_eq!(root.operator(), Operator::And);
        assert_eq!(root.children().unwrap().len(), 3);
    }

    #[test]
    fn test_or_after_and_nests() {
        let query = SelectQuery::from("people")
            .filter("age")
            .gt(10)
            .and("age")
            .lt(20)
            .or("name")
            .eq("Ada")
            .build()
            .unwrap();

        let root = query.condition().unwrap();
        assert_eq!(root.operator(), Operator::Or);
        let children = root.children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].operator(), Operator::And);
    }

    #[test]
    fn test_order_skip_limit_projection() {
        let query = SelectQuery::from("people")
            .select(["name", "age"])
            .filter("age")
            .between(10, 20)
            .order_by("name")
            .asc()
            .order_by("age")
            .desc()
            .skip(2)
            .limit(10)
            .build()
            .unwrap();

        assert_eq!(query.fields(), ["name", "age"]);
        assert_eq!(query.sorts().len(), 2);
        assert_eq!(query.sorts()[0], Sort::asc("name"));
        assert_eq!(query.sorts()[1], Sort::desc("age"));
        assert_eq!(query.skip(), 2);
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn test_negated_step() {
        let query = SelectQuery::from("people")
            .filter("name")
            .not()
            .eq(Value::Null)
            .build()
            .unwrap();

        assert_eq!(
            query.condition(),
            Some(&Condition::not(Condition::equals("name", Value::Null)))
        );
    }

    #[test]
    fn test_empty_in_list_surfaces_at_build() {
        let err = SelectQuery::from("people")
            .filter("age")
            .in_list(vec![])
            .build()
            .unwrap_err();

        assert_eq!(err, QueryError::Condition(ConditionError::EmptyIn));
    }

    #[test]
    fn test_empty_entity_is_rejected() {
        let err = SelectQuery::from("  ").build().unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn test_update_builder() {
        let query = UpdateQuery::update("people")
            .set("name", "Ada")
            .set("age", 36)
            .filter("id")
            .eq(7)
            .build()
            .unwrap();

        assert_eq!(query.assignments().len(), 2);
        assert_eq!(query.assignments()[0], ("name".into(), "Ada".into()));
        assert!(query.condition().is_some());
    }

    #[test]
    fn test_update_without_assignments_is_rejected() {
        let err = UpdateQuery::update("people")
            .filter("id")
            .eq(7)
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn test_delete_builder() {
        let query = DeleteQuery::from("people")
            .fields(["nickname"])
            .filter("age")
            .lt(18)
            .build()
            .unwrap();

        assert_eq!(query.fields(), ["nickname"]);
        assert!(query.condition().is_some());
    }
}
