//! Compiler for targets that take a structured filter object (BSON-style
//! `$`-operator documents).

use model::query::{
    SortDirection,
    condition::Condition,
    delete::DeleteQuery,
    select::SelectQuery,
    update::UpdateQuery,
};
use serde::Serialize;
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::{
    Compiled, QueryCompiler,
    error::CompileError,
    params::ParamMap,
    pattern::{MatchKind, regex_pattern},
};

/// A compiled structured query. Literals are embedded in the filter itself
/// (the target's native artifact carries values), so the parameter map
/// stays empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentQuery {
    pub filter: Json,
    /// Sort entries as `(field, 1 | -1)` in declaration order.
    pub sort: Vec<(String, i32)>,
    pub projection: Vec<String>,
    /// `{"$set": {...}}` document, present on updates only.
    pub update: Option<Json>,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentCompiler;

impl DocumentCompiler {
    pub fn new() -> Self {
        DocumentCompiler
    }

    fn filter_json(&self, condition: &Condition) -> Result<Json, CompileError> {
        match condition {
            Condition::Equals { field, value } => Ok(field_op(field, "$eq", value.as_json())),
            Condition::GreaterThan { field, value } => {
                Ok(field_op(field, "$gt", value.as_json()))
            }
            Condition::GreaterEquals { field, value } => {
                Ok(field_op(field, "$gte", value.as_json()))
            }
            Condition::LesserThan { field, value } => Ok(field_op(field, "$lt", value.as_json())),
            Condition::LesserEquals { field, value } => {
                Ok(field_op(field, "$lte", value.as_json()))
            }
            Condition::Like { field, pattern } => Ok(field_op(
                field,
                "$regex",
                Json::String(regex_pattern(MatchKind::Like, pattern)),
            )),
            Condition::StartsWith { field, prefix } => Ok(field_op(
                field,
                "$regex",
                Json::String(regex_pattern(MatchKind::StartsWith, prefix)),
            )),
            Condition::EndsWith { field, suffix } => Ok(field_op(
                field,
                "$regex",
                Json::String(regex_pattern(MatchKind::EndsWith, suffix)),
            )),
            Condition::Contains { field, needle } => Ok(field_op(
                field,
                "$regex",
                Json::String(regex_pattern(MatchKind::Contains, needle)),
            )),
            Condition::In { field, values } => {
                let list: Vec<Json> = values.iter().map(|v| v.as_json()).collect();
                Ok(field_op(field, "$in", Json::Array(list)))
            }
            Condition::Between {
                field,
                lower,
                upper,
            } => Ok(composite(
                "$and",
                vec![
                    field_op(field, "$gte", lower.as_json()),
                    field_op(field, "$lte", upper.as_json()),
                ],
            )),
            Condition::And(children) => {
                Ok(composite("$and", self.children_json(children, "AND")?))
            }
            Condition::Or(children) => Ok(composite("$or", self.children_json(children, "OR")?)),
            Condition::Not(child) => {
                if child.is_null_equality() {
                    // Negated null equality asks for presence, which the
                    // grammar expresses directly.
                    let field = child.field().unwrap_or_default();
                    return Ok(field_op(field, "$exists", Json::Bool(true)));
                }
                Ok(composite("$nor", vec![self.filter_json(child)?]))
            }
        }
    }

    fn children_json(
        &self,
        children: &[Condition],
        label: &str,
    ) -> Result<Vec<Json>, CompileError> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            let filter = self.filter_json(child)?;
            if filter != Json::Object(Map::new()) {
                out.push(filter);
            }
        }
        if out.is_empty() {
            return Err(CompileError::Internal(format!(
                "{label} condition reduced to no effective children"
            )));
        }
        Ok(out)
    }
}

fn field_op(field: &str, op: &str, value: Json) -> Json {
    let mut inner = Map::new();
    inner.insert(op.to_string(), value);
    let mut outer = Map::new();
    outer.insert(field.to_string(), Json::Object(inner));
    Json::Object(outer)
}

fn composite(op: &str, children: Vec<Json>) -> Json {
    let mut outer = Map::new();
    outer.insert(op.to_string(), Json::Array(children));
    Json::Object(outer)
}

impl QueryCompiler for DocumentCompiler {
    type Artifact = DocumentQuery;

    fn target(&self) -> &'static str {
        "document"
    }

    fn compile_select(
        &self,
        query: &SelectQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let filter = match query.condition() {
            Some(condition) => self.filter_json(condition)?,
            None => Json::Object(Map::new()),
        };
        let sort = query
            .sorts()
            .iter()
            .map(|sort| {
                let direction = match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                };
                (sort.field.clone(), direction)
            })
            .collect();

        debug!(target = self.target(), filter = %filter, "compiled select");
        Ok(Compiled::new(
            DocumentQuery {
                filter,
                sort,
                projection: query.fields().to_vec(),
                update: None,
                skip: query.skip(),
                limit: query.limit(),
            },
            ParamMap::default(),
        ))
    }

    fn compile_delete(
        &self,
        query: &DeleteQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let filter = match query.condition() {
            Some(condition) => self.filter_json(condition)?,
            None => Json::Object(Map::new()),
        };

        debug!(target = self.target(), filter = %filter, "compiled delete");
        Ok(Compiled::new(
            DocumentQuery {
                filter,
                sort: Vec::new(),
                projection: query.fields().to_vec(),
                update: None,
                skip: 0,
                limit: 0,
            },
            ParamMap::default(),
        ))
    }

    fn compile_update(
        &self,
        query: &UpdateQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let condition = query.condition().ok_or_else(|| {
            CompileError::InvalidArgument("update requires a condition".into())
        })?;
        let filter = self.filter_json(condition)?;

        let mut set = Map::new();
        for (field, value) in query.assignments() {
            set.insert(field.clone(), value.as_json());
        }
        let mut update = Map::new();
        update.insert("$set".to_string(), Json::Object(set));

        debug!(target = self.target(), filter = %filter, "compiled update");
        Ok(Compiled::new(
            DocumentQuery {
                filter,
                sort: Vec::new(),
                projection: Vec::new(),
                update: Some(Json::Object(update)),
                skip: 0,
                limit: 0,
            },
            ParamMap::default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;
    use serde_json::json;

    fn compiler() -> DocumentCompiler {
        DocumentCompiler::new()
    }

    #[test]
    fn test_comparison_filters() {
        let query = SelectQuery::from("people")
            .filter("age")
            .gt(10)
            .and("age")
            .lte(20)
            .build()
            .unwrap();

        let compiled = compiler().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact.filter,
            json!({"$and": [
                {"age": {"$gt": 10}},
                {"age": {"$lte": 20}}
            ]})
        );
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_pattern_operators_become_regexes() {
        let query = SelectQuery::from("people")
            .filter("name")
            .starts_with("Pol")
            .or("name")
            .ends_with("ana")
            .build()
            .unwrap();

        let compiled = compiler().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact.filter,
            json!({"$or": [
                {"name": {"$regex": "^Pol"}},
                {"name": {"$regex": "ana$"}}
            ]})
        );
    }

    #[test]
    fn test_between_lowers_to_range_conjunction() {
        let query = SelectQuery::from("people")
            .filter("age")
            .between(10, 20)
            .build()
            .unwrap();

        let compiled = compiler().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact.filter,
            json!({"$and": [
                {"age": {"$gte": 10}},
                {"age": {"$lte": 20}}
            ]})
        );
    }

    #[test]
    fn test_in_filter() {
        let query = SelectQuery::from("people")
            .filter("age")
            .in_list(vec![Value::Int(10), Value::Int(20)])
            .build()
            .unwrap();

        let compiled = compiler().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact.filter,
            json!({"age": {"$in": [10, 20]}})
        );
    }

    #[test]
    fn test_not_null_equality_becomes_exists() {
        let query = SelectQuery::from("people")
            .filter("name")
            .not()
            .eq(Value::Null)
            .build()
            .unwrap();

        let compiled = compiler().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact.filter,
            json!({"name": {"$exists": true}})
        );
    }

    #[test]
    fn test_not_wraps_in_nor() {
        let query = SelectQuery::from("people")
            .filter("age")
            .not()
            .gt(18)
            .build()
            .unwrap();

        let compiled = compiler().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact.filter,
            json!({"$nor": [{"age": {"$gt": 18}}]})
        );
    }

    #[test]
    fn test_sort_projection_and_bounds() {
        let query = SelectQuery::from("people")
            .select(["name"])
            .order_by("age")
            .desc()
            .order_by("name")
            .asc()
            .skip(4)
            .limit(8)
            .build()
            .unwrap();

        let compiled = compiler().compile_select(&query).unwrap();
        let artifact = compiled.artifact;
        assert_eq!(artifact.sort, [("age".to_string(), -1), ("name".to_string(), 1)]);
        assert_eq!(artifact.projection, ["name"]);
        assert_eq!(artifact.skip, 4);
        assert_eq!(artifact.limit, 8);
    }

    #[test]
    fn test_update_produces_set_document() {
        let query = UpdateQuery::update("people")
            .set("name", "Ada")
            .filter("id")
            .eq(7)
            .build()
            .unwrap();

        let compiled = compiler().compile_update(&query).unwrap();
        assert_eq!(
            compiled.artifact.update,
            Some(json!({"$set": {"name": "Ada"}}))
        );
        assert_eq!(compiled.artifact.filter, json!({"id": {"$eq": 7}}));
    }

    #[test]
    fn test_update_without_condition_fails() {
        let query = UpdateQuery::update("people")
            .set("name", "Ada")
            .build()
            .unwrap();
        let err = compiler().compile_update(&query).unwrap_err();
        assert!(matches!(err, CompileError::InvalidArgument(_)));
    }
}
