//! Compiler for targets that execute a declarative "find" request body
//! over REST (CouchDB-style mango selectors).
//!
//! Documents of every entity share one bucket, so each selector is
//! conjoined with an `@entity` discriminator keyed to the query's entity.

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

pub const ENTITY_FIELD: &str = "@entity";

/// A complete find request body, ready to be posted as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MangoQuery {
    pub body: Json,
}

#[derive(Debug, Clone, Default)]
pub struct MangoCompiler;

impl MangoCompiler {
    pub fn new() -> Self {
        MangoCompiler
    }

    /// Builds the selector for `entity`, conjoining the user condition with
    /// the discriminator when one is present.
    fn selector(&self, entity: &str, condition: Option<&Condition>) -> Result<Json, CompileError> {
        let discriminator = field_op(ENTITY_FIELD, "$eq", Json::String(entity.to_string()));
        match condition {
            Some(condition) => Ok(composite(
                "$and",
                vec![discriminator, self.selector_json(condition)?],
            )),
            None => Ok(discriminator),
        }
    }

    fn selector_json(&self, condition: &Condition) -> Result<Json, CompileError> {
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
                    let field = child.field().unwrap_or_default();
                    return Ok(field_op(field, "$exists", Json::Bool(true)));
                }
                // Mango's $not takes a single selector object, not an array.
                let mut outer = Map::new();
                outer.insert("$not".to_string(), self.selector_json(child)?);
                Ok(Json::Object(outer))
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
            let selector = self.selector_json(child)?;
            if selector != Json::Object(Map::new()) {
                out.push(selector);
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

impl QueryCompiler for MangoCompiler {
    type Artifact = MangoQuery;

    fn target(&self) -> &'static str {
        "mango"
    }

    fn compile_select(
        &self,
        query: &SelectQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let mut body = Map::new();
        body.insert(
            "selector".to_string(),
            self.selector(query.entity(), query.condition())?,
        );
        if !query.fields().is_empty() {
            let fields: Vec<Json> = query
                .fields()
                .iter()
                .map(|f| Json::String(f.clone()))
                .collect();
            body.insert("fields".to_string(), Json::Array(fields));
        }
        if !query.sorts().is_empty() {
            let sort: Vec<Json> = query
                .sorts()
                .iter()
                .map(|sort| {
                    let direction = match sort.direction {
                        SortDirection::Asc => "asc",
                        SortDirection::Desc => "desc",
                    };
                    field_op_raw(&sort.field, Json::String(direction.to_string()))
                })
                .collect();
            body.insert("sort".to_string(), Json::Array(sort));
        }
        if query.limit() > 0 {
            body.insert("limit".to_string(), Json::from(query.limit()));
        }
        if query.skip() > 0 {
            body.insert("skip".to_string(), Json::from(query.skip()));
        }

        let body = Json::Object(body);
        debug!(target = self.target(), body = %body, "compiled select");
        Ok(Compiled::new(MangoQuery { body }, ParamMap::default()))
    }

    /// Deletion happens by fetching matching `_id`/`_rev` pairs first, so a
    /// delete compiles to a find limited to those two fields.
    fn compile_delete(
        &self,
        query: &DeleteQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let mut body = Map::new();
        body.insert(
            "selector".to_string(),
            self.selector(query.entity(), query.condition())?,
        );
        body.insert(
            "fields".to_string(),
            Json::Array(vec![
                Json::String("_id".to_string()),
                Json::String("_rev".to_string()),
            ]),
        );

        let body = Json::Object(body);
        debug!(target = self.target(), body = %body, "compiled delete");
        Ok(Compiled::new(MangoQuery { body }, ParamMap::default()))
    }

    fn compile_update(&self, _query: &UpdateQuery) -> Result<Compiled<Self::Artifact>, CompileError> {
        Err(CompileError::Unsupported {
            operation: "UPDATE".to_string(),
            target: self.target(),
        })
    }
}

fn field_op_raw(field: &str, value: Json) -> Json {
    let mut outer = Map::new();
    outer.insert(field.to_string(), value);
    Json::Object(outer)
}
