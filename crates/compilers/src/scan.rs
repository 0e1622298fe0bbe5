//! Compiler for targets that filter a table scan with an expression
//! string plus attribute-name and attribute-value substitution maps
//! (DynamoDB-style).
//!
//! Field names never appear literally in the expression: each one gets a
//! `#n{i}` alias so reserved words stay harmless. Literals bind through
//! `:`-prefixed placeholders in the parameter map.

use std::collections::BTreeMap;

use model::{
    core::value::Value,
    query::{
        condition::{Condition, Operator},
        delete::DeleteQuery,
        select::SelectQuery,
        update::UpdateQuery,
    },
};
use serde::Serialize;
use tracing::debug;

use crate::{
    Compiled, QueryCompiler,
    error::CompileError,
    params::{ParamMap, sanitize},
};

pub const ENTITY_FIELD: &str = "_entity";

/// A compiled scan request: the filter expression with its substitution
/// maps. Values live in the shared parameter map under their `:` names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanQuery {
    pub filter_expression: String,
    /// Alias (`#n0`) to the real attribute name it stands for.
    pub attribute_names: BTreeMap<String, String>,
    pub projection_expression: Option<String>,
    pub limit: u64,
}

/// Allocation state for one compilation: attribute aliases are reused per
/// field, value placeholders are never reused.
#[derive(Debug, Default)]
struct ScanBinder {
    counter: usize,
    params: ParamMap,
    aliases: BTreeMap<String, String>,
    alias_order: Vec<String>,
}

impl ScanBinder {
    fn alias(&mut self, field: &str) -> String {
        if let Some(alias) = self.aliases.get(field) {
            return alias.clone();
        }
        let alias = format!("#n{}", self.alias_order.len());
        self.aliases.insert(field.to_string(), alias.clone());
        self.alias_order.push(field.to_string());
        alias
    }

    fn bind(&mut self, field: &str, value: Value) -> Result<String, CompileError> {
        let name = format!(":{}_{}", sanitize(field), self.counter);
        self.counter += 1;
        self.params.insert(name.clone(), value)?;
        Ok(name)
    }

    fn attribute_names(&self) -> BTreeMap<String, String> {
        self.aliases
            .iter()
            .map(|(field, alias)| (alias.clone(), field.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanCompiler;

impl ScanCompiler {
    pub fn new() -> Self {
        ScanCompiler
    }

    /// Renders the filter for `entity`, always conjoined with the entity
    /// discriminator since all entities share one table.
    fn filter(
        &self,
        entity: &str,
        condition: Option<&Condition>,
        binder: &mut ScanBinder,
    ) -> Result<String, CompileError> {
        let alias = binder.alias(ENTITY_FIELD);
        let placeholder = binder.bind(ENTITY_FIELD, Value::from(entity))?;
        let discriminator = format!("{alias} = {placeholder}");
        match condition {
            Some(condition) => {
                let rendered = self.render(condition, binder)?;
                Ok(format!("{discriminator} AND ({rendered})"))
            }
            None => Ok(discriminator),
        }
    }

    fn render(
        &self,
        condition: &Condition,
        binder: &mut ScanBinder,
    ) -> Result<String, CompileError> {
        match condition {
            Condition::Equals { field, value } => {
                if value.is_null() {
                    let alias = binder.alias(field);
                    return Ok(format!("attribute_not_exists({alias})"));
                }
                self.comparison(field, "=", value, binder)
            }
            Condition::GreaterThan { field, value } => self.comparison(field, ">", value, binder),
            Condition::GreaterEquals { field, value } => {
                self.comparison(field, ">=", value, binder)
            }
            Condition::LesserThan { field, value } => self.comparison(field, "<", value, binder),
            Condition::LesserEquals { field, value } => self.comparison(field, "<=", value, binder),
            Condition::Like { .. } => Err(CompileError::unsupported(Operator::Like, self.target())),
            Condition::StartsWith { field, prefix } => {
                let alias = binder.alias(field);
                let placeholder = binder.bind(field, Value::from(prefix.as_str()))?;
                Ok(format!("begins_with({alias}, {placeholder})"))
            }
            Condition::EndsWith { .. } => {
                Err(CompileError::unsupported(Operator::EndsWith, self.target()))
            }
            Condition::Contains { field, needle } => {
                let alias = binder.alias(field);
                let placeholder = binder.bind(field, Value::from(needle.as_str()))?;
                Ok(format!("contains({alias}, {placeholder})"))
            }
            Condition::In { field, values } => {
                let alias = binder.alias(field);
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    placeholders.push(binder.bind(field, value.clone())?);
                }
                Ok(format!("{alias} IN ({})", placeholders.join(", ")))
            }
            Condition::Between {
                field,
                lower,
                upper,
            } => {
                let alias = binder.alias(field);
                let low = binder.bind(field, lower.clone())?;
                let high = binder.bind(field, upper.clone())?;
                Ok(format!("{alias} BETWEEN {low} AND {high}"))
            }
            Condition::And(children) => self.join(children, " AND ", binder),
            Condition::Or(children) => self.join(children, " OR ", binder),
            Condition::Not(child) => {
                if child.is_null_equality() {
                    let field = child.field().unwrap_or_default();
                    let alias = binder.alias(field);
                    return Ok(format!("attribute_exists({alias})"));
                }
                let rendered = self.render(child, binder)?;
                Ok(format!("NOT ({rendered})"))
            }
        }
    }

    fn comparison(
        &self,
        field: &str,
        op: &str,
        value: &Value,
        binder: &mut ScanBinder,
    ) -> Result<String, CompileError> {
        let alias = binder.alias(field);
        let placeholder = binder.bind(field, value.clone())?;
        Ok(format!("{alias} {op} {placeholder}"))
    }

    fn join(
        &self,
        children: &[Condition],
        separator: &str,
        binder: &mut ScanBinder,
    ) -> Result<String, CompileError> {
        let mut fragments = Vec::with_capacity(children.len());
        for child in children {
            let rendered = self.render(child, binder)?;
            if !rendered.is_empty() {
                fragments.push(rendered);
            }
        }
        match fragments.len() {
            0 => Err(CompileError::Internal(
                "composite condition reduced to no effective children".to_string(),
            )),
            1 => Ok(fragments.swap_remove(0)),
            _ => Ok(format!("({})", fragments.join(separator))),
        }
    }

    fn projection(&self, fields: &[String], binder: &mut ScanBinder) -> Option<String> {
        if fields.is_empty() {
            return None;
        }
        let aliases: Vec<String> = fields.iter().map(|field| binder.alias(field)).collect();
        Some(aliases.join(", "))
    }
}

impl QueryCompiler for ScanCompiler {
    type Artifact = ScanQuery;

    fn target(&self) -> &'static str {
        "scan"
    }

    fn compile_select(
        &self,
        query: &SelectQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        if !query.sorts().is_empty() {
            return Err(CompileError::InvalidArgument(
                "scan targets cannot order results".to_string(),
            ));
        }
        if query.skip() > 0 {
            return Err(CompileError::InvalidArgument(
                "scan targets cannot skip leading rows".to_string(),
            ));
        }

        let mut binder = ScanBinder::default();
        let filter_expression = self.filter(query.entity(), query.condition(), &mut binder)?;
        let projection_expression = self.projection(query.fields(), &mut binder);
        let attribute_names = binder.attribute_names();

        debug!(target = self.target(), filter = %filter_expression, "compiled select");
        Ok(Compiled::new(
            ScanQuery {
                filter_expression,
                attribute_names,
                projection_expression,
                limit: query.limit(),
            },
            binder.params,
        ))
    }

    fn compile_delete(
        &self,
        query: &DeleteQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let mut binder = ScanBinder::default();
        let filter_expression = self.filter(query.entity(), query.condition(), &mut binder)?;
        let projection_expression = self.projection(query.fields(), &mut binder);
        let attribute_names = binder.attribute_names();

        debug!(target = self.target(), filter = %filter_expression, "compiled delete");
        Ok(Compiled::new(
            ScanQuery {
                filter_expression,
                attribute_names,
                projection_expression,
                limit: 0,
            },
            binder.params,
        ))
    }

    fn compile_update(&self, _query: &UpdateQuery) -> Result<Compiled<Self::Artifact>, CompileError> {
        Err(CompileError::Unsupported {
            operation: "UPDATE".to_string(),
            target: self.target(),
        })
    }
}
