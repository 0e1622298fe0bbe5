//! Compiler for SQL-string targets (N1QL, CQL).

use model::query::{
    SortDirection,
    condition::Condition,
    delete::DeleteQuery,
    select::SelectQuery,
    update::UpdateQuery,
};
use tracing::debug;

use crate::{
    Compiled, QueryCompiler,
    error::CompileError,
    params::ParamBinder,
    pattern::{MatchKind, sql_pattern},
    sql::dialect::SqlDialect,
};

pub mod dialect;

/// Renders statements for one [`SqlDialect`]. Stateless apart from the
/// dialect; every compile call allocates its own binder.
#[derive(Debug, Clone)]
pub struct SqlCompiler<D> {
    dialect: D,
}

impl<D: SqlDialect> SqlCompiler<D> {
    pub fn new(dialect: D) -> Self {
        SqlCompiler { dialect }
    }

    fn render_condition(
        &self,
        condition: &Condition,
        binder: &mut ParamBinder,
    ) -> Result<String, CompileError> {
        match condition {
            Condition::Equals { field, value } => {
                if value.is_null() {
                    return Ok(format!("{} IS NULL", self.dialect.quote_identifier(field)));
                }
                self.comparison(field, "=", value.clone(), binder)
            }
            Condition::GreaterThan { field, value } => {
                self.comparison(field, ">", value.clone(), binder)
            }
            Condition::GreaterEquals { field, value } => {
                self.comparison(field, ">=", value.clone(), binder)
            }
            Condition::LesserThan { field, value } => {
                self.comparison(field, "<", value.clone(), binder)
            }
            Condition::LesserEquals { field, value } => {
                self.comparison(field, "<=", value.clone(), binder)
            }
            Condition::Like { field, pattern } => {
                self.like(field, MatchKind::Like, pattern, binder)
            }
            Condition::StartsWith { field, prefix } => {
                self.like(field, MatchKind::StartsWith, prefix, binder)
            }
            Condition::EndsWith { field, suffix } => {
                self.like(field, MatchKind::EndsWith, suffix, binder)
            }
            Condition::Contains { field, needle } => {
                self.like(field, MatchKind::Contains, needle, binder)
            }
            Condition::In { field, values } => {
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    let name = binder.bind(field, value.clone())?;
                    placeholders.push(self.dialect.placeholder(&name));
                }
                Ok(format!(
                    "{} IN ({})",
                    self.dialect.quote_identifier(field),
                    placeholders.join(", ")
                ))
            }
            Condition::Between {
                field,
                lower,
                upper,
            } => {
                let ident = self.dialect.quote_identifier(field);
                let low = self.dialect.placeholder(&binder.bind(field, lower.clone())?);
                let high = self.dialect.placeholder(&binder.bind(field, upper.clone())?);
                if self.dialect.supports_between() {
                    Ok(format!("{ident} BETWEEN {low} AND {high}"))
                } else {
                    Ok(format!("({ident} >= {low} AND {ident} <= {high})"))
                }
            }
            Condition::And(children) => self.join(children, " AND ", binder),
            Condition::Or(children) => self.join(children, " OR ", binder),
            Condition::Not(child) => {
                if let Condition::Equals { field, .. } = child.as_ref()
                    && child.is_null_equality()
                {
                    return Ok(format!(
                        "{} IS NOT NULL",
                        self.dialect.quote_identifier(field)
                    ));
                }
                let inner = self.render_condition(child, binder)?;
                Ok(format!("NOT ({inner})"))
            }
        }
    }

    fn comparison(
        &self,
        field: &str,
        op: &str,
        value: model::core::value::Value,
        binder: &mut ParamBinder,
    ) -> Result<String, CompileError> {
        let name = binder.bind(field, value)?;
        Ok(format!(
            "{} {} {}",
            self.dialect.quote_identifier(field),
            op,
            self.dialect.placeholder(&name)
        ))
    }

    fn like(
        &self,
        field: &str,
        kind: MatchKind,
        raw: &str,
        binder: &mut ParamBinder,
    ) -> Result<String, CompileError> {
        let pattern = sql_pattern(kind, raw);
        let name = binder.bind(field, pattern.into())?;
        Ok(format!(
            "{} LIKE {}",
            self.dialect.quote_identifier(field),
            self.dialect.placeholder(&name)
        ))
    }

    /// Joins compiled children, dropping fragments that reduced to empty
    /// text. All fragments gone is an invariant violation, not an empty
    /// clause.
    fn join(
        &self,
        children: &[Condition],
        separator: &str,
        binder: &mut ParamBinder,
    ) -> Result<String, CompileError> {
        let mut fragments = Vec::with_capacity(children.len());
        for child in children {
            let fragment = self.render_condition(child, binder)?;
            if !fragment.is_empty() {
                fragments.push(fragment);
            }
        }
        match fragments.len() {
            0 => Err(CompileError::Internal(
                "composite condition reduced to no effective children".into(),
            )),
            1 => Ok(fragments.swap_remove(0)),
            _ => Ok(format!("({})", fragments.join(separator))),
        }
    }
}

impl<D: SqlDialect> QueryCompiler for SqlCompiler<D> {
    type Artifact = String;

    fn target(&self) -> &'static str {
        self.dialect.target()
    }

    fn compile_select(
        &self,
        query: &SelectQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let mut binder = ParamBinder::new();
        let mut text = String::from("SELECT ");

        if query.fields().is_empty() {
            text.push('*');
        } else {
            let projection: Vec<String> = query
                .fields()
                .iter()
                .map(|f| self.dialect.quote_identifier(f))
                .collect();
            text.push_str(&projection.join(", "));
        }

        text.push_str(" FROM ");
        text.push_str(&self.dialect.quote_identifier(query.entity()));

        if let Some(condition) = query.condition() {
            text.push_str(" WHERE ");
            text.push_str(&self.render_condition(condition, &mut binder)?);
        }

        if !query.sorts().is_empty() {
            text.push_str(" ORDER BY ");
            let sorts: Vec<String> = query
                .sorts()
                .iter()
                .map(|sort| {
                    let direction = match sort.direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!("{} {}", self.dialect.quote_identifier(&sort.field), direction)
                })
                .collect();
            text.push_str(&sorts.join(", "));
        }

        if query.limit() > 0 {
            text.push_str(&format!(" LIMIT {}", query.limit()));
        }

        if query.skip() > 0 {
            if !self.dialect.supports_offset() {
                return Err(CompileError::InvalidArgument(format!(
                    "the {} target cannot skip leading rows",
                    self.target()
                )));
            }
            text.push_str(&format!(" OFFSET {}", query.skip()));
        }

        debug!(target = self.target(), statement = %text, "compiled select");
        Ok(Compiled::new(text, binder.into_params()))
    }

    fn compile_delete(
        &self,
        query: &DeleteQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let mut binder = ParamBinder::new();
        let mut text = String::from("DELETE FROM ");
        text.push_str(&self.dialect.quote_identifier(query.entity()));

        if let Some(condition) = query.condition() {
            text.push_str(" WHERE ");
            text.push_str(&self.render_condition(condition, &mut binder)?);
        }

        debug!(target = self.target(), statement = %text, "compiled delete");
        Ok(Compiled::new(text, binder.into_params()))
    }

    fn compile_update(
        &self,
        query: &UpdateQuery,
    ) -> Result<Compiled<Self::Artifact>, CompileError> {
        let condition = query.condition().ok_or_else(|| {
            CompileError::InvalidArgument("update requires a condition".into())
        })?;

        let mut binder = ParamBinder::new();
        let mut text = String::from("UPDATE ");
        text.push_str(&self.dialect.quote_identifier(query.entity()));
        text.push_str(" SET ");

        let mut assignments = Vec::with_capacity(query.assignments().len());
        for (field, value) in query.assignments() {
            let name = binder.bind(field, value.clone())?;
            assignments.push(format!(
                "{} = {}",
                self.dialect.quote_identifier(field),
                self.dialect.placeholder(&name)
            ));
        }
        text.push_str(&assignments.join(", "));

        text.push_str(" WHERE ");
        text.push_str(&self.render_condition(condition, &mut binder)?);

        debug!(target = self.target(), statement = %text, "compiled update");
        Ok(Compiled::new(text, binder.into_params()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{Cql, N1ql};
    use model::core::value::Value;
    use model::query::update::UpdateQuery;

    fn n1ql() -> SqlCompiler<N1ql> {
        SqlCompiler::new(N1ql)
    }

    fn cql() -> SqlCompiler<Cql> {
        SqlCompiler::new(Cql)
    }

    #[test]
    fn test_select_with_projection_sort_and_bounds() {
        let query = SelectQuery::from("people")
            .select(["name", "age"])
            .filter("age")
            .gt(10)
            .order_by("name")
            .asc()
            .skip(2)
            .limit(5)
            .build()
            .unwrap();

        let compiled = n1ql().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            "SELECT `name`, `age` FROM `people` WHERE `age` > $age_0 \
             ORDER BY `name` ASC LIMIT 5 OFFSET 2"
        );
        assert_eq!(compiled.params.get("age_0"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_select_star_without_condition() {
        let query = SelectQuery::from("people").build().unwrap();
        let compiled = n1ql().compile_select(&query).unwrap();
        assert_eq!(compiled.artifact, "SELECT * FROM `people`");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_composite_condition_rendering() {
        let query = SelectQuery::from("people")
            .filter("age")
            .gt(10)
            .and("age")
            .lt(20)
            .or("name")
            .eq("Ada")
            .build()
            .unwrap();

        let compiled = n1ql().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            "SELECT * FROM `people` WHERE \
             ((`age` > $age_0 AND `age` < $age_1) OR `name` = $name_2)"
        );
    }

    #[test]
    fn test_like_family_wildcards() {
        let query = SelectQuery::from("people")
            .filter("name")
            .starts_with("Pol")
            .and("name")
            .ends_with("ana")
            .and("name")
            .contains("lia")
            .build()
            .unwrap();

        let compiled = n1ql().compile_select(&query).unwrap();
        assert_eq!(
            compiled.params.get("name_0"),
            Some(&Value::String("Pol%".into()))
        );
        assert_eq!(
            compiled.params.get("name_1"),
            Some(&Value::String("%ana".into()))
        );
        assert_eq!(
            compiled.params.get("name_2"),
            Some(&Value::String("%lia%".into()))
        );
    }

    #[test]
    fn test_in_and_between() {
        let query = SelectQuery::from("people")
            .filter("age")
            .in_list(vec![Value::Int(10), Value::Int(20)])
            .and("score")
            .between(1, 5)
            .build()
            .unwrap();

        let compiled = n1ql().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            "SELECT * FROM `people` WHERE (`age` IN ($age_0, $age_1) \
             AND `score` BETWEEN $score_2 AND $score_3)"
        );
    }

    #[test]
    fn test_between_lowering_without_native_support() {
        let query = SelectQuery::from("people")
            .filter("score")
            .between(1, 5)
            .build()
            .unwrap();

        let compiled = cql().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            r#"SELECT * FROM "people" WHERE ("score" >= ? AND "score" <= ?)"#
        );
        assert_eq!(
            compiled.params.values().collect::<Vec<_>>(),
            [&Value::Int(1), &Value::Int(5)]
        );
    }

    #[test]
    fn test_not_null_equality_becomes_is_not_null() {
        let query = SelectQuery::from("people")
            .filter("name")
            .not()
            .eq(Value::Null)
            .build()
            .unwrap();

        let compiled = n1ql().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            "SELECT * FROM `people` WHERE `name` IS NOT NULL"
        );
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_not_wraps_other_conditions() {
        let query = SelectQuery::from("people")
            .filter("age")
            .not()
            .gt(18)
            .build()
            .unwrap();

        let compiled = n1ql().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            "SELECT * FROM `people` WHERE NOT (`age` > $age_0)"
        );
    }

    #[test]
    fn test_null_equality_renders_is_null() {
        let query = SelectQuery::from("people")
            .filter("nickname")
            .eq(Value::Null)
            .build()
            .unwrap();

        let compiled = n1ql().compile_select(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            "SELECT * FROM `people` WHERE `nickname` IS NULL"
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let query = SelectQuery::from("people")
            .filter("age")
            .between(10, 20)
            .and("name")
            .starts_with("Pol")
            .build()
            .unwrap();

        let compiler = n1ql();
        let first = compiler.compile_select(&query).unwrap();
        let second = compiler.compile_select(&query).unwrap();
        assert_eq!(first.artifact, second.artifact);
        assert_eq!(
            first.params.names().collect::<Vec<_>>(),
            second.params.names().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_delete_statement() {
        let query = DeleteQuery::from("people")
            .filter("age")
            .lt(18)
            .build()
            .unwrap();

        let compiled = n1ql().compile_delete(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            "DELETE FROM `people` WHERE `age` < $age_0"
        );
    }

    #[test]
    fn test_update_statement() {
        let query = UpdateQuery::update("people")
            .set("name", "Ada")
            .set("age", 36)
            .filter("id")
            .eq(7)
            .build()
            .unwrap();

        let compiled = n1ql().compile_update(&query).unwrap();
        assert_eq!(
            compiled.artifact,
            "UPDATE `people` SET `name` = $name_0, `age` = $age_1 WHERE `id` = $id_2"
        );
        assert_eq!(compiled.params.len(), 3);
    }

    #[test]
    fn test_update_without_condition_fails_fast() {
        let query = UpdateQuery::update("people")
            .set("name", "Ada")
            .build()
            .unwrap();

        let err = n1ql().compile_update(&query).unwrap_err();
        assert!(matches!(err, CompileError::InvalidArgument(_)));
    }

    #[test]
    fn test_cql_rejects_skip() {
        let query = SelectQuery::from("people").skip(5).build().unwrap();
        let err = cql().compile_select(&query).unwrap_err();
        assert!(matches!(err, CompileError::InvalidArgument(_)));
    }
}
