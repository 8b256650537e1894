//! Compiles one `(field, operator, value)` condition.

use crate::{
    error::QueryError,
    query::{
        ast::expr::{BinaryOperator, Expr},
        dialect::{Dialect, needs_like_escape},
        value,
    },
    transform::identifier,
};
use model::{
    core::value::Value,
    query::{context::TransformContext, filter::Operator},
};

pub fn compile_predicate(
    field: &str,
    operator: Operator,
    val: &Value,
    context: &TransformContext,
    dialect: &dyn Dialect,
) -> Result<Expr, QueryError> {
    let column = identifier::column(field, context)?;

    if let Some((kind, negated, case_sensitive)) = operator.text_match() {
        let text = text_operand(field, operator, val)?;
        return Ok(Expr::Like {
            expr: Box::new(column),
            pattern: Box::new(value(Value::String(dialect.like_pattern(
                &text,
                kind,
                case_sensitive,
            )))),
            case_sensitive,
            negated,
            escaped: needs_like_escape(&text),
        });
    }

    match operator {
        Operator::Eq | Operator::Ne if val.is_null() => Ok(Expr::IsNull {
            expr: Box::new(column),
            negated: operator == Operator::Ne,
        }),
        Operator::Eq => comparison(column, BinaryOperator::Eq, field, operator, val),
        Operator::Ne => comparison(column, BinaryOperator::NotEq, field, operator, val),
        Operator::Lt => comparison(column, BinaryOperator::Lt, field, operator, val),
        Operator::Gt => comparison(column, BinaryOperator::Gt, field, operator, val),
        Operator::Lte => comparison(column, BinaryOperator::LtEq, field, operator, val),
        Operator::Gte => comparison(column, BinaryOperator::GtEq, field, operator, val),
        Operator::In | Operator::Ina | Operator::Nin | Operator::Nina => {
            let items = match val.as_list() {
                Some(items) if !items.is_empty() => items,
                Some(_) => {
                    return Err(QueryError::invalid_value(
                        field,
                        operator,
                        "expects a non-empty list",
                    ));
                }
                None => {
                    return Err(QueryError::invalid_value(
                        field,
                        operator,
                        "expects a list of values",
                    ));
                }
            };
            Ok(Expr::InList {
                expr: Box::new(column),
                list: items.iter().cloned().map(value).collect(),
                negated: matches!(operator, Operator::Nin | Operator::Nina),
            })
        }
        Operator::Null | Operator::NNull => Ok(Expr::IsNull {
            expr: Box::new(column),
            negated: operator == Operator::NNull,
        }),
        Operator::Between | Operator::NBetween => match val.as_list() {
            Some([low, high]) => Ok(Expr::Between {
                expr: Box::new(column),
                low: Box::new(value(low.clone())),
                high: Box::new(value(high.clone())),
                negated: operator == Operator::NBetween,
            }),
            _ => Err(QueryError::invalid_value(
                field,
                operator,
                "expects exactly two values [low, high]",
            )),
        },
        // Text operators returned above.
        _ => Err(QueryError::UnknownOperator(operator.to_string())),
    }
}

fn comparison(
    column: Expr,
    op: BinaryOperator,
    field: &str,
    operator: Operator,
    val: &Value,
) -> Result<Expr, QueryError> {
    match val {
        Value::List(_) | Value::Record(_) => Err(QueryError::invalid_value(
            field,
            operator,
            "expects a single value",
        )),
        Value::Null => Err(QueryError::invalid_value(
            field,
            operator,
            "cannot compare against null",
        )),
        other => Ok(Expr::binary(column, op, value(other.clone()))),
    }
}

fn text_operand(field: &str, operator: Operator, val: &Value) -> Result<String, QueryError> {
    match val {
        Value::List(_) | Value::Record(_) | Value::Null | Value::Bytes(_) => Err(
            QueryError::invalid_value(field, operator, "expects a text value"),
        ),
        other => other
            .as_string()
            .ok_or_else(|| QueryError::invalid_value(field, operator, "expects a text value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{
        compiled::CompiledQuery,
        dialect::{MySql, Postgres, Sqlite},
    };

    fn compile(field: &str, operator: Operator, val: Value) -> Result<CompiledQuery, QueryError> {
        compile_with(field, operator, val, &Sqlite)
    }

    fn compile_with(
        field: &str,
        operator: Operator,
        val: Value,
        dialect: &dyn Dialect,
    ) -> Result<CompiledQuery, QueryError> {
        let expr = compile_predicate(field, operator, &val, &TransformContext::new(), dialect)?;
        Ok(CompiledQuery::render(&expr, dialect))
    }

    #[test]
    fn test_eq() {
        let q = compile("name", Operator::Eq, Value::from("John")).unwrap();
        assert_eq!(q.sql, "name = ?");
        assert_eq!(q.args, vec![Value::from("John")]);
    }

    #[test]
    fn test_in_has_one_placeholder_per_element() {
        let q = compile("status", Operator::In, Value::from(vec!["active", "pending"])).unwrap();
        assert_eq!(q.sql, "status IN (?, ?)");
        assert_eq!(q.args, vec![Value::from("active"), Value::from("pending")]);

        let q = compile("status", Operator::Nina, Value::from(vec!["x"])).unwrap();
        assert_eq!(q.sql, "status NOT IN (?)");
    }

    #[test]
    fn test_in_rejects_empty_and_scalar_values() {
        let empty = compile("status", Operator::In, Value::List(vec![]));
        assert!(matches!(empty, Err(QueryError::InvalidFilterValue { .. })));

        let scalar = compile("status", Operator::Nin, Value::from("active"));
        assert!(matches!(scalar, Err(QueryError::InvalidFilterValue { .. })));
    }

    #[test]
    fn test_between() {
        let q = compile("age", Operator::Between, Value::from(vec![18, 65])).unwrap();
        assert_eq!(q.sql, "age BETWEEN ? AND ?");
        assert_eq!(q.args, vec![Value::Int(18), Value::Int(65)]);

        let q = compile("age", Operator::NBetween, Value::from(vec![1, 2])).unwrap();
        assert_eq!(q.sql, "age NOT BETWEEN ? AND ?");
    }

    #[test]
    fn test_between_requires_two_values() {
        for val in [Value::from(vec![1]), Value::from(vec![1, 2, 3]), Value::Int(4)] {
            let result = compile("age", Operator::Between, val);
            assert!(matches!(result, Err(QueryError::InvalidFilterValue { .. })));
        }
    }

    #[test]
    fn test_null_binds_nothing() {
        let q = compile("deleted_at", Operator::Null, Value::Null).unwrap();
        assert_eq!(q.sql, "deleted_at IS NULL");
        assert!(q.args.is_empty());

        let q = compile("deleted_at", Operator::NNull, Value::from("ignored")).unwrap();
        assert_eq!(q.sql, "deleted_at IS NOT NULL");
        assert!(q.args.is_empty());
    }

    #[test]
    fn test_eq_null_becomes_is_null() {
        let q = compile("parent_id", Operator::Ne, Value::Null).unwrap();
        assert_eq!(q.sql, "parent_id IS NOT NULL");
        assert!(q.args.is_empty());
    }

    #[test]
    fn test_contains_family() {
        let q = compile("name", Operator::Contains, Value::from("John")).unwrap();
        assert_eq!(q.sql, "name LIKE ?");
        assert_eq!(q.args, vec![Value::from("%John%")]);

        let q = compile("name", Operator::NStartsWith, Value::from("Jo")).unwrap();
        assert_eq!(q.sql, "name NOT LIKE ?");
        assert_eq!(q.args, vec![Value::from("Jo%")]);

        let q = compile("name", Operator::EndsWith, Value::Int(42)).unwrap();
        assert_eq!(q.args, vec![Value::from("%42")]);
    }

    #[test]
    fn test_case_sensitive_variants_per_dialect() {
        let q = compile("name", Operator::ContainsS, Value::from("Jo")).unwrap();
        assert_eq!(q.sql, "name GLOB ?");
        assert_eq!(q.args, vec![Value::from("*Jo*")]);

        let q = compile_with("name", Operator::ContainsS, Value::from("Jo"), &Postgres).unwrap();
        assert_eq!(q.sql, r#""name" LIKE $1"#);
        assert_eq!(q.args, vec![Value::from("%Jo%")]);

        let q = compile_with("name", Operator::Contains, Value::from("Jo"), &Postgres).unwrap();
        assert_eq!(q.sql, r#""name" ILIKE $1"#);

        let q = compile_with("name", Operator::NEndsWithS, Value::from("Jo"), &MySql).unwrap();
        assert_eq!(q.sql, "`name` NOT LIKE ? COLLATE utf8mb4_bin");
    }

    #[test]
    fn test_like_wildcards_in_values_are_escaped() {
        let q = compile("name", Operator::Contains, Value::from("50%_off")).unwrap();
        assert_eq!(q.sql, r"name LIKE ? ESCAPE '\'");
        assert_eq!(q.args, vec![Value::from(r"%50\%\_off%")]);

        let q = compile_with("name", Operator::StartsWith, Value::from("a_b"), &Postgres).unwrap();
        assert_eq!(q.sql, r#""name" ILIKE $1"#);
        assert_eq!(q.args, vec![Value::from(r"a\_b%")]);

        let q = compile("name", Operator::ContainsS, Value::from("50%")).unwrap();
        assert_eq!(q.sql, "name GLOB ?");
        assert_eq!(q.args, vec![Value::from("*50%*")]);
    }

    #[test]
    fn test_comparisons_reject_lists() {
        let result = compile("age", Operator::Gte, Value::from(vec![1, 2]));
        assert!(matches!(result, Err(QueryError::InvalidFilterValue { .. })));
    }

    #[test]
    fn test_field_is_validated() {
        let result = compile("name) OR 1=1 --", Operator::Eq, Value::Int(1));
        assert!(matches!(result, Err(QueryError::InvalidIdentifier(_))));
    }
}
