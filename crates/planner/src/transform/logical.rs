//! Combines compiled predicates with AND/OR, recursing into nested groups.

use crate::{
    error::QueryError,
    query::{
        ast::expr::{Expr, LogicalOperator},
        dialect::Dialect,
    },
    transform::predicate::compile_predicate,
};
use model::query::{
    context::TransformContext,
    filter::{Combinator, Filter},
};

/// Compiles a top-level filter list, whose siblings are joined with AND.
///
/// Returns `None` when nothing compiles to a condition, including lists made
/// only of empty groups.
pub fn compile_filters(
    filters: &[Filter],
    context: &TransformContext,
    dialect: &dyn Dialect,
) -> Result<Option<Expr>, QueryError> {
    compile_group(LogicalOperator::And, filters, context, dialect)
}

fn compile_group(
    op: LogicalOperator,
    filters: &[Filter],
    context: &TransformContext,
    dialect: &dyn Dialect,
) -> Result<Option<Expr>, QueryError> {
    let mut children = Vec::with_capacity(filters.len());
    for filter in filters {
        if let Some(expr) = compile_filter(filter, context, dialect)? {
            children.push(expr);
        }
    }
    Ok(Expr::logical(op, children))
}

fn compile_filter(
    filter: &Filter,
    context: &TransformContext,
    dialect: &dyn Dialect,
) -> Result<Option<Expr>, QueryError> {
    match filter {
        Filter::Logical(leaf) => {
            compile_predicate(&leaf.field, leaf.operator, &leaf.value, context, dialect).map(Some)
        }
        Filter::Conditional(group) => {
            let op = match group.operator {
                Combinator::And => LogicalOperator::And,
                Combinator::Or => LogicalOperator::Or,
            };
            compile_group(op, &group.value, context, dialect)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{compiled::CompiledQuery, dialect::Sqlite};
    use model::{core::value::Value, query::filter::Operator};

    fn compile(filters: &[Filter]) -> Option<CompiledQuery> {
        compile_filters(filters, &TransformContext::new(), &Sqlite)
            .unwrap()
            .map(|expr| CompiledQuery::render(&expr, &Sqlite))
    }

    #[test]
    fn test_nested_or_is_parenthesized() {
        let filter = Filter::and(vec![
            Filter::eq("name", "John"),
            Filter::or(vec![Filter::lt("age", 30), Filter::gt("age", 60)]),
        ]);

        let q = compile(&[filter]).unwrap();
        assert_eq!(q.sql, "name = ? AND (age < ? OR age > ?)");
        assert_eq!(q.args, vec![Value::from("John"), Value::Int(30), Value::Int(60)]);
    }

    #[test]
    fn test_top_level_siblings_join_with_and() {
        let q = compile(&[
            Filter::eq("status", "published"),
            Filter::or(vec![Filter::contains("title", "rust"), Filter::is_null("title")]),
        ])
        .unwrap();

        assert_eq!(q.sql, "status = ? AND (title LIKE ? OR title IS NULL)");
        assert_eq!(q.args, vec![Value::from("published"), Value::from("%rust%")]);
    }

    #[test]
    fn test_single_child_group_is_not_parenthesized() {
        let q = compile(&[
            Filter::eq("a", 1),
            Filter::or(vec![Filter::eq("b", 2)]),
        ])
        .unwrap();
        assert_eq!(q.sql, "a = ? AND b = ?");
    }

    #[test]
    fn test_empty_groups_short_circuit() {
        assert!(compile(&[]).is_none());
        assert!(compile(&[Filter::and(vec![]), Filter::or(vec![Filter::and(vec![])])]).is_none());

        let q = compile(&[Filter::or(vec![]), Filter::eq("id", 3)]).unwrap();
        assert_eq!(q.sql, "id = ?");
    }

    #[test]
    fn test_args_follow_placeholder_order() {
        let q = compile(&[Filter::or(vec![
            Filter::and(vec![Filter::gte("age", 18), Filter::lte("age", 30)]),
            Filter::in_list("role", vec![Value::from("admin"), Value::from("owner")]),
        ])])
        .unwrap();

        assert_eq!(q.sql, "(age >= ? AND age <= ?) OR role IN (?, ?)");
        assert_eq!(q.placeholder_count(), q.args.len());
        assert_eq!(
            q.args,
            vec![
                Value::Int(18),
                Value::Int(30),
                Value::from("admin"),
                Value::from("owner")
            ]
        );
    }

    #[test]
    fn test_errors_in_nested_leaves_propagate() {
        let bad_between = Filter::leaf("age", Operator::Between, Value::Int(1));
        let result = compile_filters(
            &[Filter::or(vec![Filter::eq("ok", 1), bad_between])],
            &TransformContext::new(),
            &Sqlite,
        );
        assert!(matches!(result, Err(QueryError::InvalidFilterValue { .. })));
    }
}
