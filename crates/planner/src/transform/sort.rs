use crate::{
    error::QueryError,
    query::ast::{common::OrderDir, select::OrderByExpr},
    transform::identifier,
};
use model::query::{
    context::TransformContext,
    sort::{SortOrder, Sorter},
};

/// Compiles sorters in input order; the first one is the primary sort key.
pub fn compile_sorters(
    sorters: &[Sorter],
    context: &TransformContext,
) -> Result<Vec<OrderByExpr>, QueryError> {
    sorters
        .iter()
        .map(|sorter| {
            Ok(OrderByExpr {
                expr: identifier::column(&sorter.field, context)?,
                direction: Some(match sorter.order {
                    SortOrder::Asc => OrderDir::Asc,
                    SortOrder::Desc => OrderDir::Desc,
                }),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ident;

    #[test]
    fn test_preserves_input_order() {
        let order_by = compile_sorters(
            &[Sorter::asc("name"), Sorter::desc("age")],
            &TransformContext::new(),
        )
        .unwrap();

        assert_eq!(
            order_by,
            vec![
                OrderByExpr {
                    expr: ident("name"),
                    direction: Some(OrderDir::Asc)
                },
                OrderByExpr {
                    expr: ident("age"),
                    direction: Some(OrderDir::Desc)
                },
            ]
        );
    }

    #[test]
    fn test_rejects_invalid_field() {
        let result = compile_sorters(&[Sorter::asc("name desc, 1")], &TransformContext::new());
        assert!(matches!(result, Err(QueryError::InvalidIdentifier(_))));
    }
}
