use crate::{
    error::QueryError,
    query::{ast::expr::Expr, value},
};
use model::{core::value::Value, query::pagination::Pagination};

/// Compiles pagination into `(LIMIT, OFFSET)` operands.
///
/// OFFSET is always present, including `OFFSET 0` for the first page.
pub fn compile_pagination(pagination: Option<&Pagination>) -> Result<Option<(Expr, Expr)>, QueryError> {
    let Some(pagination) = pagination else {
        return Ok(None);
    };

    let Some((limit, offset)) = pagination.window().map_err(QueryError::InvalidPagination)? else {
        return Ok(None);
    };

    Ok(Some((value(to_arg(limit)?), value(to_arg(offset)?))))
}

fn to_arg(n: u64) -> Result<Value, QueryError> {
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| QueryError::InvalidPagination(format!("{n} is out of range")))
}
