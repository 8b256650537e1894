use crate::{
    error::QueryError,
    query::{ast::common::TableRef, ast::expr::Expr, ident},
};
use model::query::context::TransformContext;

/// Accepts `[A-Za-z0-9_]` segments joined by single dots.
pub fn validate_identifier(name: &str) -> Result<(), QueryError> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier(name.to_string()))
    }
}

/// Resolves `field` through the context and validates the physical name.
pub fn column(field: &str, context: &TransformContext) -> Result<Expr, QueryError> {
    let physical = context.resolve(field);
    validate_identifier(physical)?;
    Ok(ident(physical))
}

pub fn table(name: &str) -> Result<TableRef, QueryError> {
    validate_identifier(name)?;
    Ok(TableRef::parse(name))
}
