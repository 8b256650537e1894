use crate::query::ast::expr::{Expr, Ident};
use model::core::value::Value;

pub mod ast;
pub mod builder;
pub mod compiled;
pub mod dialect;
pub mod renderer;

/// Builds an identifier expression, splitting off a `table.` qualifier.
pub fn ident(name: &str) -> Expr {
    let (qualifier, name) = match name.rsplit_once('.') {
        Some((qualifier, name)) => (Some(qualifier.to_string()), name.to_string()),
        None => (None, name.to_string()),
    };
    Expr::Identifier(Ident { qualifier, name })
}

pub fn value(val: Value) -> Expr {
    Expr::Value(val)
}
