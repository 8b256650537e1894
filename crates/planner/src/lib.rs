//! Compiles Refine-style filters, sorters and pagination into parameterized SQL.
//!
//! The free functions use the SQLite dialect, which is what every embedded
//! backend (D1, bun:sqlite, node:sqlite, better-sqlite3) speaks. Use a
//! [`QueryTransformer`] to target PostgreSQL or MySQL.

pub mod error;
pub mod query;
pub mod transform;
pub mod transformer;

pub use error::QueryError;
pub use query::compiled::CompiledQuery;
pub use transformer::{QueryTransformer, SelectOptions};

use model::query::{
    context::TransformContext, filter::Filter, pagination::Pagination, sort::Sorter,
};

fn transformer(context: Option<&TransformContext>) -> QueryTransformer {
    let transformer = QueryTransformer::default();
    match context {
        Some(context) => transformer.with_context(context.clone()),
        None => transformer,
    }
}

/// `None` (or an empty list) compiles to no condition.
pub fn transform_filters(
    filters: Option<&[Filter]>,
    context: Option<&TransformContext>,
) -> Result<Option<CompiledQuery>, QueryError> {
    match filters {
        Some(filters) => transformer(context).transform_filters(filters),
        None => Ok(None),
    }
}

pub fn transform_sorting(
    sorters: Option<&[Sorter]>,
    context: Option<&TransformContext>,
) -> Result<Option<CompiledQuery>, QueryError> {
    match sorters {
        Some(sorters) => transformer(context).transform_sorting(sorters),
        None => Ok(None),
    }
}

pub fn transform_pagination(
    pagination: Option<&Pagination>,
) -> Result<Option<CompiledQuery>, QueryError> {
    transformer(None).transform_pagination(pagination)
}
