//! Assembles complete statements from a table name and Refine query inputs.

use crate::{
    error::QueryError,
    query::{
        ast::{
            delete::Delete,
            expr::Expr,
            insert::Insert,
            update::{Assignment, Update},
        },
        builder::select::SelectBuilder,
        compiled::CompiledQuery,
        dialect::{Dialect, dialect_for},
        renderer::{Render, Renderer},
        value,
    },
    transform::{
        identifier, logical::compile_filters, pagination::compile_pagination,
        sort::compile_sorters,
    },
};
use model::{
    core::{data_type::SqlDialect, value::Value},
    query::{context::TransformContext, filter::Filter, pagination::Pagination, sort::Sorter},
    records::record::Record,
};
use tracing::debug;

/// Inputs of a SELECT. An empty `columns` list selects `*`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub sorters: Vec<Sorter>,
    pub pagination: Option<Pagination>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn sorters(mut self, sorters: Vec<Sorter>) -> Self {
        self.sorters = sorters;
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

/// Compiles query inputs for one dialect.
///
/// Holds no per-query state, so one instance can serve concurrent requests.
#[derive(Clone)]
pub struct QueryTransformer {
    dialect: &'static dyn Dialect,
    context: TransformContext,
}

impl Default for QueryTransformer {
    fn default() -> Self {
        Self::new(SqlDialect::Sqlite)
    }
}

impl std::fmt::Debug for QueryTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTransformer")
            .field("dialect", &self.dialect.name())
            .field("context", &self.context)
            .finish()
    }
}

impl QueryTransformer {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect: dialect_for(dialect),
            context: TransformContext::default(),
        }
    }

    pub fn with_context(mut self, context: TransformContext) -> Self {
        self.context = context;
        self
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn context(&self) -> &TransformContext {
        &self.context
    }

    /// Compiles a WHERE predicate (without the `WHERE` keyword).
    pub fn transform_filters(&self, filters: &[Filter]) -> Result<Option<CompiledQuery>, QueryError> {
        Ok(self
            .where_expr(filters)?
            .map(|expr| CompiledQuery::render(&expr, self.dialect)))
    }

    /// Compiles `ORDER BY ...`, or `None` for no sorters.
    pub fn transform_sorting(&self, sorters: &[Sorter]) -> Result<Option<CompiledQuery>, QueryError> {
        let order_by = compile_sorters(sorters, &self.context)?;
        if order_by.is_empty() {
            return Ok(None);
        }

        let mut r = Renderer::new(self.dialect);
        r.sql.push_str("ORDER BY ");
        r.render_list(&order_by, ", ");
        let (sql, args) = r.finish();
        Ok(Some(CompiledQuery { sql, args }))
    }

    /// Compiles `LIMIT ? OFFSET ?`, or `None` when pagination is absent or off.
    pub fn transform_pagination(
        &self,
        pagination: Option<&Pagination>,
    ) -> Result<Option<CompiledQuery>, QueryError> {
        let Some((limit, offset)) = compile_pagination(pagination)? else {
            return Ok(None);
        };

        let mut r = Renderer::new(self.dialect);
        r.sql.push_str("LIMIT ");
        limit.render(&mut r);
        r.sql.push_str(" OFFSET ");
        offset.render(&mut r);
        let (sql, args) = r.finish();
        Ok(Some(CompiledQuery { sql, args }))
    }

    pub fn build_select_query(
        &self,
        table: &str,
        options: &SelectOptions,
    ) -> Result<CompiledQuery, QueryError> {
        let columns = options
            .columns
            .iter()
            .map(|c| identifier::column(c, &self.context))
            .collect::<Result<Vec<_>, _>>()?;

        let ast = SelectBuilder::new()
            .select(columns)
            .from(identifier::table(table)?, None)
            .where_clause(self.where_expr(&options.filters)?)
            .order_by_all(compile_sorters(&options.sorters, &self.context)?)
            .window(compile_pagination(options.pagination.as_ref())?)
            .build();

        Ok(self.finish("SELECT", table, &ast))
    }

    /// `SELECT COUNT(*) AS total FROM ...` sharing the list query's WHERE.
    pub fn build_count_query(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> Result<CompiledQuery, QueryError> {
        let count = Expr::Alias {
            expr: Box::new(Expr::count_star()),
            alias: "total".to_string(),
        };

        let ast = SelectBuilder::new()
            .select(vec![count])
            .from(identifier::table(table)?, None)
            .where_clause(self.where_expr(filters)?)
            .build();

        Ok(self.finish("COUNT", table, &ast))
    }

    /// Columns and placeholders follow the record's field order.
    pub fn build_insert_query(&self, table: &str, values: &Record) -> Result<CompiledQuery, QueryError> {
        self.build_insert_many_query(table, std::slice::from_ref(values))
    }

    /// Multi-row INSERT. Every row must carry the first row's columns.
    pub fn build_insert_many_query(
        &self,
        table: &str,
        rows: &[Record],
    ) -> Result<CompiledQuery, QueryError> {
        let first = rows
            .first()
            .filter(|row| !row.is_empty())
            .ok_or_else(|| QueryError::EmptyValues {
                statement: "INSERT",
                table: table.to_string(),
            })?;

        let columns: Vec<String> = first.keys().cloned().collect();
        for column in &columns {
            identifier::validate_identifier(column)?;
        }

        let mut values = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() || !columns.iter().all(|c| row.contains(c)) {
                return Err(QueryError::InconsistentRows {
                    table: table.to_string(),
                    row: i,
                });
            }
            values.push(
                columns
                    .iter()
                    .map(|c| value(bindable(row.get_value(c))))
                    .collect(),
            );
        }

        let ast = Insert {
            table: identifier::table(table)?,
            columns,
            values,
        };
        Ok(self.finish("INSERT", table, &ast))
    }

    /// SET arguments come before WHERE arguments.
    pub fn build_update_query(
        &self,
        table: &str,
        values: &Record,
        filters: &[Filter],
    ) -> Result<CompiledQuery, QueryError> {
        if values.is_empty() {
            return Err(QueryError::EmptyValues {
                statement: "UPDATE",
                table: table.to_string(),
            });
        }

        let assignments = values
            .iter()
            .map(|(column, val)| {
                identifier::validate_identifier(column)?;
                Ok(Assignment {
                    column: column.clone(),
                    value: value(bindable(val.clone())),
                })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        let ast = Update {
            table: identifier::table(table)?,
            assignments,
            where_clause: Some(self.required_where("UPDATE", table, filters)?),
        };
        Ok(self.finish("UPDATE", table, &ast))
    }

    pub fn build_delete_query(&self, table: &str, filters: &[Filter]) -> Result<CompiledQuery, QueryError> {
        let ast = Delete {
            table: identifier::table(table)?,
            where_clause: Some(self.required_where("DELETE", table, filters)?),
        };
        Ok(self.finish("DELETE", table, &ast))
    }

    fn where_expr(&self, filters: &[Filter]) -> Result<Option<Expr>, QueryError> {
        compile_filters(filters, &self.context, self.dialect)
    }

    fn required_where(
        &self,
        statement: &'static str,
        table: &str,
        filters: &[Filter],
    ) -> Result<Expr, QueryError> {
        self.where_expr(filters)?
            .ok_or_else(|| QueryError::MissingWhereClause {
                statement,
                table: table.to_string(),
            })
    }

    fn finish<N: Render>(&self, statement: &str, table: &str, ast: &N) -> CompiledQuery {
        let query = CompiledQuery::render(ast, self.dialect);
        debug!(
            statement,
            table,
            sql = %query.sql,
            args = query.args.len(),
            "Compiled query"
        );
        query
    }
}

/// Nested values are bound as JSON text columns.
fn bindable(val: Value) -> Value {
    match val {
        Value::List(_) | Value::Record(_) => Value::Json(serde_json::Value::from(&val)),
        other => other,
    }
}
