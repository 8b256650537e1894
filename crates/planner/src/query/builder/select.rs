//! A typestate builder for `Select` ASTs.
//!
//! The marker types keep clauses in SQL order at compile time:
//! `select` must come before `from`, and the optional clauses only after it.

use crate::query::ast::{
    common::{OrderDir, TableRef},
    expr::Expr,
    select::{FromClause, OrderByExpr, Select},
};

/// The initial state of the builder before any clauses have been added.
#[derive(Debug, Default, Clone)]
pub struct InitialState;

/// The state after the `SELECT` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct SelectState;

/// The state after the `FROM` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct FromState;

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    ast: Select,
    #[allow(dead_code)]
    state: State,
}

impl Default for SelectBuilder<InitialState> {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectBuilder<InitialState> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            state: InitialState,
        }
    }

    /// Adds a `SELECT` clause. An empty list selects `*`.
    pub fn select(mut self, columns: Vec<Expr>) -> SelectBuilder<SelectState> {
        self.ast.columns = if columns.is_empty() {
            vec![Expr::Wildcard]
        } else {
            columns
        };
        SelectBuilder {
            ast: self.ast,
            state: SelectState,
        }
    }
}

impl SelectBuilder<SelectState> {
    pub fn from(mut self, table: TableRef, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.ast.from = Some(FromClause {
            table,
            alias: alias.map(String::from),
        });
        SelectBuilder {
            ast: self.ast,
            state: FromState,
        }
    }
}

impl SelectBuilder<FromState> {
    /// Sets the `WHERE` condition; `None` leaves the query unfiltered.
    pub fn where_clause(mut self, condition: Option<Expr>) -> Self {
        self.ast.where_clause = condition;
        self
    }

    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    pub fn order_by_all(mut self, order_by: Vec<OrderByExpr>) -> Self {
        self.ast.order_by.extend(order_by);
        self
    }

    /// Sets `LIMIT` and `OFFSET` together.
    pub fn window(mut self, window: Option<(Expr, Expr)>) -> Self {
        if let Some((limit, offset)) = window {
            self.ast.limit = Some(limit);
            self.ast.offset = Some(offset);
        }
        self
    }

    /// Finalizes and returns the constructed `Select` AST.
    pub fn build(self) -> Select {
        self.ast
    }
}
