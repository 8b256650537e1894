//! Defines the AST for SQL expressions.

use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column identifier, e.g. `name` or `users.name`.
    Identifier(Ident),

    /// A bound value. Always rendered as a placeholder.
    Value(Value),

    /// `*`
    Wildcard,

    /// A comparison, e.g. `age >= ?`.
    BinaryOp(Box<BinaryOp>),

    /// Children joined by AND/OR. A nested group is parenthesized.
    Logical {
        op: LogicalOperator,
        children: Vec<Expr>,
    },

    /// `expr [NOT] IN (?, ?, ...)`
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// `expr [NOT] BETWEEN ? AND ?`
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expr>, negated: bool },

    /// Pattern match; the dialect decides the keyword and collation.
    ///
    /// `escaped` is set when the pattern carries backslash escapes.
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        case_sensitive: bool,
        negated: bool,
        escaped: bool,
    },

    /// A function call, e.g. `COUNT(*)`.
    FunctionCall(FunctionCall),

    /// `expr AS alias`
    Alias { expr: Box<Expr>, alias: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 'users' in 'users.id'
    pub name: String,              // e.g., the 'id' in 'users.id'
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub wildcard: bool, // represents the '*' in 'COUNT(*)'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,    // =
    NotEq, // <>
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }

    /// Joins `children` with `op`, collapsing a single child to itself.
    /// Returns `None` when there is nothing to join.
    pub fn logical(op: LogicalOperator, mut children: Vec<Expr>) -> Option<Self> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(Expr::Logical { op, children }),
        }
    }

    pub fn count_star() -> Self {
        Expr::FunctionCall(FunctionCall {
            name: "COUNT".to_string(),
            args: Vec::new(),
            wildcard: true,
        })
    }
}

impl BinaryOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
        }
    }
}

impl LogicalOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}
