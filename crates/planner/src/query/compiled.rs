use crate::query::{
    dialect::Dialect,
    renderer::{Render, Renderer},
};
use model::core::value::Value;
use serde::Serialize;

/// A SQL text paired with its positional arguments, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// Renders any AST node with `dialect`.
    pub fn render<N: Render + ?Sized>(node: &N, dialect: &dyn Dialect) -> Self {
        let mut renderer = Renderer::new(dialect);
        node.render(&mut renderer);
        let (sql, args) = renderer.finish();
        Self { sql, args }
    }

    /// Number of `?` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl std::fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -- {} arg(s)", self.sql, self.args.len())
    }
}
