//! Defines the `Dialect` trait for database-specific SQL syntax.

use lazy_static::lazy_static;
use model::{core::data_type::SqlDialect, query::filter::TextMatch};
use std::collections::HashSet;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    ///
    /// - SQLite leaves plain identifiers bare: `my_column`
    /// - PostgreSQL uses double quotes: `"my_column"`
    /// - MySQL uses backticks: `` `my_column` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for a parameterized query.
    ///
    /// - SQLite and MySQL use `?`
    /// - PostgreSQL uses `$1`, `$2`, etc.
    fn get_placeholder(&self, index: usize) -> String;

    /// Returns the name of the dialect (e.g., "PostgreSQL", "MySQL").
    fn name(&self) -> String;

    fn kind(&self) -> SqlDialect;

    /// The pattern-match keyword for text operators.
    fn like_keyword(&self, case_sensitive: bool) -> &'static str;

    /// Collation appended after the pattern operand, if any.
    fn like_collation(&self, _case_sensitive: bool) -> Option<&'static str> {
        None
    }

    /// Wraps `text` in wildcards for the given match kind. `%`, `_` and `\`
    /// in `text` are escaped with a backslash.
    fn like_pattern(&self, text: &str, kind: TextMatch, _case_sensitive: bool) -> String {
        wrap_pattern(&escape_like(text), kind, '%')
    }

    /// `ESCAPE` character to declare after the pattern. `None` where the
    /// backslash is already the default escape.
    fn like_escape(&self, _case_sensitive: bool) -> Option<&'static str> {
        None
    }
}

/// Whether `text` holds characters that [`Dialect::like_pattern`] escapes.
pub fn needs_like_escape(text: &str) -> bool {
    text.contains(['%', '_', '\\'])
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Returns the dialect implementation for `kind`.
pub fn dialect_for(kind: SqlDialect) -> &'static dyn Dialect {
    match kind {
        SqlDialect::Sqlite => &Sqlite,
        SqlDialect::Postgres => &Postgres,
        SqlDialect::MySql => &MySql,
    }
}

fn wrap_pattern(text: &str, kind: TextMatch, wildcard: char) -> String {
    match kind {
        TextMatch::Contains => format!("{wildcard}{text}{wildcard}"),
        TextMatch::StartsWith => format!("{text}{wildcard}"),
        TextMatch::EndsWith => format!("{wildcard}{text}"),
    }
}

lazy_static! {
    static ref SQLITE_KEYWORDS: HashSet<&'static str> = [
        "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "AND", "AS", "ASC", "BEFORE",
        "BEGIN", "BETWEEN", "BY", "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "COMMIT",
        "CONSTRAINT", "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
        "ELSE", "END", "ESCAPE", "EXCEPT", "EXISTS", "FOREIGN", "FROM", "FULL", "GLOB",
        "GROUP", "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTERSECT", "INTO", "IS",
        "JOIN", "KEY", "LEFT", "LIKE", "LIMIT", "MATCH", "NATURAL", "NOT", "NULL", "OF",
        "OFFSET", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES", "REGEXP", "REPLACE",
        "RIGHT", "ROLLBACK", "ROW", "SELECT", "SET", "TABLE", "THEN", "TO", "TRANSACTION",
        "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
    ]
    .into_iter()
    .collect();
}

/// SQLite and its embedded variants (D1, bun:sqlite, node:sqlite, better-sqlite3).
#[derive(Debug, Clone, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn quote_identifier(&self, ident: &str) -> String {
        // Identifiers are validated before they get here; only keywords need quotes.
        if SQLITE_KEYWORDS.contains(ident.to_ascii_uppercase().as_str()) {
            format!(r#""{ident}""#)
        } else {
            ident.to_string()
        }
    }

    fn get_placeholder(&self, _index: usize) -> String {
        "?".into()
    }

    fn name(&self) -> String {
        "SQLite".into()
    }

    fn kind(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    fn like_keyword(&self, case_sensitive: bool) -> &'static str {
        if case_sensitive { "GLOB" } else { "LIKE" }
    }

    fn like_pattern(&self, text: &str, kind: TextMatch, case_sensitive: bool) -> String {
        if !case_sensitive {
            return wrap_pattern(&escape_like(text), kind, '%');
        }
        // GLOB metacharacters match literally inside a bracket expression.
        let escaped: String = text
            .chars()
            .map(|c| match c {
                '*' | '?' | '[' => format!("[{c}]"),
                other => other.to_string(),
            })
            .collect();
        wrap_pattern(&escaped, kind, '*')
    }

    fn like_escape(&self, case_sensitive: bool) -> Option<&'static str> {
        // LIKE has no default escape character; GLOB escapes with brackets.
        (!case_sensitive).then_some("\\")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{ident}""#)
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }

    fn kind(&self) -> SqlDialect {
        SqlDialect::Postgres
    }

    fn like_keyword(&self, case_sensitive: bool) -> &'static str {
        if case_sensitive { "LIKE" } else { "ILIKE" }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#"`{ident}`"#)
    }

    fn get_placeholder(&self, _index: usize) -> String {
        // MySQL uses ?
        "?".into()
    }

    fn name(&self) -> String {
        "MySQL".into()
    }

    fn kind(&self) -> SqlDialect {
        SqlDialect::MySql
    }

    fn like_keyword(&self, _case_sensitive: bool) -> &'static str {
        "LIKE"
    }

    fn like_collation(&self, case_sensitive: bool) -> Option<&'static str> {
        case_sensitive.then_some("utf8mb4_bin")
    }
}
