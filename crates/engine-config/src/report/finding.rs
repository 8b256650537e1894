use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub code: String,    // stable programmatic id
    pub message: String, // human-readable
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>, // how to fix
}

pub const CODE_EMPTY_SCHEMA: &str = "EMPTY_SCHEMA";
pub const CODE_NO_COLUMNS: &str = "NO_COLUMNS";
pub const CODE_UNKNOWN_TABLE: &str = "UNKNOWN_RELATION_TABLE";
pub const CODE_UNKNOWN_PIVOT: &str = "UNKNOWN_PIVOT_TABLE";
pub const CODE_DUPLICATE_COLUMN: &str = "DUPLICATE_COLUMN";
pub const CODE_RESERVED_COLUMN: &str = "RESERVED_COLUMN";
pub const CODE_DUPLICATE_RELATION: &str = "DUPLICATE_RELATION";
pub const CODE_MISSING_PRIMARY_KEY: &str = "MISSING_PRIMARY_KEY";
pub const CODE_UNDERSCORE_COLUMN: &str = "UNDERSCORE_COLUMN";
pub const CODE_TABLE_NAMING: &str = "TABLE_NAMING";
pub const CODE_CUSTOM_TYPE: &str = "CUSTOM_TYPE";
pub const CODE_MISSING_KEY_COLUMN: &str = "MISSING_RELATION_KEY";

impl Finding {
    pub fn new(
        code: &str,
        message: String,
        severity: Severity,
        table: Option<&str>,
        suggestion: Option<String>,
    ) -> Self {
        Finding {
            code: code.to_string(),
            message,
            severity,
            table: table.map(str::to_string),
            suggestion,
        }
    }

    /// Creates a standardized error finding for a table.
    pub fn error(code: &str, table: &str, message: String) -> Self {
        Finding::new(code, message, Severity::Error, Some(table), None)
    }

    /// Creates a standardized warning finding for a table.
    pub fn warning(code: &str, table: &str, message: String) -> Self {
        Finding::new(code, message, Severity::Warning, Some(table), None)
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    pub fn new_empty_schema() -> Self {
        Self::new(
            CODE_EMPTY_SCHEMA,
            "Schema declares no tables".to_string(),
            Severity::Error,
            None,
            Some("Declare at least one table with its columns.".into()),
        )
    }

    pub fn new_unknown_table(table: &str, relation: &str, target: &str) -> Self {
        Self::error(
            CODE_UNKNOWN_TABLE,
            table,
            format!("Relation `{table}.{relation}` references unknown table `{target}`"),
        )
        .with_suggestion("Declare the target table or fix the relation's table name.")
    }

    pub fn new_unknown_pivot(table: &str, relation: &str, pivot: &str) -> Self {
        Self::error(
            CODE_UNKNOWN_PIVOT,
            table,
            format!("Relation `{table}.{relation}` uses undeclared pivot table `{pivot}`"),
        )
        .with_suggestion("Declare the pivot table with both key columns.")
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
