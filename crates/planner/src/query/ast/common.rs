//! Defines common, reusable AST nodes for building SQL queries.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    /// Splits `schema.table` into its parts; a bare name has no schema.
    pub fn parse(name: &str) -> Self {
        match name.split_once('.') {
            Some((schema, table)) => TableRef {
                schema: Some(schema.to_string()),
                name: table.to_string(),
            },
            None => TableRef {
                schema: None,
                name: name.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}
