use crate::{core::data_type::DataType, schema::relation::RelationDef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared tables keyed by resource name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: IndexMap<String, TableDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: TableDef) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    pub fn insert(&mut self, name: &str, table: TableDef) -> Option<TableDef> {
        self.tables.insert(name.to_string(), table)
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &TableDef)> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn from_json(json: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }
}

impl TableDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: &str, data_type: DataType) -> Self {
        self.columns.push(ColumnDef::new(name, data_type));
        self
    }

    pub fn primary(mut self, name: &str, data_type: DataType) -> Self {
        let mut column = ColumnDef::new(name, data_type);
        column.primary_key = true;
        column.nullable = false;
        self.columns.push(column);
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// The flagged primary key, falling back to a column named `id`.
    pub fn primary_key(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .or_else(|| self.columns.iter().find(|c| c.name == "id"))
            .map(|c| c.name.as_str())
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn find_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }
}

impl ColumnDef {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            primary_key: false,
            nullable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_from_json_keeps_declaration_order() {
        let schema = Schema::from_json(json!({
            "users": {"columns": [{"name": "id", "type": "INTEGER", "primaryKey": true}]},
            "posts": {
                "columns": [
                    {"name": "id", "type": "INTEGER"},
                    {"name": "user_id", "type": "integer", "nullable": false}
                ],
                "relations": [
                    {"name": "author", "type": "belongsTo", "relatedTable": "users", "foreignKey": "user_id"}
                ]
            }
        }))
        .unwrap();

        let names: Vec<_> = schema.tables().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["users", "posts"]);

        let posts = schema.table("posts").unwrap();
        assert_eq!(posts.primary_key(), Some("id"));
        assert!(!posts.find_column("user_id").unwrap().nullable);
        assert!(posts.find_relation("author").is_some());
    }

    #[test]
    fn test_schema_from_str_keeps_declaration_order() {
        let schema: Schema = serde_json::from_str(
            r#"{"zebras": {"columns": [{"name": "id", "type": "INTEGER"}]},
                "apes": {"columns": [{"name": "id", "type": "INTEGER"}]}}"#,
        )
        .unwrap();
        let names: Vec<_> = schema.tables().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["zebras", "apes"]);
    }

    #[test]
    fn test_flagged_primary_key_wins_over_id() {
        let table = TableDef::new()
            .column("id", DataType::Integer)
            .primary("uuid", DataType::Uuid);
        assert_eq!(table.primary_key(), Some("uuid"));
        assert_eq!(TableDef::new().column("name", DataType::Text).primary_key(), None);
    }
}
