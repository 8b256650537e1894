use crate::report::{
    ValidationReport,
    finding::{
        CODE_CUSTOM_TYPE, CODE_DUPLICATE_COLUMN, CODE_DUPLICATE_RELATION,
        CODE_MISSING_KEY_COLUMN, CODE_MISSING_PRIMARY_KEY, CODE_NO_COLUMNS, CODE_RESERVED_COLUMN,
        CODE_TABLE_NAMING, CODE_UNDERSCORE_COLUMN, Finding,
    },
};
use model::schema::{
    relation::{RelationDef, RelationKind},
    table::{Schema, TableDef},
};
use std::collections::HashSet;
use tracing::info;

/// Column name that used to carry relation metadata inside the column map.
pub const RESERVED_META_COLUMN: &str = "_meta";

/// Structural checks over a declared schema.
///
/// Validation is a pure function of the schema: findings come out in table
/// declaration order, so running it twice yields the same report.
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
    findings: Vec<Finding>,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            findings: Vec::new(),
        }
    }

    pub fn validate(schema: &Schema) -> ValidationReport {
        let mut validator = SchemaValidator::new(schema);
        validator.run();

        let report = ValidationReport::from_findings(validator.findings);
        info!(
            tables = schema.len(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Schema validation finished"
        );
        report
    }

    fn run(&mut self) {
        if self.schema.is_empty() {
            self.findings.push(Finding::new_empty_schema());
            return;
        }

        for (name, table) in self.schema.tables() {
            self.check_table_name(name);
            self.check_columns(name, table);
            self.check_primary_key(name, table);
            self.check_relations(name, table);
        }
    }

    fn check_table_name(&mut self, table: &str) {
        if !is_snake_case(table) {
            self.findings.push(
                Finding::warning(
                    CODE_TABLE_NAMING,
                    table,
                    format!("Table name `{table}` is not snake_case"),
                )
                .with_suggestion("Use lowercase letters, digits and underscores."),
            );
        }
    }

    fn check_columns(&mut self, table: &str, def: &TableDef) {
        if def.columns.is_empty() {
            self.findings.push(Finding::error(
                CODE_NO_COLUMNS,
                table,
                format!("Table `{table}` declares no columns"),
            ));
            return;
        }

        let mut seen = HashSet::new();
        for column in &def.columns {
            let name = column.name.as_str();

            if !seen.insert(name.to_lowercase()) {
                self.findings.push(Finding::error(
                    CODE_DUPLICATE_COLUMN,
                    table,
                    format!("Column `{table}.{name}` is declared more than once"),
                ));
            }

            if name == RESERVED_META_COLUMN {
                self.findings.push(
                    Finding::error(
                        CODE_RESERVED_COLUMN,
                        table,
                        format!("Column name `{name}` on `{table}` is reserved"),
                    )
                    .with_suggestion("Declare relations in the table's relation list instead."),
                );
            } else if name.starts_with('_') {
                self.findings.push(Finding::warning(
                    CODE_UNDERSCORE_COLUMN,
                    table,
                    format!("Column `{table}.{name}` starts with an underscore"),
                ));
            }

            if column.data_type.is_custom() {
                self.findings.push(Finding::warning(
                    CODE_CUSTOM_TYPE,
                    table,
                    format!(
                        "Column `{table}.{name}` has unrecognised type `{}`",
                        column.data_type
                    ),
                ));
            }
        }
    }

    fn check_primary_key(&mut self, table: &str, def: &TableDef) {
        if !def.columns.is_empty() && def.primary_key().is_none() {
            self.findings.push(
                Finding::warning(
                    CODE_MISSING_PRIMARY_KEY,
                    table,
                    format!("Table `{table}` has no detectable primary key"),
                )
                .with_suggestion("Flag a column as primary key or add an `id` column."),
            );
        }
    }

    fn check_relations(&mut self, table: &str, def: &TableDef) {
        let mut seen = HashSet::new();
        for relation in &def.relations {
            if !seen.insert(relation.name.as_str()) {
                self.findings.push(Finding::error(
                    CODE_DUPLICATE_RELATION,
                    table,
                    format!("Relation `{table}.{}` is declared more than once", relation.name),
                ));
            }

            let resolvable = self.check_relation_tables(table, relation);
            if resolvable {
                self.check_relation_keys(table, def, relation);
            }
        }
    }

    /// Returns false when a referenced table is missing.
    fn check_relation_tables(&mut self, table: &str, relation: &RelationDef) -> bool {
        let mut resolvable = true;

        if let RelationKind::BelongsToMany { pivot, .. } = &relation.kind {
            if !self.schema.contains(&pivot.table) {
                self.findings
                    .push(Finding::new_unknown_pivot(table, &relation.name, &pivot.table));
                resolvable = false;
            }
        }

        let targets = match &relation.kind {
            RelationKind::BelongsToMany { related_table, .. } => vec![related_table.as_str()],
            other => other.referenced_tables(),
        };
        for target in targets {
            if !self.schema.contains(target) {
                self.findings
                    .push(Finding::new_unknown_table(table, &relation.name, target));
                resolvable = false;
            }
        }

        resolvable
    }

    fn check_relation_keys(&mut self, table: &str, def: &TableDef, relation: &RelationDef) {
        let mut missing: Vec<(String, String)> = relation
            .kind
            .owner_columns()
            .into_iter()
            .filter(|column| def.find_column(column).is_none())
            .map(|column| (table.to_string(), column.to_string()))
            .collect();

        for (other, column) in relation.kind.foreign_columns() {
            let declared = self
                .schema
                .table(other)
                .is_some_and(|t| t.find_column(column).is_some());
            if !declared {
                missing.push((other.to_string(), column.to_string()));
            }
        }

        for (other, column) in missing {
            self.findings.push(Finding::warning(
                CODE_MISSING_KEY_COLUMN,
                table,
                format!(
                    "Relation `{table}.{}` ({}) uses undeclared column `{other}.{column}`",
                    relation.name,
                    relation.kind.type_name()
                ),
            ));
        }
    }
}

fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
