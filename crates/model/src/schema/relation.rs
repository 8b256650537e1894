use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn default_key() -> String {
    "id".to_string()
}

/// A named association declared on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: RelationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RelationKind {
    /// `related.foreign_key = this.local_key`, at most one row.
    HasOne {
        related_table: String,
        foreign_key: String,
        #[serde(default = "default_key")]
        local_key: String,
    },
    /// `related.foreign_key = this.local_key`, any number of rows.
    HasMany {
        related_table: String,
        foreign_key: String,
        #[serde(default = "default_key")]
        local_key: String,
    },
    /// `this.foreign_key = related.related_key`.
    BelongsTo {
        related_table: String,
        foreign_key: String,
        #[serde(default = "default_key")]
        related_key: String,
    },
    /// Joined through a pivot table.
    BelongsToMany {
        related_table: String,
        pivot: PivotDef,
        #[serde(default = "default_key")]
        local_key: String,
        #[serde(default = "default_key")]
        related_key: String,
    },
    Polymorphic(PolymorphicDef),
}

/// Pivot table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotDef {
    pub table: String,
    /// Pivot column pointing at the owning row.
    pub foreign_key: String,
    /// Pivot column pointing at the related row.
    pub related_key: String,
}

/// Target table chosen per row by `type_field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolymorphicDef {
    pub type_field: String,
    pub id_field: String,
    /// Discriminator value -> table name.
    pub targets: IndexMap<String, String>,
    #[serde(default = "default_key")]
    pub target_key: String,
}

impl RelationDef {
    pub fn new(name: &str, kind: RelationKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    pub fn has_one(name: &str, related_table: &str, foreign_key: &str) -> Self {
        Self::new(
            name,
            RelationKind::HasOne {
                related_table: related_table.to_string(),
                foreign_key: foreign_key.to_string(),
                local_key: default_key(),
            },
        )
    }

    pub fn has_many(name: &str, related_table: &str, foreign_key: &str) -> Self {
        Self::new(
            name,
            RelationKind::HasMany {
                related_table: related_table.to_string(),
                foreign_key: foreign_key.to_string(),
                local_key: default_key(),
            },
        )
    }

    pub fn belongs_to(name: &str, related_table: &str, foreign_key: &str) -> Self {
        Self::new(
            name,
            RelationKind::BelongsTo {
                related_table: related_table.to_string(),
                foreign_key: foreign_key.to_string(),
                related_key: default_key(),
            },
        )
    }

    pub fn belongs_to_many(name: &str, related_table: &str, pivot: PivotDef) -> Self {
        Self::new(
            name,
            RelationKind::BelongsToMany {
                related_table: related_table.to_string(),
                pivot,
                local_key: default_key(),
                related_key: default_key(),
            },
        )
    }

    pub fn polymorphic(name: &str, def: PolymorphicDef) -> Self {
        Self::new(name, RelationKind::Polymorphic(def))
    }
}

impl RelationKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            RelationKind::HasOne { .. } => "hasOne",
            RelationKind::HasMany { .. } => "hasMany",
            RelationKind::BelongsTo { .. } => "belongsTo",
            RelationKind::BelongsToMany { .. } => "belongsToMany",
            RelationKind::Polymorphic(_) => "polymorphic",
        }
    }

    /// To-many relations resolve to a list, the rest to a single row or null.
    pub fn is_to_many(&self) -> bool {
        matches!(
            self,
            RelationKind::HasMany { .. } | RelationKind::BelongsToMany { .. }
        )
    }

    /// Every table the relation reads from, pivot tables included.
    pub fn referenced_tables(&self) -> Vec<&str> {
        match self {
            RelationKind::HasOne { related_table, .. }
            | RelationKind::HasMany { related_table, .. }
            | RelationKind::BelongsTo { related_table, .. } => vec![related_table.as_str()],
            RelationKind::BelongsToMany {
                related_table,
                pivot,
                ..
            } => vec![pivot.table.as_str(), related_table.as_str()],
            RelationKind::Polymorphic(def) => def.targets.values().map(String::as_str).collect(),
        }
    }

    /// The table the resolved rows come from. `None` for polymorphic relations,
    /// whose target depends on each row.
    pub fn target_table(&self) -> Option<&str> {
        match self {
            RelationKind::HasOne { related_table, .. }
            | RelationKind::HasMany { related_table, .. }
            | RelationKind::BelongsTo { related_table, .. }
            | RelationKind::BelongsToMany { related_table, .. } => Some(related_table.as_str()),
            RelationKind::Polymorphic(_) => None,
        }
    }

    /// Columns the relation reads from the owning row.
    pub fn owner_columns(&self) -> Vec<&str> {
        match self {
            RelationKind::HasOne { local_key, .. }
            | RelationKind::HasMany { local_key, .. }
            | RelationKind::BelongsToMany { local_key, .. } => vec![local_key.as_str()],
            RelationKind::BelongsTo { foreign_key, .. } => vec![foreign_key.as_str()],
            RelationKind::Polymorphic(def) => vec![def.type_field.as_str(), def.id_field.as_str()],
        }
    }

    /// `(table, column)` pairs the relation reads from other tables.
    pub fn foreign_columns(&self) -> Vec<(&str, &str)> {
        match self {
            RelationKind::HasOne {
                related_table,
                foreign_key,
                ..
            }
            | RelationKind::HasMany {
                related_table,
                foreign_key,
                ..
            } => vec![(related_table.as_str(), foreign_key.as_str())],
            RelationKind::BelongsTo {
                related_table,
                related_key,
                ..
            } => vec![(related_table.as_str(), related_key.as_str())],
            RelationKind::BelongsToMany {
                related_table,
                pivot,
                related_key,
                ..
            } => vec![
                (pivot.table.as_str(), pivot.foreign_key.as_str()),
                (pivot.table.as_str(), pivot.related_key.as_str()),
                (related_table.as_str(), related_key.as_str()),
            ],
            RelationKind::Polymorphic(def) => def
                .targets
                .values()
                .map(|table| (table.as_str(), def.target_key.as_str()))
                .collect(),
        }
    }
}
