use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt, str::FromStr};

/// Column storage classes understood across the supported backends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Integer,
    BigInt,
    Real,
    Numeric,
    Text,
    VarChar,
    Boolean,
    Date,
    Time,
    Timestamp,
    Json,
    Blob,
    Uuid,
    Null,
    Custom(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Sqlite,
    MySql,
    Postgres,
}

impl SqlDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::MySql => "mysql",
            SqlDialect::Postgres => "postgres",
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "d1" => Ok(SqlDialect::Sqlite),
            "mysql" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
            other => Err(format!("unsupported SQL dialect: {other}")),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

lazy_static! {
    static ref TYPE_MAP: HashMap<&'static str, DataType> = build_type_map();
}

impl DataType {
    /// Parses a declared column type (`INTEGER`, `varchar(255)`, `TIMESTAMPTZ`...).
    ///
    /// Unknown names are preserved as `Custom` so that vendor specific types
    /// survive a round trip.
    pub fn from_sql_type(type_name: &str) -> Self {
        let normalized = Self::normalize_type_name(type_name);
        TYPE_MAP
            .get(normalized.as_str())
            .cloned()
            .unwrap_or_else(|| DataType::Custom(type_name.trim().to_string()))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, DataType::Custom(_))
    }

    /// The dialect-neutral spelling, which `from_sql_type` parses back.
    pub fn canonical_name(&self) -> Cow<'_, str> {
        match self {
            DataType::Integer => Cow::Borrowed("INTEGER"),
            DataType::BigInt => Cow::Borrowed("BIGINT"),
            DataType::Real => Cow::Borrowed("REAL"),
            DataType::Numeric => Cow::Borrowed("NUMERIC"),
            DataType::Text => Cow::Borrowed("TEXT"),
            DataType::VarChar => Cow::Borrowed("VARCHAR"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Time => Cow::Borrowed("TIME"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            DataType::Json => Cow::Borrowed("JSON"),
            DataType::Blob => Cow::Borrowed("BLOB"),
            DataType::Uuid => Cow::Borrowed("UUID"),
            DataType::Null => Cow::Borrowed("NULL"),
            DataType::Custom(name) => Cow::Borrowed(name),
        }
    }

    pub fn sql_name(&self, dialect: SqlDialect) -> Cow<'_, str> {
        match dialect {
            SqlDialect::Sqlite => self.sqlite_name(),
            SqlDialect::MySql => self.mysql_name(),
            SqlDialect::Postgres => self.postgres_name(),
        }
    }

    pub fn sqlite_name(&self) -> Cow<'_, str> {
        match self {
            DataType::Integer | DataType::BigInt | DataType::Boolean => Cow::Borrowed("INTEGER"),
            DataType::Real => Cow::Borrowed("REAL"),
            DataType::Numeric => Cow::Borrowed("NUMERIC"),
            DataType::Text
            | DataType::VarChar
            | DataType::Date
            | DataType::Time
            | DataType::Timestamp
            | DataType::Json
            | DataType::Uuid => Cow::Borrowed("TEXT"),
            DataType::Blob => Cow::Borrowed("BLOB"),
            DataType::Null => Cow::Borrowed("NULL"),
            DataType::Custom(name) => Cow::Borrowed(name),
        }
    }

    pub fn mysql_name(&self) -> Cow<'_, str> {
        match self {
            DataType::Integer => Cow::Borrowed("INT"),
            DataType::BigInt => Cow::Borrowed("BIGINT"),
            DataType::Real => Cow::Borrowed("DOUBLE"),
            DataType::Numeric => Cow::Borrowed("DECIMAL"),
            DataType::Text => Cow::Borrowed("TEXT"),
            DataType::VarChar => Cow::Borrowed("VARCHAR"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Time => Cow::Borrowed("TIME"),
            DataType::Timestamp => Cow::Borrowed("DATETIME"),
            DataType::Json => Cow::Borrowed("JSON"),
            DataType::Blob => Cow::Borrowed("BLOB"),
            DataType::Uuid => Cow::Borrowed("CHAR(36)"),
            DataType::Null => Cow::Borrowed("NULL"),
            DataType::Custom(name) => Cow::Borrowed(name),
        }
    }

    pub fn postgres_name(&self) -> Cow<'_, str> {
        match self {
            DataType::Integer => Cow::Borrowed("INTEGER"),
            DataType::BigInt => Cow::Borrowed("BIGINT"),
            DataType::Real => Cow::Borrowed("DOUBLE PRECISION"),
            DataType::Numeric => Cow::Borrowed("NUMERIC"),
            DataType::Text => Cow::Borrowed("TEXT"),
            DataType::VarChar => Cow::Borrowed("VARCHAR"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Time => Cow::Borrowed("TIME"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMPTZ"),
            DataType::Json => Cow::Borrowed("JSONB"),
            DataType::Blob => Cow::Borrowed("BYTEA"),
            DataType::Uuid => Cow::Borrowed("UUID"),
            DataType::Null => Cow::Borrowed("NULL"),
            DataType::Custom(name) => Cow::Borrowed(name),
        }
    }

    /// Strips length/precision modifiers and normalizes case, e.g.
    /// `varchar(255)` becomes `VARCHAR`.
    fn normalize_type_name(type_name: &str) -> String {
        let base = match type_name.find('(') {
            Some(idx) => &type_name[..idx],
            None => type_name,
        };
        base.trim().to_uppercase()
    }
}

impl From<String> for DataType {
    fn from(s: String) -> Self {
        DataType::from_sql_type(&s)
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.canonical_name().into_owned()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

fn build_type_map() -> HashMap<&'static str, DataType> {
    use DataType::*;

    let entries = [
        ("INTEGER", Integer),
        ("INT", Integer),
        ("INT4", Integer),
        ("SMALLINT", Integer),
        ("TINYINT", Integer),
        ("MEDIUMINT", Integer),
        ("BIGINT", BigInt),
        ("INT8", BigInt),
        ("SERIAL", Integer),
        ("BIGSERIAL", BigInt),
        ("REAL", Real),
        ("FLOAT", Real),
        ("FLOAT4", Real),
        ("FLOAT8", Real),
        ("DOUBLE", Real),
        ("DOUBLE PRECISION", Real),
        ("NUMERIC", Numeric),
        ("DECIMAL", Numeric),
        ("TEXT", Text),
        ("STRING", Text),
        ("CLOB", Text),
        ("TINYTEXT", Text),
        ("MEDIUMTEXT", Text),
        ("LONGTEXT", Text),
        ("VARCHAR", VarChar),
        ("CHARACTER VARYING", VarChar),
        ("CHAR", VarChar),
        ("CHARACTER", VarChar),
        ("BOOLEAN", Boolean),
        ("BOOL", Boolean),
        ("DATE", Date),
        ("TIME", Time),
        ("TIMESTAMP", Timestamp),
        ("TIMESTAMPTZ", Timestamp),
        ("DATETIME", Timestamp),
        ("JSON", Json),
        ("JSONB", Json),
        ("BLOB", Blob),
        ("BYTEA", Blob),
        ("BINARY", Blob),
        ("VARBINARY", Blob),
        ("UUID", Uuid),
        ("NULL", Null),
    ];

    let mut map = HashMap::new();
    for (name, data_type) in entries {
        map.insert(name, data_type);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_modifiers_and_case() {
        assert_eq!(DataType::from_sql_type("varchar(255)"), DataType::VarChar);
        assert_eq!(DataType::from_sql_type(" integer "), DataType::Integer);
        assert_eq!(DataType::from_sql_type("timestamptz"), DataType::Timestamp);
    }

    #[test]
    fn test_unknown_types_are_kept_verbatim() {
        let data_type = DataType::from_sql_type("geography");
        assert!(data_type.is_custom());
        assert_eq!(data_type.sqlite_name(), "geography");
    }

    #[test]
    fn test_canonical_names_parse_back() {
        for data_type in [DataType::Json, DataType::Uuid, DataType::Timestamp, DataType::BigInt] {
            assert_eq!(DataType::from_sql_type(&data_type.canonical_name()), data_type);
        }
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!(DataType::Json.sql_name(SqlDialect::Postgres), "JSONB");
        assert_eq!(DataType::Json.sql_name(SqlDialect::Sqlite), "TEXT");
        assert_eq!(DataType::Timestamp.sql_name(SqlDialect::MySql), "DATETIME");
    }

    #[test]
    fn test_dialect_names_parse() {
        assert_eq!("PostgreSQL".parse::<SqlDialect>(), Ok(SqlDialect::Postgres));
        assert_eq!("d1".parse::<SqlDialect>(), Ok(SqlDialect::Sqlite));
        assert!("oracle".parse::<SqlDialect>().is_err());
    }
}
