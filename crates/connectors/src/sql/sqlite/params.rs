use crate::error::DbError;
use model::{core::value::Value, records::record::Record};
use sqlx::{
    Column, Row, Sqlite, TypeInfo, ValueRef,
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
};

/// Binds positional arguments.
///
/// SQLite has no native date, uuid or json types, so those travel as text;
/// nested lists and records are bound as their JSON encoding.
pub fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for p in params {
        query = match p {
            Value::Int(i) => query.bind(*i),
            Value::Uint(u) => match i64::try_from(*u) {
                Ok(i) => query.bind(i),
                Err(_) => query.bind(u.to_string()),
            },
            Value::Float(f) => query.bind(*f),
            Value::String(s) => query.bind(s.clone()),
            Value::Boolean(b) => query.bind(*b),
            Value::Json(j) => query.bind(j.to_string()),
            Value::Uuid(u) => query.bind(u.to_string()),
            Value::Bytes(b) => query.bind(b.clone()),
            Value::Date(d) => query.bind(d.to_string()),
            Value::Timestamp(t) => query.bind(t.to_rfc3339()),
            Value::List(_) | Value::Record(_) => query.bind(serde_json::Value::from(p).to_string()),
            Value::Null => query.bind(None::<String>),
        };
    }
    query
}

/// Reads a row by the storage class of each cell, since SQLite columns may be
/// declared without a type.
pub fn decode_row(row: &SqliteRow) -> Result<Record, DbError> {
    let mut record = Record::new();
    for column in row.columns() {
        let i = column.ordinal();
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => Value::Int(row.try_get_unchecked::<i64, _>(i)?),
                "REAL" => Value::Float(row.try_get_unchecked::<f64, _>(i)?),
                "BLOB" => Value::Bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                _ => Value::String(row.try_get_unchecked::<String, _>(i)?),
            }
        };
        record.insert(column.name(), value);
    }
    Ok(record)
}
