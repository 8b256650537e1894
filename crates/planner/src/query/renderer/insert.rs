use crate::query::{
    ast::insert::Insert,
    renderer::{Render, Renderer},
};

impl Render for Insert {
    fn render(&self, r: &mut Renderer) {
        // 1. INSERT INTO table (...)
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.push_identifier(column);
        }
        r.sql.push(')');

        // 2. VALUES (...), (...)
        r.sql.push_str(" VALUES ");
        for (i, row) in self.values.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.sql.push('(');
            r.render_list(row, ", ");
            r.sql.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{common::TableRef, insert::Insert},
        dialect::{Postgres, Sqlite},
        renderer::{Render, Renderer},
        value,
    };
    use model::core::value::Value;

    fn batch_insert() -> Insert {
        Insert {
            table: TableRef::parse("users"),
            columns: vec!["name".to_string(), "is_active".to_string()],
            values: vec![
                vec![value(Value::from("Alice")), value(Value::Boolean(true))],
                vec![value(Value::from("Bob")), value(Value::Boolean(false))],
            ],
        }
    }

    #[test]
    fn test_render_batch_insert_postgres() {
        let mut renderer = Renderer::new(&Postgres);
        batch_insert().render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(
            sql,
            r#"INSERT INTO "users" ("name", "is_active") VALUES ($1, $2), ($3, $4)"#
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_render_batch_insert_sqlite() {
        let mut renderer = Renderer::new(&Sqlite);
        batch_insert().render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(sql, "INSERT INTO users (name, is_active) VALUES (?, ?), (?, ?)");
        assert_eq!(params[2], Value::from("Bob"));
    }
}
