use crate::query::{
    ast::{
        common::OrderDir,
        select::{FromClause, OrderByExpr, Select},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("SELECT ");
        r.render_list(&self.columns, ", ");

        if let Some(from) = &self.from {
            r.sql.push(' ');
            from.render(r);
        }

        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }

        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            r.render_list(&self.order_by, ", ");
        }

        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }

        if let Some(offset) = &self.offset {
            r.sql.push_str(" OFFSET ");
            offset.render(r);
        }
    }
}

impl Render for FromClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("FROM ");
        r.render_table_ref(&self.table);
        if let Some(alias) = &self.alias {
            r.sql.push_str(" AS ");
            r.push_identifier(alias);
        }
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        if let Some(dir) = &self.direction {
            r.sql.push_str(match dir {
                OrderDir::Asc => " ASC",
                OrderDir::Desc => " DESC",
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::{OrderDir, TableRef},
            expr::{BinaryOperator, Expr},
            select::{FromClause, OrderByExpr, Select},
        },
        dialect::{MySql, Postgres},
        ident,
        renderer::{Render, Renderer},
        value,
    };
    use model::core::value::Value;

    fn users_select() -> Select {
        Select {
            columns: vec![ident("id"), ident("name")],
            from: Some(FromClause {
                table: TableRef::parse("users"),
                alias: None,
            }),
            where_clause: Some(Expr::binary(
                ident("status"),
                BinaryOperator::NotEq,
                value(Value::from("inactive")),
            )),
            order_by: vec![OrderByExpr {
                expr: ident("created_at"),
                direction: Some(OrderDir::Desc),
            }],
            limit: Some(value(Value::Int(10))),
            offset: Some(value(Value::Int(20))),
        }
    }

    #[test]
    fn test_select_postgres() {
        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        users_select().render(&mut renderer);
        let (sql, params) = renderer.finish();

        let expected_sql = r#"SELECT "id", "name" FROM "users" WHERE "status" <> $1 ORDER BY "created_at" DESC LIMIT $2 OFFSET $3"#;
        assert_eq!(sql, expected_sql);
        assert_eq!(
            params,
            vec![Value::from("inactive"), Value::Int(10), Value::Int(20)]
        );
    }

    #[test]
    fn test_select_mysql() {
        let dialect = MySql;
        let mut renderer = Renderer::new(&dialect);
        users_select().render(&mut renderer);
        let (sql, _) = renderer.finish();

        assert_eq!(
            sql,
            "SELECT `id`, `name` FROM `users` WHERE `status` <> ? ORDER BY `created_at` DESC LIMIT ? OFFSET ?"
        );
    }
}
