use crate::query::{
    ast::expr::{BinaryOp, Expr, FunctionCall, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => ident.render(r),
            Expr::Value(val) => r.add_param(val.clone()),
            Expr::Wildcard => r.sql.push('*'),
            Expr::BinaryOp(op) => op.render(r),
            Expr::Logical { op, children } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        r.sql.push(' ');
                        r.sql.push_str(op.as_sql());
                        r.sql.push(' ');
                    }
                    if matches!(child, Expr::Logical { .. }) {
                        r.sql.push('(');
                        child.render(r);
                        r.sql.push(')');
                    } else {
                        child.render(r);
                    }
                }
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                expr.render(r);
                r.sql.push_str(if *negated { " NOT IN (" } else { " IN (" });
                r.render_list(list, ", ");
                r.sql.push(')');
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                expr.render(r);
                r.sql
                    .push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                low.render(r);
                r.sql.push_str(" AND ");
                high.render(r);
            }
            Expr::IsNull { expr, negated } => {
                expr.render(r);
                r.sql
                    .push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::Like {
                expr,
                pattern,
                case_sensitive,
                negated,
                escaped,
            } => {
                expr.render(r);
                r.sql.push(' ');
                if *negated {
                    r.sql.push_str("NOT ");
                }
                r.sql.push_str(r.dialect.like_keyword(*case_sensitive));
                r.sql.push(' ');
                pattern.render(r);
                if let Some(collation) = r.dialect.like_collation(*case_sensitive) {
                    r.sql.push_str(" COLLATE ");
                    r.sql.push_str(collation);
                }
                if let Some(escape) = r.dialect.like_escape(*case_sensitive).filter(|_| *escaped) {
                    r.sql.push_str(" ESCAPE '");
                    r.sql.push_str(escape);
                    r.sql.push('\'');
                }
            }
            Expr::FunctionCall(func) => func.render(r),
            Expr::Alias { expr, alias } => {
                expr.render(r);
                r.sql.push_str(" AS ");
                r.push_identifier(alias);
            }
        }
    }
}

impl Render for Ident {
    fn render(&self, r: &mut Renderer) {
        if let Some(qualifier) = &self.qualifier {
            r.push_identifier(qualifier);
            r.sql.push('.');
        }
        r.push_identifier(&self.name);
    }
}

impl Render for BinaryOp {
    fn render(&self, r: &mut Renderer) {
        self.left.render(r);
        r.sql.push(' ');
        r.sql.push_str(self.op.as_sql());
        r.sql.push(' ');
        self.right.render(r);
    }
}

impl Render for FunctionCall {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(&self.name);
        r.sql.push('(');
        if self.wildcard {
            r.sql.push('*');
        } else {
            r.render_list(&self.args, ", ");
        }
        r.sql.push(')');
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::expr::{BinaryOperator, Expr, LogicalOperator},
        dialect::{MySql, Postgres, Sqlite},
        ident,
        renderer::{Render, Renderer},
        value,
    };
    use model::core::value::Value;

    fn render(expr: &Expr, dialect: &dyn crate::query::dialect::Dialect) -> (String, Vec<Value>) {
        let mut renderer = Renderer::new(dialect);
        expr.render(&mut renderer);
        renderer.finish()
    }

    #[test]
    fn test_nested_logical_is_parenthesized() {
        let expr = Expr::Logical {
            op: LogicalOperator::And,
            children: vec![
                Expr::binary(ident("name"), BinaryOperator::Eq, value(Value::from("John"))),
                Expr::Logical {
                    op: LogicalOperator::Or,
                    children: vec![
                        Expr::binary(ident("age"), BinaryOperator::Lt, value(Value::Int(30))),
                        Expr::binary(ident("age"), BinaryOperator::Gt, value(Value::Int(60))),
                    ],
                },
            ],
        };

        let (sql, params) = render(&expr, &Sqlite);
        assert_eq!(sql, "name = ? AND (age < ? OR age > ?)");
        assert_eq!(params, vec![Value::from("John"), Value::Int(30), Value::Int(60)]);
    }

    #[test]
    fn test_like_per_dialect() {
        let like = Expr::Like {
            expr: Box::new(ident("title")),
            pattern: Box::new(value(Value::from("%rust%"))),
            case_sensitive: true,
            negated: true,
            escaped: false,
        };

        assert_eq!(render(&like, &Postgres).0, r#""title" NOT LIKE $1"#);
        assert_eq!(
            render(&like, &MySql).0,
            "`title` NOT LIKE ? COLLATE utf8mb4_bin"
        );
        assert_eq!(render(&like, &Sqlite).0, "title NOT GLOB ?");
    }

    #[test]
    fn test_escaped_like_declares_escape_on_sqlite() {
        let like = Expr::Like {
            expr: Box::new(ident("title")),
            pattern: Box::new(value(Value::from(r"%5\%%"))),
            case_sensitive: false,
            negated: false,
            escaped: true,
        };

        assert_eq!(render(&like, &Sqlite).0, r"title LIKE ? ESCAPE '\'");
        assert_eq!(render(&like, &Postgres).0, r#""title" ILIKE $1"#);
    }

    #[test]
    fn test_qualified_identifier_postgres() {
        let (sql, _) = render(&ident("users.name"), &Postgres);
        assert_eq!(sql, r#""users"."name""#);
    }
}
