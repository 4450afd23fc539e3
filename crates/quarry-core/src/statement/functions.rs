//! Dialect-aware SQL function helpers

use super::templates::GROUP_CONCAT;
use crate::dialect::Dialect;
use crate::expr::{ArgumentValue, Expression};

/// String concatenation of `parts`, each rendered as a parameter or
/// sub-expression.
pub fn concat(dialect: Dialect, parts: Vec<ArgumentValue>) -> Expression {
    let tags = vec!["[]"; parts.len()];
    let template = match dialect {
        Dialect::MySql => format!("concat({})", tags.join(", ")),
        Dialect::Mssql => tags.join(" + "),
        _ => tags.join(" || "),
    };
    Expression::with_args(template, parts).wrapped()
}

/// Aggregate `field` values of a group into one delimited string
pub fn group_concat(dialect: Dialect, field: impl Into<ArgumentValue>, delimiter: &str) -> Expression {
    Expression::new(GROUP_CONCAT.resolve(dialect))
        .named("field", field)
        .named("delimiter", delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_spelling() {
        let parts = || vec![ArgumentValue::from("a"), ArgumentValue::from("b")];
        assert_eq!(
            concat(Dialect::Sqlite, parts()).render(Dialect::Sqlite).unwrap().sql,
            ":a || :b"
        );
        assert_eq!(
            concat(Dialect::MySql, parts()).render(Dialect::MySql).unwrap().sql,
            "concat(:a, :b)"
        );
    }

    #[test]
    fn test_group_concat_spelling() {
        let pg = group_concat(Dialect::Postgres, "name", ",").render(Dialect::Postgres).unwrap();
        assert_eq!(pg.sql, r#"string_agg("name", :a)"#);

        let mysql = group_concat(Dialect::MySql, "name", ",").render(Dialect::MySql).unwrap();
        assert_eq!(mysql.sql, "group_concat(`name` separator :a)");
    }
}
