//! Unit tests for the scope compiler
//!
//! Covers leaf compilation, codecs, path navigation and dialect spelling

use quarry_compiler::{
    CodecMap, ColumnCodec, CompileError, CompilerOptions, ForeignKeys, SqlCompiler,
};
use quarry_core::{
    ComputedValue, Condition, Dialect, Expression, FieldRef, Mode, Operator, RootScope, Scope,
    ScopeParser, ScopeSpec, Statement, Value,
};

fn users(conditions: Vec<Condition>) -> RootScope {
    let mut root = RootScope::new("users");
    for condition in conditions {
        root.add(condition);
    }
    root
}

fn shop() -> SqlCompiler {
    SqlCompiler::new().with_relationships(
        ForeignKeys::new()
            .has_many("users", "orders", "orders", "user_id", "id")
            .has_many("orders", "lines", "order_lines", "order_id", "id"),
    )
}

// =============================================================================
// Leaf compilation
// =============================================================================

#[test]
fn test_null_coercion() {
    let rendered = SqlCompiler::new()
        .compile(&users(vec![Condition::new("deleted_at", Operator::Neq, Value::Null).unwrap()]))
        .unwrap();
    assert_eq!(rendered.sql, r#"select * from "users" where "deleted_at" is not null"#);
    assert!(rendered.params.is_empty());
}

#[test]
fn test_tautology_collapse_every_dialect() {
    let empty: Vec<Value> = vec![];
    for dialect in [
        Dialect::Generic,
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Sqlite,
        Dialect::Mssql,
        Dialect::Oracle,
    ] {
        let compiler = SqlCompiler::with_options(CompilerOptions::new().with_dialect(dialect));
        let never = compiler
            .compile(&users(vec![Condition::new("id", Operator::In, empty.clone()).unwrap()]))
            .unwrap();
        assert!(never.sql.ends_with(" where 1 = 0"), "{dialect}: {}", never.sql);

        let always = compiler
            .compile(&users(vec![Condition::new("id", Operator::NotIn, empty.clone()).unwrap()]))
            .unwrap();
        assert!(always.sql.ends_with(" where 1 = 1"), "{dialect}: {}", always.sql);
    }
}

#[test]
fn test_like_spelling_per_dialect() {
    let root = users(vec![Condition::new("name", Operator::Like, "A%").unwrap()]);
    let pg = SqlCompiler::with_options(CompilerOptions::new().with_dialect(Dialect::Postgres))
        .compile(&root)
        .unwrap();
    assert_eq!(pg.sql, r#"select * from "users" where "name" ilike :a"#);

    let mysql = SqlCompiler::with_options(CompilerOptions::new().with_dialect(Dialect::MySql))
        .compile(&root)
        .unwrap();
    assert_eq!(mysql.sql, "select * from `users` where `name` like :a");

    let sqlite = SqlCompiler::with_options(CompilerOptions::new().with_dialect(Dialect::Sqlite))
        .compile(&root)
        .unwrap();
    assert_eq!(sqlite.sql, r#"select * from "users" where "name" like :a escape '\'"#);
}

#[test]
fn test_negated_scope() {
    let mut scope = Scope::and()
        .push(Condition::eq("a", 1).unwrap())
        .push(Condition::new("b", Operator::Gt, 2).unwrap());
    scope.negate().unwrap();
    let mut root = RootScope::new("t");
    root.add(scope);

    let rendered = SqlCompiler::new().compile(&root).unwrap();
    assert_eq!(rendered.sql, r#"select * from "t" where ("a" != :a or "b" <= :b)"#);
}

#[test]
fn test_computed_value() {
    let declining = ComputedValue::new(|_| None);
    let fixed = ComputedValue::new(|_| Some(Value::from(7)));
    let rendered = SqlCompiler::new()
        .compile(&users(vec![
            Condition::new("a", Operator::Eq, declining).unwrap(),
            Condition::new("b", Operator::Lt, fixed).unwrap(),
        ]))
        .unwrap();
    assert_eq!(rendered.sql, r#"select * from "users" where "b" < :a"#);
    assert_eq!(rendered.param_values(), vec![&Value::from(7)]);
}

#[test]
fn test_expression_fields() {
    let rendered = SqlCompiler::new()
        .compile(&users(vec![
            Condition::expression(Expression::new("{{}} > {{}}").arg("credit").arg("debit")),
            Condition::new(
                FieldRef::from(Expression::new("lower({{}})").arg("name")),
                Operator::Eq,
                "bob",
            )
            .unwrap(),
        ]))
        .unwrap();
    assert_eq!(
        rendered.sql,
        r#"select * from "users" where "credit" > "debit" and lower("name") = :a"#
    );
}

#[test]
fn test_bare_field_is_truthy_check() {
    let rendered = SqlCompiler::new()
        .compile(&users(vec![Condition::bare("is_admin")]))
        .unwrap();
    assert_eq!(rendered.sql, r#"select * from "users" where "is_admin""#);
}

// =============================================================================
// Codecs
// =============================================================================

#[test]
fn test_column_codec() {
    let codecs = CodecMap::new().register(
        "users",
        "active",
        ColumnCodec::new("active", "is_active").with_encoder(|v| match v {
            Value::Bool(b) => Ok(Value::from(if *b { "Y" } else { "N" })),
            other => Err(format!("not a bool: {other}")),
        }),
    );
    let rendered = SqlCompiler::new()
        .with_codecs(codecs)
        .compile(&users(vec![Condition::eq("active", true).unwrap()]))
        .unwrap();
    assert_eq!(rendered.sql, r#"select * from "users" where "is_active" = :a"#);
    assert_eq!(rendered.param_values(), vec![&Value::from("Y")]);
}

#[test]
fn test_strict_codecs_report_statement() {
    let compiler = SqlCompiler::new().with_codecs(CodecMap::new().field("users", "name").strict());
    let err = compiler
        .compile(&users(vec![Condition::eq("email", "x").unwrap()]))
        .unwrap_err();
    match err.root_cause() {
        CompileError::UnknownField { entity, field } => {
            assert_eq!(entity, "users");
            assert_eq!(field, "email");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(err, CompileError::InStatement { .. }));
}

// =============================================================================
// Path navigation
// =============================================================================

#[test]
fn test_hop_becomes_exists() {
    let rendered = shop()
        .compile(&users(vec![Condition::new("orders/total", Operator::Gt, 100).unwrap()]))
        .unwrap();
    assert_eq!(
        rendered.sql,
        r#"select * from "users" where exists (select 1 from "orders" "_o1" where "_o1"."user_id" = "users"."id" and "_o1"."total" > :a)"#
    );
    assert_eq!(rendered.param_values(), vec![&Value::from(100)]);
}

#[test]
fn test_nested_hops() {
    let rendered = shop()
        .compile(&users(vec![Condition::new("orders/lines/qty", Operator::Gte, 5).unwrap()]))
        .unwrap();
    assert_eq!(
        rendered.sql,
        concat!(
            r#"select * from "users" where exists (select 1 from "orders" "_o1" where "_o1"."user_id" = "users"."id" and "#,
            r#"exists (select 1 from "order_lines" "_l2" where "_l2"."order_id" = "_o1"."id" and "_l2"."qty" >= :a))"#
        )
    );
}

#[test]
fn test_count_segment() {
    let compiler = shop();
    let exists = compiler.compile(&users(vec![Condition::bare("orders/#")])).unwrap();
    assert!(exists.sql.ends_with(r#"where exists (select 1 from "orders" "_o1" where "_o1"."user_id" = "users"."id")"#));

    let none = compiler
        .compile(&users(vec![Condition::eq("orders/#", 0).unwrap()]))
        .unwrap();
    assert!(none.sql.contains("where not exists (select 1 from"));
    assert!(none.params.is_empty());

    let at_least_one = compiler
        .compile(&users(vec![Condition::new("orders/#", Operator::Gte, 1).unwrap()]))
        .unwrap();
    assert_eq!(at_least_one.sql, exists.sql);

    let many = compiler
        .compile(&users(vec![Condition::new("orders/#", Operator::Gt, 2).unwrap()]))
        .unwrap();
    assert_eq!(
        many.sql,
        r#"select * from "users" where (select count(*) from "orders" "_o1" where "_o1"."user_id" = "users"."id") > :a"#
    );
    assert_eq!(many.param_values(), vec![&Value::from(2)]);
}

#[test]
fn test_unknown_hop() {
    let err = shop()
        .compile(&users(vec![Condition::eq("friends/name", "x").unwrap()]))
        .unwrap_err();
    assert!(matches!(err.root_cause(), CompileError::UnknownRelationship { hop, .. } if hop == "friends"));
}

// =============================================================================
// Statements and parsed scopes
// =============================================================================

#[test]
fn test_fill_having() {
    let mut statement = Statement::new(Dialect::Generic);
    statement
        .table("orders")
        .unwrap()
        .field("user_id")
        .unwrap()
        .group("user_id");
    let mut having = RootScope::new("orders");
    having.add(Condition::new(FieldRef::from(Expression::new("sum(total)")), Operator::Gt, 50).unwrap());

    SqlCompiler::new().fill_having(&mut statement, &having).unwrap();
    assert_eq!(
        statement.render().unwrap().sql,
        r#"select "user_id" from "orders" group by "user_id" having sum(total) > :a"#
    );
}

#[test]
fn test_fill_where_on_delete() {
    let mut statement = Statement::new(Dialect::Sqlite);
    statement.set_mode(Mode::Delete).unwrap().table("sessions").unwrap();
    let root = users(vec![Condition::new("expires", Operator::Lt, 1000).unwrap()]);
    SqlCompiler::new().fill_where(&mut statement, &root).unwrap();
    assert_eq!(
        statement.render().unwrap().sql,
        r#"delete from "sessions" where "expires" < :a"#
    );
}

#[test]
fn test_compile_parsed_yaml() -> anyhow::Result<()> {
    let spec = ScopeSpec::from_yaml(
        r#"
all:
  - age >= 18
any:
  - status == "open"
  - orders/# > 0
"#,
    )?;
    let root = ScopeParser::new().parse_root("users", &spec)?;
    let rendered = shop().compile(&root)?;
    assert_eq!(
        rendered.sql,
        r#"select * from "users" where "age" >= :a and ("status" = :b or exists (select 1 from "orders" "_o1" where "_o1"."user_id" = "users"."id"))"#
    );
    Ok(())
}
