//! Dialect example
//!
//! Renders the same statement for every supported dialect, in both the
//! parameterized and the inline debug form.

use quarry_compiler::{CompilerOptions, SqlCompiler};
use quarry_core::statement::concat;
use quarry_core::{ArgumentValue, Condition, Dialect, Expression, Operator, RootScope, SortDirection, Value};

fn column(name: &str) -> ArgumentValue {
    Expression::new("{}").arg(name).into()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut scope = RootScope::new("products");
    scope
        .add_condition("title", Operator::Like, "%lamp%")?
        .add_condition("discontinued_at", Operator::Eq, Value::Null)?
        .add(Condition::new("category_id", Operator::In, vec![3, 7, 12])?);

    let dialects = [
        Dialect::Generic,
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Sqlite,
        Dialect::Mssql,
        Dialect::Oracle,
    ];

    for dialect in dialects {
        let compiler = SqlCompiler::with_options(CompilerOptions::new().with_dialect(dialect));
        let mut statement = compiler.compile_select(&scope)?;
        statement
            .field("id")?
            .field_expr(concat(dialect, vec![column("title"), " / ".into(), column("sku")]), Some("label"))?
            .order("title", SortDirection::Asc)
            .limit(20, 40);

        let rendered = statement.render()?;
        println!("=== {} ===", dialect.name());
        println!("  {}", rendered.sql);
        println!("  debug: {}\n", statement.render_debug()?);
    }

    Ok(())
}
