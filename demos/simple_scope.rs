//! Simple scope example
//!
//! This example demonstrates:
//! - Parsing a scope from YAML
//! - Compiling it to parameterized SQL
//! - Matching the same scope against rows in memory

use quarry_compiler::SqlCompiler;
use quarry_core::{Row, ScopeParser, ScopeSpec, Value};
use quarry_runtime::Matcher;

const ACTIVE_ADULTS: &str = r#"
all:
  - age >= 18
  - active == true
any:
  - country in ['NL', 'BE']
  - name like 'A%'
"#;

fn user(name: &str, age: i64, country: &str, active: bool) -> Row {
    let mut row = Row::new();
    row.insert("name".to_string(), Value::from(name));
    row.insert("age".to_string(), Value::from(age));
    row.insert("country".to_string(), Value::from(country));
    row.insert("active".to_string(), Value::Bool(active));
    row
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quarry_compiler=debug".parse()?)
                .add_directive("quarry_runtime=debug".parse()?),
        )
        .init();

    println!("=== Simple Scope Example ===\n");

    let spec = ScopeSpec::from_yaml(ACTIVE_ADULTS)?;
    let scope = ScopeParser::new().parse_root("users", &spec)?;

    let rendered = SqlCompiler::new().compile(&scope)?;
    println!("SQL:\n  {}", rendered.sql);
    println!("Params:");
    for (name, value) in &rendered.params {
        println!("  :{} = {}", name, value);
    }

    let rows = vec![
        user("Alice", 34, "US", true),
        user("Bram", 41, "NL", true),
        user("Carla", 16, "BE", true),
        user("Dirk", 52, "BE", false),
    ];
    let matched = Matcher::new().filter(&rows, &scope)?;

    println!("\nMatched rows:");
    for row in matched {
        println!("  {}", row["name"]);
    }

    Ok(())
}
