//! Both backends must agree: the SQL compiled for SQLite selects exactly
//! the rows the in-memory matcher keeps.

use quarry_compiler::{CompilerOptions, SqlCompiler};
use quarry_core::{Condition, Dialect, Operator, RootScope, Row, Scope, ScopeParser, Value};
use quarry_runtime::Matcher;
use regex::Regex;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row as _;

struct Person {
    id: i64,
    name: &'static str,
    nickname: Option<&'static str>,
    code: &'static str,
    age: i64,
    score: f64,
    country: &'static str,
    active: bool,
}

const PEOPLE: &[Person] = &[
    Person { id: 1, name: "Alice", nickname: Some("al"), code: "100%", age: 34, score: 81.5, country: "US", active: true },
    Person { id: 2, name: "Bram", nickname: Some("b"), code: r"100\x", age: 41, score: 47.0, country: "NL", active: true },
    Person { id: 3, name: "carla", nickname: Some("cc"), code: "A_1", age: 16, score: 70.0, country: "BE", active: true },
    Person { id: 4, name: "Dirk", nickname: Some("d"), code: "A-1", age: 52, score: 12.25, country: "BE", active: false },
    Person { id: 5, name: "Eve", nickname: Some("evil"), code: "1000", age: 29, score: 99.0, country: "FR", active: false },
    Person { id: 6, name: "anne", nickname: Some("an"), code: "A_10", age: 30, score: 50.5, country: "NL", active: true },
    Person { id: 7, name: "Gus", nickname: None, code: "100", age: 45, score: 63.0, country: "DE", active: true },
];

fn rows() -> Vec<Row> {
    PEOPLE
        .iter()
        .map(|p| {
            let mut row = Row::new();
            row.insert("id".to_string(), Value::from(p.id));
            row.insert("name".to_string(), Value::from(p.name));
            row.insert("nickname".to_string(), p.nickname.map_or(Value::Null, Value::from));
            row.insert("code".to_string(), Value::from(p.code));
            row.insert("age".to_string(), Value::from(p.age));
            row.insert("score".to_string(), Value::from(p.score));
            row.insert("country".to_string(), Value::from(p.country));
            row.insert("active".to_string(), Value::Bool(p.active));
            row
        })
        .collect()
}

async fn seeded_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query(
        "create table people (
            id integer primary key,
            name text not null,
            nickname text,
            code text not null,
            age integer not null,
            score real not null,
            country text not null,
            active boolean not null
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    for p in PEOPLE {
        sqlx::query("insert into people values (?, ?, ?, ?, ?, ?, ?, ?)")
            .bind(p.id)
            .bind(p.name)
            .bind(p.nickname)
            .bind(p.code)
            .bind(p.age)
            .bind(p.score)
            .bind(p.country)
            .bind(p.active)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool
}

async fn sql_ids(pool: &SqlitePool, scope: &RootScope) -> Vec<i64> {
    let compiler = SqlCompiler::with_options(CompilerOptions::new().with_dialect(Dialect::Sqlite));
    let mut statement = compiler.compile_select(scope).unwrap();
    statement
        .field("id")
        .unwrap()
        .order("id", quarry_core::SortDirection::Asc);
    let rendered = statement.render().unwrap();
    let sql = numbered(&rendered.sql, &rendered.params);

    let mut query = sqlx::query(&sql);
    for value in rendered.param_values() {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => query.bind(*n),
            Value::String(s) => query.bind(s.clone()),
            other => panic!("unexpected parameter {:?} in {}", other, rendered.sql),
        };
    }
    query
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| panic!("{} failed: {}", rendered.sql, e))
        .iter()
        .map(|row| row.get::<i64, _>("id"))
        .collect()
}

/// sqlx binds SQLite parameters by number, so `:b` becomes `?2`
fn numbered(sql: &str, params: &[(String, Value)]) -> String {
    let placeholder = Regex::new(r":([a-z]+)").unwrap();
    placeholder
        .replace_all(sql, |caps: &regex::Captures| {
            let position = params
                .iter()
                .position(|(name, _)| name == &caps[1])
                .unwrap_or_else(|| panic!("unbound placeholder {} in {}", &caps[0], sql));
            format!("?{}", position + 1)
        })
        .into_owned()
}

fn matcher_ids(scope: &RootScope) -> Vec<i64> {
    let rows = rows();
    Matcher::new()
        .filter(&rows, scope)
        .unwrap()
        .into_iter()
        .map(|row| match row["id"] {
            Value::Number(n) => n as i64,
            ref other => panic!("id is {:?}", other),
        })
        .collect()
}

fn parsed(conditions: &[&str]) -> RootScope {
    let mut root = RootScope::new("people");
    root.add(ScopeParser::new().parse_all(conditions).unwrap());
    root
}

async fn assert_agree(pool: &SqlitePool, scope: &RootScope) {
    let from_sql = sql_ids(pool, scope).await;
    let from_memory = matcher_ids(scope);
    assert_eq!(from_sql, from_memory, "backends disagree on {:?}", scope);
}

#[tokio::test]
async fn test_comparison_operators() {
    let pool = seeded_pool().await;
    let cases: &[&[&str]] = &[
        &["age > 30"],
        &["age >= 30"],
        &["age < 30"],
        &["age <= 29"],
        &["score > 50.5"],
        &["name == 'Bram'"],
        &["country != 'NL'"],
        &["active == true"],
        &["active == false", "age > 40"],
        &["age >= 18", "age <= 40", "country != 'US'"],
    ];
    for conditions in cases {
        assert_agree(&pool, &parsed(conditions)).await;
    }
}

#[tokio::test]
async fn test_membership_and_patterns() {
    let pool = seeded_pool().await;
    let cases: &[&[&str]] = &[
        &["country in ['NL', 'BE']"],
        &["country not in ['NL', 'BE']"],
        &["age in [16, 30, 99]"],
        &["name like 'a%'"],
        &["name like '%r%'"],
        &["name not like '%e'"],
        &["nickname like '_'"],
        &["nickname not like '__'"],
    ];
    for conditions in cases {
        assert_agree(&pool, &parsed(conditions)).await;
    }
}

#[tokio::test]
async fn test_null_and_empty_lists() {
    let pool = seeded_pool().await;
    assert_agree(&pool, &parsed(&["nickname == null"])).await;
    assert_agree(&pool, &parsed(&["nickname != null"])).await;

    let empty: Vec<Value> = Vec::new();
    let mut in_empty = RootScope::new("people");
    in_empty.add(Condition::new("id", Operator::In, empty.clone()).unwrap());
    assert_agree(&pool, &in_empty).await;

    let mut not_in_empty = RootScope::new("people");
    not_in_empty.add(Condition::new("id", Operator::NotIn, empty).unwrap());
    assert_agree(&pool, &not_in_empty).await;
}

#[tokio::test]
async fn test_lists_and_patterns_on_null_column() {
    let pool = seeded_pool().await;
    // Scalar `!=` is left out: it is plain negation in memory and unknown in SQL
    let cases: &[&[&str]] = &[
        &["nickname in ['al', 'b']"],
        &["nickname not in ['al', 'b']"],
        &["nickname == ['al', 'b']"],
        &["nickname != ['al', 'b']"],
        &["nickname like 'a%'"],
        &["nickname not like 'a%'"],
    ];
    for conditions in cases {
        assert_agree(&pool, &parsed(conditions)).await;
    }

    let not_in = parsed(&["nickname not in ['al', 'b']"]);
    assert_eq!(sql_ids(&pool, &not_in).await, vec![3, 4, 5, 6]);
}

#[tokio::test]
async fn test_backslash_escapes_in_like() {
    let pool = seeded_pool().await;
    let like = |pattern: &str, operator| {
        let mut root = RootScope::new("people");
        root.add(Condition::new("code", operator, pattern).unwrap());
        root
    };

    let percent = like(r"100\%", Operator::Like);
    assert_eq!(sql_ids(&pool, &percent).await, vec![1]);
    assert_agree(&pool, &percent).await;

    let backslash = like(r"100\\x", Operator::Like);
    assert_eq!(sql_ids(&pool, &backslash).await, vec![2]);
    assert_agree(&pool, &backslash).await;

    assert_agree(&pool, &like(r"A\_1", Operator::Like)).await;
    assert_agree(&pool, &like(r"A\_1%", Operator::NotLike)).await;
    assert_agree(&pool, &like("100_", Operator::Like)).await;
}

#[tokio::test]
async fn test_nested_junctions() {
    let pool = seeded_pool().await;
    let parser = ScopeParser::new();

    // (active and (country in NL/BE or (age > 40 and score < 50)))
    let inner = parser.parse_all(&["age > 40", "score < 50"]).unwrap();
    let middle = Scope::or()
        .push(parser.parse_condition("country in ['NL', 'BE']").unwrap())
        .push(inner.clone());
    let mut root = RootScope::new("people");
    root.add(parser.parse_condition("active == true").unwrap()).add(middle.clone());
    assert_agree(&pool, &root).await;

    let mut negated = middle;
    negated.negate().unwrap();
    let mut root = RootScope::new("people");
    root.add(negated);
    assert_agree(&pool, &root).await;

    let mut root = RootScope::new("people");
    root.add(
        Scope::or()
            .push(inner)
            .push(parser.parse_any(&["name like 'e%'", "nickname == 'an'"]).unwrap()),
    );
    assert_agree(&pool, &root).await;
}

#[tokio::test]
async fn test_empty_scope_selects_everything() {
    let pool = seeded_pool().await;
    let root = RootScope::new("people");
    assert_eq!(sql_ids(&pool, &root).await, vec![1, 2, 3, 4, 5, 6, 7]);
    assert_agree(&pool, &root).await;
}
