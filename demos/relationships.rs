//! Relationship example
//!
//! Conditions reaching into related tables through `/` paths:
//! - `orders/total > 100` becomes a correlated `exists` subquery
//! - `orders/#` compares the number of related rows
//! - A bare `orders/#` checks that any related row exists

use quarry_compiler::{ForeignKeys, SqlCompiler};
use quarry_core::{Condition, Operator, RootScope, Scope};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quarry_compiler=debug".parse()?),
        )
        .init();

    let compiler = SqlCompiler::new().with_relationships(
        ForeignKeys::new()
            .has_many("customers", "orders", "orders", "customer_id", "id")
            .has_many("orders", "lines", "order_lines", "order_id", "id")
            .has_one("orders", "coupon", "coupons", "id", "coupon_id"),
    );

    let mut big_spenders = RootScope::new("customers");
    big_spenders.add_condition("orders/total", Operator::Gt, 100)?;
    show(&compiler, "Customers with an order over 100", &big_spenders)?;

    let mut regulars = RootScope::new("customers");
    regulars.add_condition("orders/#", Operator::Gte, 5)?;
    show(&compiler, "Customers with at least five orders", &regulars)?;

    let mut never_ordered = RootScope::new("customers");
    never_ordered.add(Condition::new("orders/#", Operator::Eq, 0)?);
    show(&compiler, "Customers without orders", &never_ordered)?;

    let mut discounted = RootScope::new("customers");
    discounted.add(
        Scope::or()
            .push(Condition::new("orders/coupon/percent", Operator::Gte, 50)?)
            .push(Condition::new("orders/lines/sku", Operator::Like, "GIFT-%")?),
    );
    show(&compiler, "Customers with a big coupon or a gift line", &discounted)?;

    let mut any_order = RootScope::new("customers");
    any_order.add(Condition::bare("orders/#"));
    show(&compiler, "Customers with any order", &any_order)?;

    Ok(())
}

fn show(compiler: &SqlCompiler, title: &str, scope: &RootScope) -> anyhow::Result<()> {
    let statement = compiler.compile_select(scope)?;
    println!("=== {} ===", title);
    println!("  {}\n", statement.render_debug()?);
    Ok(())
}
