//! Filter a small stream of trade records with one compiled predicate.
//!
//! Run with `cargo run --example filter_demo`; set `RUST_LOG=rulegate=debug`
//! to watch the cache compile once and hit afterwards.

use rulegate::eval_predicate;
use rulegate::value::{DataType, Value};
use tracing_subscriber::EnvFilter;

fn trade(symbol: &str, price: f32, qty: u32) -> Value {
    Value::tuple(vec![
        ("symbol", Value::rstring(symbol)),
        ("price", Value::Float32(price)),
        ("qty", Value::UInt32(qty)),
        (
            "marks",
            Value::list(
                DataType::Int32,
                vec![Value::Int32(3), Value::Int32(7), Value::Int32(9)],
            ),
        ),
    ])
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let expression = "(symbol startsWith 'IN') && (price <= 100.0) && (qty % 2 == 0)";
    let stream = vec![
        trade("INTC", 97.5, 10),
        trade("IBM", 120.0, 4),
        trade("INFY", 18.25, 7),
        trade("INTU", 55.0, 2),
    ];

    println!("predicate: {expression}");
    for record in &stream {
        match eval_predicate(expression, record, false) {
            Ok(true) => println!("  pass  {record}"),
            Ok(false) => println!("  drop  {record}"),
            Err(code) => println!("  error {code} ({})", code.code()),
        }
    }
}
