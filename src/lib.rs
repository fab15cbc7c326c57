//! # Rulegate Predicate Engine
//!
//! A rule-evaluation engine for streamed tuples: given a textual predicate
//! expression and a strongly-typed record, decide whether the record
//! satisfies the predicate. Built to sit inside a stream-processing
//! operator where the *same* expression is evaluated against millions of
//! distinct records, so parsing cost is paid once per expression per
//! thread.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! (expression, tuple)
//!     ↓
//! [SchemaFormatter]   → canonical tuple schema string
//!     ↓
//! [PlanCache]         → hit: reuse plan (schema-identity guarded)
//!     ↓ miss
//! [SchemaParser]      → ordered dotted.path → type map
//!     ↓
//! [Validator]         → type-checked EvaluationPlan
//!     ↓
//! [Evaluator]         → boolean (short-circuiting at every level)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rulegate::eval_predicate;
//! use rulegate::value::{DataType, Value};
//!
//! let record = Value::tuple(vec![
//!     ("symbol", Value::rstring("INTC")),
//!     ("price", Value::Float32(97.5)),
//!     ("qty", Value::UInt32(10)),
//! ]);
//!
//! let verdict =
//!     eval_predicate("symbol == \"INTC\" && price <= 100.0", &record, false).unwrap();
//! assert!(verdict);
//! ```
//!
//! Errors are returned, never panicked across the API boundary; any error
//! means the record did not pass. Validation errors are deterministic per
//! `(expression, schema)` pair; runtime errors (invalid index, missing map
//! key, divide by zero) depend on the record.
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `value` | `TupleView` capability, `DataType`/`MetaType`, owned `Value` |
//! | `schema` | canonical type strings and the attribute path map |
//! | `compiler` | expression validation and plan construction |
//! | `plan` | the immutable `EvaluationPlan` representation |
//! | `cache` | thread-local `expr -> plan` cache |
//! | `evaluator` | type-dispatched, short-circuiting plan execution |
//! | `fetcher` | single-attribute value access |

pub mod cache;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod fetcher;
pub mod plan;
pub mod schema;
mod trace;
pub mod value;

pub use cache::{clear_plan_cache, plan_cache_size};
pub use compiler::compile_predicate;
pub use error::{EvalError, EvalResult};
pub use fetcher::{get_tuple_attribute_value, FromAttribute};
pub use plan::{EvaluationPlan, LogicalOp, SubexprId};
pub use value::{DataType, MetaType, TupleView, Value};

/// Evaluate a predicate expression against one record.
///
/// The plan compiled for `expr` is cached per thread; subsequent calls with
/// the same expression skip validation entirely. Passing a tuple whose
/// schema differs from the cached plan's schema is a caller bug and fails
/// with `TupleSchemaMismatchInPlanCache`.
///
/// With `trace` set, labelled sections go to stdout; results are identical
/// either way.
pub fn eval_predicate(expr: &str, tuple: &dyn TupleView, trace: bool) -> EvalResult<bool> {
    let tracer = trace::Trace::new(trace);
    let schema = schema::tuple_schema(tuple)?;
    if tracer.enabled() {
        tracer.section("TUPLE SCHEMA");
        tracer.line("schema", &schema);
    }

    let plan = cache::get_or_compile(expr, &schema)?;
    if tracer.enabled() {
        tracer.section("EVALUATION PLAN");
        match serde_json::to_string_pretty(plan.as_ref()) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{plan}"),
        }
        tracer.section("EVALUATION");
    }

    let result = evaluator::evaluate_plan(&plan, tuple, trace)?;
    tracer.line("result", &result);
    tracing::trace!(target: "rulegate", expression = expr, result, "predicate evaluated");
    Ok(result)
}
