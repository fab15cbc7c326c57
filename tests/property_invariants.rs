//! Property-based invariants (proptest).

use proptest::prelude::*;

use rulegate::value::{DataType, Value};
use rulegate::{clear_plan_cache, compile_predicate, eval_predicate, EvalError};

const SCHEMA: &str =
    "tuple<rstring tag,int32 n,uint32 qty,float64 ratio,list<int32> marks,map<rstring,int32> kv>";

fn record(tag: &str, n: i32, qty: u32, ratio: f64, marks: &[i32]) -> Value {
    Value::tuple(vec![
        ("tag", Value::rstring(tag)),
        ("n", Value::Int32(n)),
        ("qty", Value::UInt32(qty)),
        ("ratio", Value::Float64(ratio)),
        (
            "marks",
            Value::list(
                DataType::Int32,
                marks.iter().copied().map(Value::Int32).collect(),
            ),
        ),
        (
            "kv",
            Value::map(
                DataType::Rstring,
                DataType::Int32,
                vec![(Value::rstring("a"), Value::Int32(1))],
            ),
        ),
    ])
}

fn eval(expr: &str, tuple: &Value) -> Result<bool, EvalError> {
    clear_plan_cache();
    let result = eval_predicate(expr, tuple, false);
    clear_plan_cache();
    result
}

proptest! {
    /// `a notContains x` is exactly `!(a contains x)`
    #[test]
    fn not_contains_negates_contains(marks in prop::collection::vec(-20i32..20, 0..6), needle in -20i32..20) {
        let tuple = record("t", 0, 1, 1.0, &marks);
        let pos = eval(&format!("marks contains {needle}"), &tuple);
        let neg = eval(&format!("marks notContains {needle}"), &tuple);
        prop_assert_eq!(pos.map(|b| !b), neg);
    }

    /// `tag notStartsWith p` is exactly `!(tag startsWith p)`; same for CI
    #[test]
    fn not_substring_verbs_negate(tag in "[a-zA-Z0-9]{0,8}", prefix in "[a-zA-Z0-9]{0,4}") {
        let tuple = record(&tag, 0, 1, 1.0, &[]);
        let pos = eval(&format!("tag startsWith '{prefix}'"), &tuple);
        let neg = eval(&format!("tag notStartsWith '{prefix}'"), &tuple);
        prop_assert_eq!(pos.map(|b| !b), neg);
        let pos = eval(&format!("tag endsWithCI '{prefix}'"), &tuple);
        let neg = eval(&format!("tag notEndsWithCI '{prefix}'"), &tuple);
        prop_assert_eq!(pos.map(|b| !b), neg);
    }

    /// `n in [v1,...,vn]` equals the fold `n == v1 || ... || n == vn`
    #[test]
    fn membership_equals_equality_fold(items in prop::collection::vec(-9i32..10, 1..5), n in -9i32..10) {
        let tuple = record("t", n, 1, 1.0, &[]);
        let literal = items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let via_in = eval(&format!("n in [{literal}]"), &tuple);
        let fold = items
            .iter()
            .map(|item| format!("n == {item}"))
            .collect::<Vec<_>>()
            .join(" || ");
        let via_fold = eval(&fold, &tuple);
        prop_assert_eq!(via_in, via_fold);
    }

    /// ASCII case-insensitive verbs agree with lowercasing both sides
    #[test]
    fn case_insensitive_equivalence(tag in "[a-zA-Z]{0,8}", other in "[a-zA-Z]{0,8}") {
        let mixed = record(&tag, 0, 1, 1.0, &[]);
        let lowered = record(&tag.to_ascii_lowercase(), 0, 1, 1.0, &[]);
        let ci = eval(&format!("tag equalsCI '{other}'"), &mixed);
        let plain = eval(
            &format!("tag == '{}'", other.to_ascii_lowercase()),
            &lowered,
        );
        prop_assert_eq!(ci, plain);
        let ci = eval(&format!("tag containsCI '{other}'"), &mixed);
        let plain = eval(
            &format!("tag contains '{}'", other.to_ascii_lowercase()),
            &lowered,
        );
        prop_assert_eq!(ci, plain);
    }

    /// `marks sizeXX k` agrees with comparing `marks.len()` to `k`
    #[test]
    fn size_identities(marks in prop::collection::vec(0i32..5, 0..6), k in 0usize..8) {
        let tuple = record("t", 0, 1, 1.0, &marks);
        let len = marks.len();
        prop_assert_eq!(eval(&format!("marks sizeEQ {k}"), &tuple), Ok(len == k));
        prop_assert_eq!(eval(&format!("marks sizeNE {k}"), &tuple), Ok(len != k));
        prop_assert_eq!(eval(&format!("marks sizeLT {k}"), &tuple), Ok(len < k));
        prop_assert_eq!(eval(&format!("marks sizeLE {k}"), &tuple), Ok(len <= k));
        prop_assert_eq!(eval(&format!("marks sizeGT {k}"), &tuple), Ok(len > k));
        prop_assert_eq!(eval(&format!("marks sizeGE {k}"), &tuple), Ok(len >= k));
    }

    /// `qty % k == r` agrees with native modulus; `k == 0` is the divide
    /// by zero error and a false verdict
    #[test]
    fn arithmetic_composition(qty in 0u32..1000, k in 0u32..20, r in 0u32..20) {
        let tuple = record("t", 0, qty, 1.0, &[]);
        let outcome = eval(&format!("qty % {k} == {r}"), &tuple);
        if k == 0 {
            prop_assert_eq!(outcome, Err(EvalError::DivideByZero));
        } else {
            prop_assert_eq!(outcome, Ok(qty % k == r));
        }
    }

    /// Compiling the same `(expr, schema)` twice yields structurally equal
    /// plans
    #[test]
    fn compilation_is_deterministic(n in -50i32..50) {
        let expr = format!("n == {n} && qty > 0");
        let a = compile_predicate(&expr, SCHEMA);
        let b = compile_predicate(&expr, SCHEMA);
        prop_assert_eq!(a, b);
    }

    /// A cached plan returns the same verdict as a fresh compile
    #[test]
    fn cache_transparency(n in -50i32..50, probe in -50i32..50) {
        clear_plan_cache();
        let tuple = record("t", probe, 1, 1.0, &[]);
        let expr = format!("n >= {n}");
        let fresh = eval_predicate(&expr, &tuple, false);
        let cached = eval_predicate(&expr, &tuple, false);
        clear_plan_cache();
        prop_assert_eq!(fresh, cached);
    }

    /// Wrapping a subexpression in any depth of parentheses is a no-op
    #[test]
    fn paren_wrapping_is_neutral(depth in 1usize..8, qty in 0u32..20) {
        let tuple = record("t", 0, qty, 1.0, &[]);
        let core = format!("qty == {qty}");
        let wrapped = format!(
            "{}{}{}",
            "(".repeat(depth),
            core,
            ")".repeat(depth)
        );
        prop_assert_eq!(eval(&wrapped, &tuple), Ok(true));
    }

    /// Trace output never changes a verdict
    #[test]
    fn trace_is_result_neutral(qty in 0u32..20) {
        let tuple = record("t", 0, qty, 1.0, &[3]);
        let expr = "qty < 10 || marks contains 3";
        clear_plan_cache();
        let quiet = eval_predicate(expr, &tuple, false);
        let traced = eval_predicate(expr, &tuple, true);
        clear_plan_cache();
        prop_assert_eq!(quiet, traced);
    }
}
