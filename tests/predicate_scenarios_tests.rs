//! End-to-end predicate scenarios over the public API.

use rulegate::value::{DataType, Value};
use rulegate::{clear_plan_cache, eval_predicate, EvalError};

/// tuple<rstring symbol,float32 price,uint32 qty,boolean buy,
///       list<int32> marks,map<rstring,int32> kv>
fn trade() -> Value {
    Value::tuple(vec![
        ("symbol", Value::rstring("INTC")),
        ("price", Value::Float32(97.5)),
        ("qty", Value::UInt32(10)),
        ("buy", Value::Boolean(true)),
        (
            "marks",
            Value::list(
                DataType::Int32,
                vec![Value::Int32(3), Value::Int32(7), Value::Int32(9)],
            ),
        ),
        (
            "kv",
            Value::map(
                DataType::Rstring,
                DataType::Int32,
                vec![
                    (Value::rstring("a"), Value::Int32(1)),
                    (Value::rstring("b"), Value::Int32(2)),
                ],
            ),
        ),
    ])
}

fn eval(expr: &str) -> Result<bool, EvalError> {
    clear_plan_cache();
    let result = eval_predicate(expr, &trade(), false);
    clear_plan_cache();
    result
}

#[test]
fn flat_conjunction_with_modulo() {
    assert_eq!(
        eval("symbol == \"INTC\" && price <= 100.0 && qty % 3 == 1"),
        Ok(true)
    );
}

#[test]
fn parenthesized_substring_and_list_index() {
    assert_eq!(eval("(symbol startsWith 'IN') && (marks[1] > 5)"), Ok(true));
}

#[test]
fn disjunction_with_map_size() {
    assert_eq!(eval("buy == false || kv[\"b\"] sizeEQ 2"), Ok(true));
}

#[test]
fn failing_containment_conjunct() {
    assert_eq!(eval("symbol containsCI \"int\" && marks contains 4"), Ok(false));
}

#[test]
fn nested_group_disjunction() {
    assert_eq!(
        eval("(symbol == \"IBM\") || ((price > 50.0) && (qty >= 10))"),
        Ok(true)
    );
}

#[test]
fn runtime_index_error_after_true_conjunct() {
    assert_eq!(
        eval("kv notContains \"c\" && marks[5] > 0"),
        Err(EvalError::InvalidIndexForLhsListAttribute)
    );
}

#[test]
fn equality_and_relational_on_strings() {
    assert_eq!(eval("symbol == \"INTC\""), Ok(true));
    assert_eq!(eval("symbol != \"IBM\""), Ok(true));
    assert_eq!(eval("symbol < \"J\""), Ok(true));
    assert_eq!(eval("symbol equalsCI 'intc'"), Ok(true));
    assert_eq!(eval("symbol notEqualsCI 'intc'"), Ok(false));
}

#[test]
fn substring_verbs() {
    assert_eq!(eval("symbol startsWith 'IN'"), Ok(true));
    assert_eq!(eval("symbol notStartsWith 'IN'"), Ok(false));
    assert_eq!(eval("symbol endsWith 'TC'"), Ok(true));
    assert_eq!(eval("symbol endsWithCI 'tc'"), Ok(true));
    assert_eq!(eval("symbol notEndsWithCI 'tc'"), Ok(false));
    assert_eq!(eval("symbol startsWithCI 'in'"), Ok(true));
    assert_eq!(eval("symbol notStartsWithCI 'in'"), Ok(false));
}

#[test]
fn membership_verbs() {
    assert_eq!(eval("symbol in [\"IBM\", \"INTC\"]"), Ok(true));
    assert_eq!(eval("symbol inCI [\"ibm\", \"intc\"]"), Ok(true));
    assert_eq!(eval("symbol in [\"IBM\", \"MSFT\"]"), Ok(false));
    assert_eq!(eval("qty in [5, 10]"), Ok(true));
    assert_eq!(eval("marks[2] in [8, 9]"), Ok(true));
    assert_eq!(eval("price in [97.5, 100.0]"), Ok(true));
}

#[test]
fn collection_containment_and_sizes() {
    assert_eq!(eval("marks contains 9"), Ok(true));
    assert_eq!(eval("marks notContains 9"), Ok(false));
    assert_eq!(eval("kv contains \"b\""), Ok(true));
    assert_eq!(eval("kv containsCI \"B\""), Ok(true));
    assert_eq!(eval("marks sizeEQ 3 && marks sizeGT 2 && marks sizeLE 3"), Ok(true));
    assert_eq!(eval("kv sizeNE 2"), Ok(false));
    assert_eq!(eval("symbol sizeEQ 4"), Ok(true));
}

#[test]
fn arithmetic_verbs_with_post_relational() {
    assert_eq!(eval("qty + 5 == 15"), Ok(true));
    assert_eq!(eval("qty - 5 >= 5"), Ok(true));
    assert_eq!(eval("qty * 2 == 20"), Ok(true));
    assert_eq!(eval("qty / 2 == 5"), Ok(true));
    assert_eq!(eval("qty % 4 != 0"), Ok(true));
    assert_eq!(eval("price * 2.0 > 190.0"), Ok(true));
    assert_eq!(eval("price % 2.0 <= 1.5"), Ok(true));
}

#[test]
fn divide_by_zero_reports_and_fails() {
    assert_eq!(eval("qty / 0 == 1"), Err(EvalError::DivideByZero));
    assert_eq!(eval("qty % 0 == 1"), Err(EvalError::DivideByZero));
}

#[test]
fn missing_map_key_is_a_runtime_error() {
    assert_eq!(
        eval("kv[\"zz\"] == 1"),
        Err(EvalError::MapKeyNotFoundInLhsMapAttribute)
    );
}

#[test]
fn boolean_comparisons() {
    assert_eq!(eval("buy == true"), Ok(true));
    assert_eq!(eval("buy != false"), Ok(true));
    assert_eq!(eval("buy == false || buy == true"), Ok(true));
}

#[test]
fn quoted_strings_keep_interior_characters() {
    let record = Value::tuple(vec![("note", Value::rstring("a(b)c && d"))]);
    assert_eq!(
        eval_predicate("note == 'a(b)c && d'", &record, false),
        Ok(true)
    );
}

#[test]
fn numeric_promotion_in_string_relationals() {
    let record = Value::tuple(vec![("tag", Value::rstring("9"))]);
    // "9" < "10" numerically; lexicographically it would be greater
    assert_eq!(eval_predicate("tag < '10'", &record, false), Ok(true));
    clear_plan_cache();
}

#[test]
fn deeply_wrapped_subexpressions() {
    assert_eq!(eval("((((qty == 10))))"), Ok(true));
    assert_eq!(eval("(((qty == 10) && (buy == true)))"), Ok(true));
}

#[test]
fn nested_tuple_attribute_paths() {
    let record = Value::tuple(vec![
        (
            "who",
            Value::tuple(vec![
                ("name", Value::rstring("ann")),
                ("id", Value::Int32(7)),
            ]),
        ),
        ("t", Value::Int64(42)),
    ]);
    clear_plan_cache();
    assert_eq!(
        eval_predicate("who.name == 'ann' && who.id == 7 && t >= 42", &record, false),
        Ok(true)
    );
    clear_plan_cache();
}

#[test]
fn list_of_tuple_subexpressions() {
    let record = Value::tuple(vec![
        (
            "legs",
            Value::list(
                DataType::Tuple(vec![
                    ("venue".to_string(), DataType::Rstring),
                    ("size".to_string(), DataType::Int32),
                ]),
                vec![
                    Value::tuple(vec![
                        ("venue", Value::rstring("NYSE")),
                        ("size", Value::Int32(100)),
                    ]),
                    Value::tuple(vec![
                        ("venue", Value::rstring("ARCA")),
                        ("size", Value::Int32(250)),
                    ]),
                ],
            ),
        ),
        ("account", Value::rstring("A1")),
    ]);
    clear_plan_cache();
    assert_eq!(
        eval_predicate("legs[1].size > 200 && account == 'A1'", &record, false),
        Ok(true)
    );
    assert_eq!(
        eval_predicate("(legs[0].venue == 'NYSE') && account == 'A1'", &record, false),
        Ok(true)
    );
    assert_eq!(
        eval_predicate("legs sizeEQ 2", &record, false),
        Ok(true)
    );
    assert_eq!(
        eval_predicate("legs[7].size > 0", &record, false),
        Err(EvalError::InvalidIndexForLhsListOfTupleAttribute)
    );
    clear_plan_cache();
}

#[test]
fn cache_transparency_same_result_when_cached() {
    clear_plan_cache();
    let record = trade();
    let expr = "qty % 3 == 1 && symbol containsCI 'nt'";
    let first = eval_predicate(expr, &record, false);
    let second = eval_predicate(expr, &record, false);
    assert_eq!(first, second);
    assert_eq!(first, Ok(true));
    clear_plan_cache();
}

#[test]
fn schema_mismatch_against_cached_plan_is_fatal() {
    clear_plan_cache();
    let record = trade();
    eval_predicate("qty == 10", &record, false).expect("seed the cache");
    let other = Value::tuple(vec![("qty", Value::UInt64(10))]);
    assert_eq!(
        eval_predicate("qty == 10", &other, false),
        Err(EvalError::TupleSchemaMismatchInPlanCache)
    );
    clear_plan_cache();
}
