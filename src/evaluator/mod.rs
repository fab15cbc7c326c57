//! # Plan Evaluator
//!
//! Walks a compiled plan against one record. Dispatch is two-level: first
//! on the left-hand side's type class (and whether an index or key is in
//! play), then on the operation verb. Logical folding short-circuits at
//! every level: blocks within a subexpression, members within a nested
//! group, and groups within the inter chain; once a result is determined
//! no further attribute fetches occur.
//!
//! A `list<tuple<...>>` block extracts its sub-expression slice from the
//! original expression, recompiles it against the element's tuple schema,
//! and evaluates the element as a root record. The sub-plan is built per
//! evaluation and dropped with it, never cached.

pub mod compare;

use crate::compiler::{validate_with_map, rhs::parse_membership_literal};
use crate::error::{EvalError, EvalResult};
use crate::plan::{EvaluationPlan, LogicalOp, PredicateStep, StepKind, SubexprId};
use crate::schema::{parse_tuple_schema, TypeClass};
use crate::trace::Trace;
use crate::value::{MetaType, TupleView};

use compare::{lower, numeric_compare, relational, size_compare, string_compare};

/// Evaluate a compiled plan against one record.
pub fn evaluate_plan(
    plan: &EvaluationPlan,
    tuple: &dyn TupleView,
    trace: bool,
) -> EvalResult<bool> {
    let evaluator = Evaluator {
        plan,
        tuple,
        tracer: Trace::new(trace),
    };
    evaluator.run()
}

/// Walk a dotted attribute path down a record
pub(crate) fn resolve_path<'a>(
    tuple: &'a dyn TupleView,
    path: &str,
) -> EvalResult<&'a dyn TupleView> {
    let mut view = tuple;
    for segment in path.split('.') {
        view = view
            .attribute_value(segment)
            .ok_or(EvalError::AttributeResolutionFailedAtEvalTime)?;
    }
    Ok(view)
}

/// Render a map key for textual comparison. Float keys are deliberately
/// compared by their text form, where binary equality is unreliable.
pub(crate) fn key_text(view: &dyn TupleView) -> EvalResult<String> {
    match view.meta_type() {
        MetaType::Rstring | MetaType::BString | MetaType::Ustring => {
            Ok(view.as_rstring()?.to_string())
        }
        MetaType::Boolean => Ok(view.as_boolean()?.to_string()),
        MetaType::Int8 => Ok(view.as_int8()?.to_string()),
        MetaType::Int16 => Ok(view.as_int16()?.to_string()),
        MetaType::Int32 => Ok(view.as_int32()?.to_string()),
        MetaType::Int64 => Ok(view.as_int64()?.to_string()),
        MetaType::UInt8 => Ok(view.as_uint8()?.to_string()),
        MetaType::UInt16 => Ok(view.as_uint16()?.to_string()),
        MetaType::UInt32 => Ok(view.as_uint32()?.to_string()),
        MetaType::UInt64 => Ok(view.as_uint64()?.to_string()),
        MetaType::Float32 => Ok(view.as_float32()?.to_string()),
        MetaType::Float64 => Ok(view.as_float64()?.to_string()),
        _ => Err(EvalError::WrongTypePassed),
    }
}

/// Find the value view for a textual key in a map view
pub(crate) fn lookup_map_value<'a>(
    map: &'a dyn TupleView,
    key: &str,
) -> EvalResult<&'a dyn TupleView> {
    for (entry_key, entry_value) in map.iterate_pairs() {
        if key_text(entry_key)? == key {
            return Ok(entry_value);
        }
    }
    Err(EvalError::MapKeyNotFoundInLhsMapAttribute)
}

struct Evaluator<'a> {
    plan: &'a EvaluationPlan,
    tuple: &'a dyn TupleView,
    tracer: Trace,
}

impl Evaluator<'_> {
    fn run(&self) -> EvalResult<bool> {
        let keys = self.plan.subexpression_keys();
        let mut acc: Option<bool> = None;
        let mut inter = self.plan.inter_logical().iter();
        let mut i = 0usize;
        while i < keys.len() {
            let level = keys[i].level;
            let mut j = i;
            while j < keys.len() && keys[j].level == level {
                j += 1;
            }
            if let Some(current) = acc {
                let op = *inter
                    .next()
                    .ok_or(EvalError::SubexpressionLogicalOperatorCountMismatch)?;
                match op {
                    LogicalOp::And if !current => {
                        self.tracer.line("inter short-circuit", &"false");
                        return Ok(false);
                    }
                    LogicalOp::Or if current => {
                        self.tracer.line("inter short-circuit", &"true");
                        return Ok(true);
                    }
                    _ => {}
                }
                let group = self.eval_group(&keys[i..j])?;
                acc = Some(match op {
                    LogicalOp::And => current && group,
                    LogicalOp::Or => current || group,
                });
            } else {
                acc = Some(self.eval_group(&keys[i..j])?);
            }
            i = j;
        }
        acc.ok_or(EvalError::InvalidOperationVerbAtEvalTime)
    }

    /// Evaluate one nested group (or a single free-standing subexpression),
    /// short-circuiting across its members
    fn eval_group(&self, members: &[SubexprId]) -> EvalResult<bool> {
        let Some(first) = members.first() else {
            return Err(EvalError::InvalidOperationVerbAtEvalTime);
        };
        let group_op = self.plan.intra_nested_logical(*first);
        let mut result: Option<bool> = None;
        for id in members {
            if let (Some(current), Some(op)) = (result, group_op) {
                match op {
                    LogicalOp::And if !current => break,
                    LogicalOp::Or if current => break,
                    _ => {}
                }
            }
            let value = self.eval_subexpr(*id)?;
            self.tracer.line(&id.to_string(), &value);
            result = Some(match (result, group_op) {
                (Some(current), Some(LogicalOp::And)) => current && value,
                (Some(current), Some(LogicalOp::Or)) => current || value,
                _ => value,
            });
        }
        result.ok_or(EvalError::InvalidOperationVerbAtEvalTime)
    }

    /// Evaluate one subexpression layout, short-circuiting across blocks
    fn eval_subexpr(&self, id: SubexprId) -> EvalResult<bool> {
        let layout = self
            .plan
            .layout(id)
            .ok_or(EvalError::InvalidOperationVerbAtEvalTime)?;
        let mut result: Option<bool> = None;
        let mut pending: Option<LogicalOp> = None;
        for step in layout {
            if let Some(current) = result {
                match pending {
                    Some(LogicalOp::And) if !current => return Ok(false),
                    Some(LogicalOp::Or) if current => return Ok(true),
                    _ => {}
                }
            }
            let value = self.eval_step(step)?;
            result = Some(match (result, pending) {
                (Some(current), Some(LogicalOp::And)) => current && value,
                (Some(current), Some(LogicalOp::Or)) => current || value,
                _ => value,
            });
            pending = step.connector;
        }
        result.ok_or(EvalError::InvalidOperationVerbAtEvalTime)
    }

    fn eval_step(&self, step: &PredicateStep) -> EvalResult<bool> {
        match step.kind {
            StepKind::ListOfTuple => self.eval_list_of_tuple(step),
            StepKind::Comparison => self.eval_comparison(step),
        }
    }

    fn eval_comparison(&self, step: &PredicateStep) -> EvalResult<bool> {
        let view = resolve_path(self.tuple, &step.lhs_path)?;
        let class = TypeClass::classify(&step.lhs_type);
        let verb = step.op_verb.as_str();

        // Size verbs measure the container (or string) at the path, even
        // when an element access was written.
        if verb.starts_with("size") {
            return eval_size(view, &class, verb, &step.rhs);
        }

        let (operand_view, operand_class) = if step.index_or_key.is_empty() {
            (view, class)
        } else {
            match &class {
                TypeClass::List(elem) => {
                    let index: usize = step
                        .index_or_key
                        .parse()
                        .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
                    let element = view
                        .iterate()
                        .nth(index)
                        .ok_or(EvalError::InvalidIndexForLhsListAttribute)?;
                    (element, TypeClass::classify(elem))
                }
                TypeClass::Map(_, value) => {
                    let entry = lookup_map_value(view, &step.index_or_key)?;
                    (entry, TypeClass::classify(value))
                }
                _ => return Err(EvalError::InvalidOperationVerbAtEvalTime),
            }
        };

        match &operand_class {
            TypeClass::List(elem) | TypeClass::Set(elem) => eval_containment(
                operand_view,
                &TypeClass::classify(elem),
                verb,
                &step.rhs,
                false,
            ),
            TypeClass::Map(_, _) => {
                eval_containment(operand_view, &TypeClass::Str, verb, &step.rhs, true)
            }
            scalar => eval_scalar(operand_view, scalar, verb, &step.rhs),
        }
    }

    fn eval_list_of_tuple(&self, step: &PredicateStep) -> EvalResult<bool> {
        let view = resolve_path(self.tuple, &step.lhs_path)?;
        let index: usize = step
            .index_or_key
            .parse()
            .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
        let element = view
            .iterate()
            .nth(index)
            .ok_or(EvalError::InvalidIndexForLhsListOfTupleAttribute)?;

        let expression = self.plan.expression();
        let start: usize = step
            .op_verb
            .parse()
            .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
        let end: usize = step
            .rhs
            .parse()
            .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
        if start > end || end > expression.len() {
            return Err(EvalError::InvalidOperationVerbAtEvalTime);
        }
        let mut slice = expression[start..end].trim();
        // A trailing close paren swallowed from an enclosing group is not
        // part of the sub-expression.
        while slice.ends_with(')') && unbalanced_close(slice) {
            slice = slice[..slice.len() - 1].trim_end();
        }

        let inner_schema = &step.lhs_type["list<".len()..step.lhs_type.len() - 1];
        let inner_attrs = parse_tuple_schema(inner_schema)?;
        let (subexpressions, intra, inter) = validate_with_map(slice, &inner_attrs)?;
        let sub_plan = EvaluationPlan::new(
            slice.to_string(),
            inner_schema.to_string(),
            subexpressions,
            intra,
            inter,
        );
        evaluate_plan(&sub_plan, element, self.tracer.enabled())
    }
}

/// More `)` than `(` in the slice
fn unbalanced_close(slice: &str) -> bool {
    let mut depth = 0i32;
    for b in slice.bytes() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
    }
    depth < 0
}

/// `sizeXX` against a container or string at the path
fn eval_size(
    view: &dyn TupleView,
    class: &TypeClass,
    verb: &str,
    rhs: &str,
) -> EvalResult<bool> {
    let len = match class {
        TypeClass::Str => view.as_rstring()?.len(),
        TypeClass::List(_) | TypeClass::Set(_) | TypeClass::ListOfTuple(_) => {
            view.iterate().count()
        }
        TypeClass::Map(_, _) => view.iterate_pairs().count(),
        _ => return Err(EvalError::InvalidOperationVerbAtEvalTime),
    };
    size_compare(len, verb, rhs)
}

/// Scalar comparison after any element resolution
fn eval_scalar(
    view: &dyn TupleView,
    class: &TypeClass,
    verb: &str,
    rhs: &str,
) -> EvalResult<bool> {
    if verb == "in" || verb == "inCI" {
        return eval_membership(view, class, verb, rhs);
    }
    match class {
        TypeClass::Boolean => {
            let value = view.as_boolean()?;
            relational(&value, verb, &(rhs == "true"))
        }
        TypeClass::Int8 => numeric_compare(view.as_int8()?, verb, rhs),
        TypeClass::Int16 => numeric_compare(view.as_int16()?, verb, rhs),
        TypeClass::Int32 => numeric_compare(view.as_int32()?, verb, rhs),
        TypeClass::Int64 => numeric_compare(view.as_int64()?, verb, rhs),
        TypeClass::UInt8 => numeric_compare(view.as_uint8()?, verb, rhs),
        TypeClass::UInt16 => numeric_compare(view.as_uint16()?, verb, rhs),
        TypeClass::UInt32 => numeric_compare(view.as_uint32()?, verb, rhs),
        TypeClass::UInt64 => numeric_compare(view.as_uint64()?, verb, rhs),
        TypeClass::Float32 => numeric_compare(view.as_float32()?, verb, rhs),
        TypeClass::Float64 => numeric_compare(view.as_float64()?, verb, rhs),
        TypeClass::Str => string_compare(view.as_rstring()?, verb, rhs),
        _ => Err(EvalError::InvalidOperationVerbAtEvalTime),
    }
}

/// `in` / `inCI`: parse the list literal, fold equality over its items
fn eval_membership(
    view: &dyn TupleView,
    class: &TypeClass,
    verb: &str,
    rhs: &str,
) -> EvalResult<bool> {
    let items = parse_membership_literal(rhs, class)?;
    match class {
        TypeClass::Str => {
            let value = view.as_rstring()?;
            if verb == "inCI" {
                let value = lower(value);
                Ok(items.iter().any(|item| lower(item) == value))
            } else {
                Ok(items.iter().any(|item| item == value))
            }
        }
        TypeClass::Int8 => numeric_membership(view.as_int8()?, &items),
        TypeClass::Int16 => numeric_membership(view.as_int16()?, &items),
        TypeClass::Int32 => numeric_membership(view.as_int32()?, &items),
        TypeClass::Int64 => numeric_membership(view.as_int64()?, &items),
        TypeClass::UInt8 => numeric_membership(view.as_uint8()?, &items),
        TypeClass::UInt16 => numeric_membership(view.as_uint16()?, &items),
        TypeClass::UInt32 => numeric_membership(view.as_uint32()?, &items),
        TypeClass::UInt64 => numeric_membership(view.as_uint64()?, &items),
        TypeClass::Float32 => numeric_membership(view.as_float32()?, &items),
        TypeClass::Float64 => numeric_membership(view.as_float64()?, &items),
        _ => Err(EvalError::InvalidOperationVerbAtEvalTime),
    }
}

fn numeric_membership<T>(value: T, items: &[String]) -> EvalResult<bool>
where
    T: PartialEq + std::str::FromStr,
{
    Ok(items
        .iter()
        .any(|item| item.parse::<T>().map(|parsed| parsed == value).unwrap_or(false)))
}

/// `contains` family over a collection: list/set elements compare typed,
/// map keys compare textually
fn eval_containment(
    view: &dyn TupleView,
    elem_class: &TypeClass,
    verb: &str,
    rhs: &str,
    is_map: bool,
) -> EvalResult<bool> {
    let ci = verb.ends_with("CI");
    let negated = verb.starts_with("not");
    if !matches!(verb, "contains" | "notContains" | "containsCI" | "notContainsCI") {
        return Err(EvalError::InvalidOperationVerbAtEvalTime);
    }

    let found = if is_map {
        let needle = if ci { lower(rhs) } else { rhs.to_string() };
        let mut found = false;
        for (key, _) in view.iterate_pairs() {
            let text = key_text(key)?;
            let text = if ci { lower(&text) } else { text };
            if text == needle {
                found = true;
                break;
            }
        }
        found
    } else {
        match elem_class {
            TypeClass::Str => {
                let needle = if ci { lower(rhs) } else { rhs.to_string() };
                let mut found = false;
                for item in view.iterate() {
                    let text = item.as_rstring()?;
                    let matched = if ci { lower(text) == needle } else { text == needle };
                    if matched {
                        found = true;
                        break;
                    }
                }
                found
            }
            TypeClass::Boolean => {
                let needle = rhs == "true";
                let mut found = false;
                for item in view.iterate() {
                    if item.as_boolean()? == needle {
                        found = true;
                        break;
                    }
                }
                found
            }
            TypeClass::Int8 => typed_containment(view, rhs, |item| item.as_int8())?,
            TypeClass::Int16 => typed_containment(view, rhs, |item| item.as_int16())?,
            TypeClass::Int32 => typed_containment(view, rhs, |item| item.as_int32())?,
            TypeClass::Int64 => typed_containment(view, rhs, |item| item.as_int64())?,
            TypeClass::UInt8 => typed_containment(view, rhs, |item| item.as_uint8())?,
            TypeClass::UInt16 => typed_containment(view, rhs, |item| item.as_uint16())?,
            TypeClass::UInt32 => typed_containment(view, rhs, |item| item.as_uint32())?,
            TypeClass::UInt64 => typed_containment(view, rhs, |item| item.as_uint64())?,
            TypeClass::Float32 => typed_containment(view, rhs, |item| item.as_float32())?,
            TypeClass::Float64 => typed_containment(view, rhs, |item| item.as_float64())?,
            _ => return Err(EvalError::InvalidOperationVerbAtEvalTime),
        }
    };
    Ok(negated != found)
}

fn typed_containment<T>(
    view: &dyn TupleView,
    rhs: &str,
    extract: impl Fn(&dyn TupleView) -> EvalResult<T>,
) -> EvalResult<bool>
where
    T: PartialEq + std::str::FromStr,
{
    let Ok(needle) = rhs.parse::<T>() else {
        return Err(EvalError::InvalidOperationVerbAtEvalTime);
    };
    for item in view.iterate() {
        if extract(item)? == needle {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_predicate;
    use crate::value::{DataType, Value};

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

    const TRADE: &str = "tuple<rstring symbol,float32 price,uint32 qty,boolean buy,list<int32> marks,map<rstring,int32> kv>";

    fn eval(expr: &str) -> EvalResult<bool> {
        let plan = compile_predicate(expr, TRADE)?;
        evaluate_plan(&plan, &trade(), false)
    }

    #[test]
    fn test_flat_conjunction_with_arithmetic() {
        assert_eq!(
            eval("symbol == \"INTC\" && price <= 100.0 && qty % 3 == 1"),
            Ok(true)
        );
    }

    #[test]
    fn test_enclosed_singles_with_list_index() {
        assert_eq!(eval("(symbol startsWith 'IN') && (marks[1] > 5)"), Ok(true));
    }

    #[test]
    fn test_map_size_with_key_access() {
        assert_eq!(eval("buy == false || kv[\"b\"] sizeEQ 2"), Ok(true));
    }

    #[test]
    fn test_failed_second_conjunct() {
        assert_eq!(eval("symbol containsCI \"int\" && marks contains 4"), Ok(false));
    }

    #[test]
    fn test_nested_group() {
        assert_eq!(
            eval("(symbol == \"IBM\") || ((price > 50.0) && (qty >= 10))"),
            Ok(true)
        );
    }

    #[test]
    fn test_runtime_list_index_error() {
        assert_eq!(
            eval("kv notContains \"c\" && marks[5] > 0"),
            Err(EvalError::InvalidIndexForLhsListAttribute)
        );
    }

    #[test]
    fn test_map_key_lookup_and_missing_key() {
        assert_eq!(eval("kv[\"b\"] == 2"), Ok(true));
        assert_eq!(
            eval("kv[\"zz\"] == 2"),
            Err(EvalError::MapKeyNotFoundInLhsMapAttribute)
        );
    }

    #[test]
    fn test_membership() {
        assert_eq!(eval("symbol in [\"IBM\", \"INTC\"]"), Ok(true));
        assert_eq!(eval("symbol in [\"IBM\", \"MSFT\"]"), Ok(false));
        assert_eq!(eval("symbol inCI [\"ibm\", \"intc\"]"), Ok(true));
        assert_eq!(eval("qty in [1, 10, 100]"), Ok(true));
        assert_eq!(eval("marks[0] in [2, 4]"), Ok(false));
    }

    #[test]
    fn test_collection_ops() {
        assert_eq!(eval("marks contains 7"), Ok(true));
        assert_eq!(eval("marks notContains 4"), Ok(true));
        assert_eq!(eval("kv contains \"a\""), Ok(true));
        assert_eq!(eval("kv notContains \"c\""), Ok(true));
        assert_eq!(eval("marks sizeEQ 3"), Ok(true));
        assert_eq!(eval("symbol sizeEQ 4"), Ok(true));
    }

    #[test]
    fn test_divide_by_zero_at_eval() {
        assert_eq!(eval("qty / 0 == 1"), Err(EvalError::DivideByZero));
    }

    const WITH_LOT: &str = "tuple<list<tuple<int32 a,int32 b>> lot,rstring sym>";

    fn lot_record() -> Value {
        Value::tuple(vec![
            (
                "lot",
                Value::list(
                    DataType::Tuple(vec![
                        ("a".to_string(), DataType::Int32),
                        ("b".to_string(), DataType::Int32),
                    ]),
                    vec![
                        Value::tuple(vec![("a", Value::Int32(1)), ("b", Value::Int32(2))]),
                        Value::tuple(vec![("a", Value::Int32(5)), ("b", Value::Int32(6))]),
                    ],
                ),
            ),
            ("sym", Value::rstring("x")),
        ])
    }

    fn eval_lot(expr: &str) -> EvalResult<bool> {
        let plan = compile_predicate(expr, WITH_LOT)?;
        evaluate_plan(&plan, &lot_record(), false)
    }

    #[test]
    fn test_list_of_tuple_recursion() {
        assert_eq!(eval_lot("lot[1].a == 5 && sym == \"x\""), Ok(true));
        assert_eq!(eval_lot("lot[0].a == 5 && sym == \"x\""), Ok(false));
        assert_eq!(eval_lot("(lot[0].b > 1) && sym == \"x\""), Ok(true));
    }

    #[test]
    fn test_list_of_tuple_index_out_of_bounds() {
        assert_eq!(
            eval_lot("lot[9].a == 5"),
            Err(EvalError::InvalidIndexForLhsListOfTupleAttribute)
        );
    }

    #[test]
    fn test_list_of_tuple_size() {
        assert_eq!(eval_lot("lot sizeEQ 2"), Ok(true));
        assert_eq!(eval_lot("lot sizeGT 5"), Ok(false));
    }

    #[test]
    fn test_nested_tuple_paths() {
        let schema = "tuple<tuple<rstring name,int32 id> who,int64 t>";
        let record = Value::tuple(vec![
            (
                "who",
                Value::tuple(vec![("name", Value::rstring("ann")), ("id", Value::Int32(7))]),
            ),
            ("t", Value::Int64(0)),
        ]);
        let plan = compile_predicate("who.name == 'ann' && who.id == 7", schema).expect("plan");
        assert_eq!(evaluate_plan(&plan, &record, false), Ok(true));
    }
}
