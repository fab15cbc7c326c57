//! # Comparison Primitives
//!
//! The leaf operations the evaluator dispatches to: relational checks,
//! wrapping integer / `fmod` float arithmetic with a post-verb, string
//! comparison with numeric promotion, and size checks.
//!
//! String relational semantics: when both operands are purely numeric
//! (one optional `.` respected) they compare as int32 (no dot) or float64
//! (dot); otherwise byte-wise lexicographic.

use std::str::FromStr;

use crate::error::{EvalError, EvalResult};

/// `== != < <= > >=` over any partially ordered operand pair
pub(crate) fn relational<T: PartialOrd>(lhs: &T, verb: &str, rhs: &T) -> EvalResult<bool> {
    match verb {
        "==" => Ok(lhs == rhs),
        "!=" => Ok(lhs != rhs),
        "<" => Ok(lhs < rhs),
        "<=" => Ok(lhs <= rhs),
        ">" => Ok(lhs > rhs),
        ">=" => Ok(lhs >= rhs),
        _ => Err(EvalError::InvalidOperationVerbAtEvalTime),
    }
}

/// `+ - * / %`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    fn from_token(token: &str) -> Option<ArithOp> {
        match token {
            "+" => Some(ArithOp::Add),
            "-" => Some(ArithOp::Sub),
            "*" => Some(ArithOp::Mul),
            "/" => Some(ArithOp::Div),
            "%" => Some(ArithOp::Rem),
            _ => None,
        }
    }
}

/// Numeric operand of an arithmetic verb
pub(crate) trait ArithOperand: Copy {
    fn apply(self, op: ArithOp, operand: Self) -> EvalResult<Self>;
}

macro_rules! integer_arith {
    ($($ty:ty),*) => {$(
        impl ArithOperand for $ty {
            fn apply(self, op: ArithOp, operand: Self) -> EvalResult<Self> {
                match op {
                    ArithOp::Add => Ok(self.wrapping_add(operand)),
                    ArithOp::Sub => Ok(self.wrapping_sub(operand)),
                    ArithOp::Mul => Ok(self.wrapping_mul(operand)),
                    ArithOp::Div => {
                        if operand == 0 {
                            Err(EvalError::DivideByZero)
                        } else {
                            Ok(self.wrapping_div(operand))
                        }
                    }
                    ArithOp::Rem => {
                        if operand == 0 {
                            Err(EvalError::DivideByZero)
                        } else {
                            Ok(self.wrapping_rem(operand))
                        }
                    }
                }
            }
        }
    )*};
}

integer_arith!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! float_arith {
    ($($ty:ty),*) => {$(
        impl ArithOperand for $ty {
            fn apply(self, op: ArithOp, operand: Self) -> EvalResult<Self> {
                match op {
                    ArithOp::Add => Ok(self + operand),
                    ArithOp::Sub => Ok(self - operand),
                    ArithOp::Mul => Ok(self * operand),
                    ArithOp::Div => {
                        if operand == 0.0 {
                            Err(EvalError::DivideByZero)
                        } else {
                            Ok(self / operand)
                        }
                    }
                    // fmod semantics: remainder carries the dividend's sign
                    ArithOp::Rem => {
                        if operand == 0.0 {
                            Err(EvalError::DivideByZero)
                        } else {
                            Ok(self % operand)
                        }
                    }
                }
            }
        }
    )*};
}

float_arith!(f32, f64);

/// Split an inline arithmetic verb `"% 8 =="` into its three parts
pub(crate) fn split_arith(verb: &str) -> Option<(ArithOp, &str, &str)> {
    let mut parts = verb.split(' ');
    let op = ArithOp::from_token(parts.next()?)?;
    let operand = parts.next()?;
    let post = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((op, operand, post))
}

/// Numeric relational or arithmetic-with-post-verb comparison.
///
/// Literal texts were validated at compile time; a parse failure here means
/// a corrupted plan and is guarded with the eval-time verb error.
pub(crate) fn numeric_compare<T>(value: T, verb: &str, rhs: &str) -> EvalResult<bool>
where
    T: ArithOperand + PartialOrd + FromStr,
{
    if let Some((op, operand_text, post)) = split_arith(verb) {
        let operand = operand_text
            .parse::<T>()
            .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
        let computed = value.apply(op, operand)?;
        let rhs_value = rhs
            .parse::<T>()
            .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
        relational(&computed, post, &rhs_value)
    } else {
        let rhs_value = rhs
            .parse::<T>()
            .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
        relational(&value, verb, &rhs_value)
    }
}

/// ASCII-only lowercase for the `CI` verb spellings
pub(crate) fn lower(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// `Some(has_dot)` when the text is purely numeric with at most one `.`
fn numeric_kind(text: &str) -> Option<bool> {
    let body = text.strip_prefix('-').unwrap_or(text);
    if body.is_empty() {
        return None;
    }
    match body.split_once('.') {
        None => body.bytes().all(|b| b.is_ascii_digit()).then_some(false),
        Some((whole, frac)) => (!whole.is_empty()
            && !frac.is_empty()
            && whole.bytes().all(|b| b.is_ascii_digit())
            && frac.bytes().all(|b| b.is_ascii_digit()))
        .then_some(true),
    }
}

/// String relational comparison with numeric promotion
pub(crate) fn relational_promoted(lhs: &str, verb: &str, rhs: &str) -> EvalResult<bool> {
    match (numeric_kind(lhs), numeric_kind(rhs)) {
        (Some(false), Some(false)) => {
            match (lhs.parse::<i32>(), rhs.parse::<i32>()) {
                (Ok(a), Ok(b)) => relational(&a, verb, &b),
                _ => relational(&lhs, verb, &rhs),
            }
        }
        (Some(_), Some(_)) => match (lhs.parse::<f64>(), rhs.parse::<f64>()) {
            (Ok(a), Ok(b)) => relational(&a, verb, &b),
            _ => relational(&lhs, verb, &rhs),
        },
        _ => relational(&lhs, verb, &rhs),
    }
}

/// Full string verb set minus membership (the caller owns list literals)
pub(crate) fn string_compare(lhs: &str, verb: &str, rhs: &str) -> EvalResult<bool> {
    match verb {
        "==" | "!=" | "<" | "<=" | ">" | ">=" => relational_promoted(lhs, verb, rhs),
        "contains" => Ok(lhs.contains(rhs)),
        "notContains" => Ok(!lhs.contains(rhs)),
        "containsCI" => Ok(lower(lhs).contains(&lower(rhs))),
        "notContainsCI" => Ok(!lower(lhs).contains(&lower(rhs))),
        "startsWith" => Ok(lhs.starts_with(rhs)),
        "notStartsWith" => Ok(!lhs.starts_with(rhs)),
        "startsWithCI" => Ok(lower(lhs).starts_with(&lower(rhs))),
        "notStartsWithCI" => Ok(!lower(lhs).starts_with(&lower(rhs))),
        "endsWith" => Ok(lhs.ends_with(rhs)),
        "notEndsWith" => Ok(!lhs.ends_with(rhs)),
        "endsWithCI" => Ok(lower(lhs).ends_with(&lower(rhs))),
        "notEndsWithCI" => Ok(!lower(lhs).ends_with(&lower(rhs))),
        "equalsCI" => Ok(lower(lhs) == lower(rhs)),
        "notEqualsCI" => Ok(lower(lhs) != lower(rhs)),
        _ => Err(EvalError::InvalidOperationVerbAtEvalTime),
    }
}

/// `sizeXX` against a collection or string length
pub(crate) fn size_compare(len: usize, verb: &str, rhs: &str) -> EvalResult<bool> {
    let expected: usize = rhs
        .parse()
        .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
    match verb {
        "sizeEQ" => Ok(len == expected),
        "sizeNE" => Ok(len != expected),
        "sizeLT" => Ok(len < expected),
        "sizeLE" => Ok(len <= expected),
        "sizeGT" => Ok(len > expected),
        "sizeGE" => Ok(len >= expected),
        _ => Err(EvalError::InvalidOperationVerbAtEvalTime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relational_verbs() {
        assert_eq!(relational(&5, "==", &5), Ok(true));
        assert_eq!(relational(&5, "<", &6), Ok(true));
        assert_eq!(relational(&5, ">=", &6), Ok(false));
        assert_eq!(relational(&5, "~", &6), Err(EvalError::InvalidOperationVerbAtEvalTime));
    }

    #[test]
    fn test_arithmetic_with_post_verb() {
        assert_eq!(numeric_compare(10u32, "% 3 ==", "1"), Ok(true));
        assert_eq!(numeric_compare(10u32, "% 3 ==", "2"), Ok(false));
        assert_eq!(numeric_compare(7i32, "+ 3 >=", "10"), Ok(true));
        assert_eq!(numeric_compare(7i32, "* 2 <", "15"), Ok(true));
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(numeric_compare(10i32, "/ 0 ==", "1"), Err(EvalError::DivideByZero));
        assert_eq!(numeric_compare(10i32, "% 0 ==", "1"), Err(EvalError::DivideByZero));
        assert_eq!(numeric_compare(10.0f64, "/ 0.0 ==", "1.0"), Err(EvalError::DivideByZero));
    }

    #[test]
    fn test_float_rem_uses_fmod_semantics() {
        // 7.5 % 2.0 = 1.5
        assert_eq!(numeric_compare(7.5f64, "% 2.0 ==", "1.5"), Ok(true));
        // remainder keeps the dividend's sign
        assert_eq!(numeric_compare(-7.5f64, "% 2.0 ==", "-1.5"), Ok(true));
    }

    #[test]
    fn test_integer_arithmetic_wraps() {
        assert_eq!(numeric_compare(u8::MAX, "+ 1 ==", "0"), Ok(true));
    }

    #[test]
    fn test_string_relational_promotes_numerics() {
        // numeric promotion: "9" < "10" as integers, not lexicographically
        assert_eq!(relational_promoted("9", "<", "10"), Ok(true));
        // dot on either side promotes to float64
        assert_eq!(relational_promoted("9.5", "<", "10"), Ok(true));
        // non-numeric falls back to lexicographic where "9" > "10"
        assert_eq!(relational_promoted("9a", "<", "10a", ), Ok(false));
        assert_eq!(relational_promoted("abc", "<", "abd"), Ok(true));
    }

    #[test]
    fn test_string_verbs() {
        assert_eq!(string_compare("INTC", "contains", "NT"), Ok(true));
        assert_eq!(string_compare("INTC", "notContains", "NT"), Ok(false));
        assert_eq!(string_compare("INTC", "containsCI", "int"), Ok(true));
        assert_eq!(string_compare("INTC", "startsWith", "IN"), Ok(true));
        assert_eq!(string_compare("INTC", "endsWithCI", "tc"), Ok(true));
        assert_eq!(string_compare("INTC", "equalsCI", "intc"), Ok(true));
        assert_eq!(string_compare("INTC", "notEqualsCI", "intc"), Ok(false));
    }

    #[test]
    fn test_size_compare() {
        assert_eq!(size_compare(3, "sizeEQ", "3"), Ok(true));
        assert_eq!(size_compare(3, "sizeNE", "3"), Ok(false));
        assert_eq!(size_compare(3, "sizeLT", "4"), Ok(true));
        assert_eq!(size_compare(3, "sizeGE", "4"), Ok(false));
    }

    #[test]
    fn test_split_arith() {
        let (op, operand, post) = split_arith("% 8 ==").expect("split");
        assert_eq!(op, ArithOp::Rem);
        assert_eq!(operand, "8");
        assert_eq!(post, "==");
        assert!(split_arith("==").is_none());
        assert!(split_arith("% 8").is_none());
    }
}
