//! # Right-Hand-Side Literal Parsers
//!
//! Type-directed parsing of the value side of a comparison, plus the
//! arithmetic-operand parser and the deliberate mini-parser for `in`/`inCI`
//! list literals.
//!
//! Quoted strings follow the engine's closing heuristic rather than a
//! formal grammar: a quote closes only when the same quote kind is followed
//! (spaces aside) by `&&`, `||`, `)`, or end-of-input; inside square
//! brackets, by `,` or `]`. Interior characters, including same-kind
//! quotes that fail the lookahead, pass through verbatim.

use crate::error::{EvalError, EvalResult};
use crate::schema::TypeClass;

/// True when the byte just past a candidate closing quote terminates a
/// right-hand-side string (outside square brackets)
fn rhs_close_at(bytes: &[u8], mut i: usize) -> bool {
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    if i >= bytes.len() {
        return true;
    }
    match bytes[i] {
        b')' => true,
        b'&' => i + 1 < bytes.len() && bytes[i + 1] == b'&',
        b'|' => i + 1 < bytes.len() && bytes[i + 1] == b'|',
        _ => false,
    }
}

/// True when the byte just past a candidate closing quote terminates a
/// quoted item inside square brackets (map keys, `in` list elements)
fn bracketed_close_at(bytes: &[u8], mut i: usize) -> bool {
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    i >= bytes.len() || bytes[i] == b',' || bytes[i] == b']'
}

/// Index of the closing quote for the quote at `open`, per the heuristic
pub(crate) fn find_quote_close(bytes: &[u8], open: usize, bracketed: bool) -> Option<usize> {
    let kind = bytes[open];
    let mut j = open + 1;
    while j < bytes.len() {
        if bytes[j] == kind {
            let closes = if bracketed {
                bracketed_close_at(bytes, j + 1)
            } else {
                rhs_close_at(bytes, j + 1)
            };
            if closes {
                return Some(j);
            }
        }
        j += 1;
    }
    None
}

/// `true` / `false`, terminated by space, `)`, or end
pub(crate) fn parse_bool_rhs(expr: &str, pos: usize) -> EvalResult<(String, usize)> {
    let rest = &expr[pos..];
    for literal in ["true", "false"] {
        if let Some(tail) = rest.strip_prefix(literal) {
            match tail.bytes().next() {
                None | Some(b' ') | Some(b')') => {
                    return Ok((literal.to_string(), pos + literal.len()))
                }
                _ => {}
            }
        }
    }
    Err(EvalError::RhsValueNoMatchForBooleanLhsType)
}

/// Signed or unsigned integer literal
pub(crate) fn parse_int_rhs(expr: &str, pos: usize, signed: bool) -> EvalResult<(String, usize)> {
    let no_match = if signed {
        EvalError::RhsValueNoMatchForIntLhsType
    } else {
        EvalError::RhsValueNoMatchForUintLhsType
    };
    let bytes = expr.as_bytes();
    let mut i = pos;
    if i < bytes.len() && bytes[i] == b'-' {
        if !signed {
            return Err(EvalError::NegativeRhsForUnsignedLhs);
        }
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return Err(no_match);
    }
    if i < bytes.len() && bytes[i] == b'.' {
        return Err(no_match);
    }
    Ok((expr[pos..i].to_string(), i))
}

/// Float literal; exactly one decimal point, digits on both sides
pub(crate) fn parse_float_rhs(expr: &str, pos: usize) -> EvalResult<(String, usize)> {
    let bytes = expr.as_bytes();
    let mut i = pos;
    if i < bytes.len() && bytes[i] == b'-' {
        i += 1;
    }
    let whole_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == whole_start {
        return Err(EvalError::RhsValueNoMatchForFloatLhsType);
    }
    if i >= bytes.len() || bytes[i] != b'.' {
        return Err(EvalError::MissingDecimalPointInRhs);
    }
    i += 1;
    let frac_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == frac_start {
        return Err(EvalError::RhsValueNoMatchForFloatLhsType);
    }
    if i < bytes.len() && bytes[i] == b'.' {
        return Err(EvalError::MultipleDecimalPointsInRhs);
    }
    Ok((expr[pos..i].to_string(), i))
}

/// Quoted string literal; returns the unquoted interior
pub(crate) fn parse_string_rhs(expr: &str, pos: usize) -> EvalResult<(String, usize)> {
    let bytes = expr.as_bytes();
    if pos >= bytes.len() || (bytes[pos] != b'\'' && bytes[pos] != b'"') {
        return Err(EvalError::MissingOpenQuoteInRhsString);
    }
    let close = find_quote_close(bytes, pos, false)
        .ok_or(EvalError::MissingCloseQuoteInRhsString)?;
    Ok((expr[pos + 1..close].to_string(), close + 1))
}

/// Non-negative decimal for the size verbs
pub(crate) fn parse_size_rhs(expr: &str, pos: usize) -> EvalResult<(String, usize)> {
    let bytes = expr.as_bytes();
    let mut i = pos;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == pos {
        return Err(EvalError::AllDigitsNotFoundInSizeRhs);
    }
    Ok((expr[pos..i].to_string(), i))
}

/// `[ ... ]` membership literal, captured verbatim (interior commas and
/// spaces preserved); the closing `]` is found with quote awareness
pub(crate) fn parse_membership_rhs(expr: &str, pos: usize) -> EvalResult<(String, usize)> {
    let bytes = expr.as_bytes();
    if pos >= bytes.len() || bytes[pos] != b'[' {
        return Err(EvalError::MissingOpenBracketInRhsListLiteral);
    }
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = find_quote_close(bytes, i, true)
                    .ok_or(EvalError::MissingCloseBracketInRhsListLiteral)?
                    + 1;
            }
            b']' => return Ok((expr[pos..=i].to_string(), i + 1)),
            _ => i += 1,
        }
    }
    Err(EvalError::MissingCloseBracketInRhsListLiteral)
}

/// Parse a captured `[ ... ]` literal into its element texts, validated
/// against the element type class. String elements must be quoted and come
/// back unquoted; any malformed element reports `InvalidRhsListLiteral`.
pub fn parse_membership_literal(literal: &str, elem: &TypeClass) -> EvalResult<Vec<String>> {
    let bytes = literal.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'[' || bytes[bytes.len() - 1] != b']' {
        return Err(EvalError::InvalidRhsListLiteral);
    }
    let inner = &literal[1..literal.len() - 1];
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let inner_bytes = inner.as_bytes();
    let mut start = 0usize;
    let mut i = 0usize;
    while i <= inner_bytes.len() {
        if i == inner_bytes.len() || inner_bytes[i] == b',' {
            items.push(parse_membership_item(inner[start..i].trim(), elem)?);
            start = i + 1;
            i += 1;
        } else if inner_bytes[i] == b'\'' || inner_bytes[i] == b'"' {
            i = find_quote_close(inner_bytes, i, true).ok_or(EvalError::InvalidRhsListLiteral)? + 1;
        } else {
            i += 1;
        }
    }
    Ok(items)
}

fn parse_membership_item(item: &str, elem: &TypeClass) -> EvalResult<String> {
    if item.is_empty() {
        return Err(EvalError::InvalidRhsListLiteral);
    }
    match elem {
        TypeClass::Str => {
            let bytes = item.as_bytes();
            let quoted = bytes.len() >= 2
                && (bytes[0] == b'\'' || bytes[0] == b'"')
                && bytes[bytes.len() - 1] == bytes[0];
            if !quoted {
                return Err(EvalError::InvalidRhsListLiteral);
            }
            Ok(item[1..item.len() - 1].to_string())
        }
        TypeClass::Boolean => {
            if item == "true" || item == "false" {
                Ok(item.to_string())
            } else {
                Err(EvalError::InvalidRhsListLiteral)
            }
        }
        c if c.is_float() => {
            if is_float_text(item, true) {
                Ok(item.to_string())
            } else {
                Err(EvalError::InvalidRhsListLiteral)
            }
        }
        c if c.is_numeric() => {
            if is_int_text(item, c.is_signed_numeric()) {
                Ok(item.to_string())
            } else {
                Err(EvalError::InvalidRhsListLiteral)
            }
        }
        _ => Err(EvalError::InvalidRhsListLiteral),
    }
}

fn is_int_text(text: &str, signed: bool) -> bool {
    let digits = if signed {
        text.strip_prefix('-').unwrap_or(text)
    } else {
        text
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_text(text: &str, signed: bool) -> bool {
    let body = if signed {
        text.strip_prefix('-').unwrap_or(text)
    } else {
        text
    };
    match body.split_once('.') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && !frac.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Parse the ` <operand> ` of an arithmetic verb; the caller has consumed
/// the space after the verb. Sign and decimal-point rules follow the
/// left-hand-side class.
pub(crate) fn parse_arithmetic_operand(
    expr: &str,
    pos: usize,
    class: &TypeClass,
) -> EvalResult<(String, usize)> {
    let bytes = expr.as_bytes();
    let mut i = pos;
    if i < bytes.len() && bytes[i] == b'-' {
        if class.is_unsigned() {
            return Err(EvalError::NegativeOperandForUnsignedLhs);
        }
        if !class.is_signed_numeric() {
            return Err(EvalError::AllDigitsNotFoundInArithmeticOperand);
        }
        i += 1;
    }
    let whole_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == whole_start {
        return Err(EvalError::AllDigitsNotFoundInArithmeticOperand);
    }
    if class.is_float() {
        if i >= bytes.len() || bytes[i] != b'.' {
            return Err(EvalError::MissingDecimalPointInFloatArithmeticOperand);
        }
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return Err(EvalError::AllDigitsNotFoundInArithmeticOperand);
        }
        if i < bytes.len() && bytes[i] == b'.' {
            return Err(EvalError::MultipleDecimalPointsInArithmeticOperand);
        }
    } else if i < bytes.len() && bytes[i] == b'.' {
        return Err(EvalError::UnexpectedDecimalPointInArithmeticOperand);
    }
    if i >= bytes.len() || bytes[i] != b' ' {
        return Err(EvalError::MissingSpaceAfterArithmeticOperand);
    }
    Ok((expr[pos..i].to_string(), i))
}
