//! # Schema Parser
//!
//! Flattens a canonical type string into the ordered attribute path map the
//! validator works from. Nested tuple attributes flatten with `.` as the
//! separator; a `list<tuple<...>>` stays a single entry whose type string
//! begins with `list<tuple<` (its contents are resolved recursively at
//! validate/eval time, never here).
//!
//! The scan is byte-indexed with an angle-bracket depth counter, in the
//! order the attributes are declared; `IndexMap` preserves that order.

use indexmap::IndexMap;

use crate::error::{EvalError, EvalResult};
use crate::schema::strip_bound;

/// Ordered `dotted.path -> type` map over all leaf attributes
pub type AttributeMap = IndexMap<String, String>;

/// Parse a canonical tuple schema into its attribute path map.
///
/// ```rust
/// use rulegate::schema::parse_tuple_schema;
///
/// let map = parse_tuple_schema("tuple<rstring symbol,list<int32> marks>").unwrap();
/// assert_eq!(map.get("symbol").map(String::as_str), Some("rstring"));
/// assert_eq!(map.get("marks").map(String::as_str), Some("list<int32>"));
/// ```
pub fn parse_tuple_schema(schema: &str) -> EvalResult<AttributeMap> {
    let s = schema.trim();
    if s.is_empty() {
        return Err(EvalError::EmptySchema);
    }
    if !s.starts_with("tuple<") {
        return Err(EvalError::MissingTupleLiteral);
    }

    // Whole-string balance check before the structural walk
    let mut depth = 0i32;
    for b in s.bytes() {
        match b {
            b'<' => depth += 1,
            b'>' => {
                depth -= 1;
                if depth < 0 {
                    return Err(EvalError::UnmatchedBracketsInSchema);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(EvalError::UnmatchedBracketsInSchema);
    }

    let mut map = AttributeMap::new();
    let end = parse_fields(s, "tuple<".len(), "", &mut map)?;
    if end != s.len() {
        return Err(EvalError::MissingCommaOrCloseAfterAttributeName);
    }
    Ok(map)
}

/// Parse the fields of one tuple body starting at `pos` (just past its
/// `tuple<`), registering every leaf under `prefix`. Returns the position
/// just past the tuple's closing `>`.
fn parse_fields(
    s: &str,
    mut pos: usize,
    prefix: &str,
    map: &mut AttributeMap,
) -> EvalResult<usize> {
    let bytes = s.as_bytes();
    loop {
        while pos < s.len() && bytes[pos] == b' ' {
            pos += 1;
        }
        if pos >= s.len() {
            return Err(EvalError::UnmatchedBracketsInSchema);
        }
        if bytes[pos] == b'>' {
            return Ok(pos + 1);
        }

        if s[pos..].starts_with("list<tuple<") {
            // One leaf entry carrying the whole list<tuple<...>> type; the
            // '>> ' marker bounds the type substring.
            let close = find_matching(s, pos + "list".len())?;
            let type_str = &s[pos..=close];
            if !type_str.ends_with(">>") {
                return Err(EvalError::MissingCloseTagForListOfTuple);
            }
            let after = skip_bound_suffix(s, close + 1);
            if after >= s.len() || bytes[after] != b' ' {
                return Err(EvalError::MissingCloseTagForListOfTuple);
            }
            let (name, name_end) = read_attribute_name(s, after + 1)?;
            register(map, qualify(prefix, &name), type_str)?;
            pos = consume_separator(s, name_end)?;
        } else if s[pos..].starts_with("tuple<") {
            // Nested tuple: its attribute name sits after the matching '>'
            let close = find_matching(s, pos + "tuple".len())?;
            let after = close + 1;
            if after >= s.len() || bytes[after] != b' ' {
                return Err(EvalError::MissingSpaceBeforeAttributeName);
            }
            let (name, name_end) = read_attribute_name(s, after + 1)?;
            let qualified = qualify(prefix, &name);
            let inner_prefix = format!("{qualified}.");
            let inner_end = parse_fields(s, pos + "tuple<".len(), &inner_prefix, map)?;
            if inner_end != close + 1 {
                return Err(EvalError::UnmatchedBracketsInSchema);
            }
            pos = consume_separator(s, name_end)?;
        } else {
            let (type_str, after) = read_type_token(s, pos)?;
            if after >= s.len() || bytes[after] != b' ' {
                return Err(EvalError::MissingSpaceBeforeAttributeName);
            }
            let (name, name_end) = read_attribute_name(s, after + 1)?;
            register(map, qualify(prefix, &name), strip_bound(&type_str))?;
            pos = consume_separator(s, name_end)?;
        }
    }
}

/// Read one non-tuple type token starting at `pos`; returns the token text
/// and the position after it (bound suffix consumed but excluded)
fn read_type_token(s: &str, pos: usize) -> EvalResult<(String, usize)> {
    for keyword in ["list<", "set<", "map<", "enum<"] {
        if s[pos..].starts_with(keyword) {
            let open = pos + keyword.len() - 1;
            let close = find_matching(s, open)?;
            let end = skip_bound_suffix(s, close + 1);
            return Ok((s[pos..=close].to_string(), end));
        }
    }
    let bytes = s.as_bytes();
    let mut end = pos;
    while end < s.len() && bytes[end].is_ascii_alphanumeric() {
        end += 1;
    }
    if end == pos {
        return Err(EvalError::MissingSpaceBeforeAttributeName);
    }
    let token_end = skip_bound_suffix(s, end);
    Ok((s[pos..end].to_string(), token_end))
}

/// Index of the `>` matching the `<` at `open`
fn find_matching(s: &str, open: usize) -> EvalResult<usize> {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes[open], b'<');
    let mut depth = 0usize;
    for (idx, b) in s.bytes().enumerate().skip(open) {
        match b {
            b'<' => depth += 1,
            b'>' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }
    Err(EvalError::UnmatchedBracketsInSchema)
}

/// Skip a `[N]` bound suffix at `pos`, if present
fn skip_bound_suffix(s: &str, pos: usize) -> usize {
    let bytes = s.as_bytes();
    if pos < s.len() && bytes[pos] == b'[' {
        let mut end = pos + 1;
        while end < s.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > pos + 1 && end < s.len() && bytes[end] == b']' {
            return end + 1;
        }
    }
    pos
}

/// Read an attribute identifier at `pos`
fn read_attribute_name(s: &str, pos: usize) -> EvalResult<(String, usize)> {
    let bytes = s.as_bytes();
    let mut end = pos;
    while end < s.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    if end == pos {
        return Err(EvalError::MissingSpaceBeforeAttributeName);
    }
    if bytes[pos].is_ascii_digit() {
        return Err(EvalError::MissingSpaceBeforeAttributeName);
    }
    Ok((s[pos..end].to_string(), end))
}

/// After a field's name only `,` (consumed) or `>` (left in place) may follow
fn consume_separator(s: &str, name_end: usize) -> EvalResult<usize> {
    let bytes = s.as_bytes();
    if name_end >= s.len() {
        return Err(EvalError::MissingCommaOrCloseAfterAttributeName);
    }
    match bytes[name_end] {
        b',' => Ok(name_end + 1),
        b'>' => Ok(name_end),
        _ => Err(EvalError::MissingCommaOrCloseAfterAttributeName),
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

fn register(map: &mut AttributeMap, path: String, type_str: &str) -> EvalResult<()> {
    if map.insert(path, type_str.to_string()).is_some() {
        return Err(EvalError::DuplicateAttributePath);
    }
    Ok(())
}
