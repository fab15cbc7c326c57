//! # Attribute Fetcher
//!
//! Stand-alone API returning one attribute's value from a record, reusing
//! the schema introspector, the validator's access-path parsers, and the
//! evaluator's resolution machinery. A bare path returns the whole
//! attribute (collections included); `[index]` / `[key]` element access
//! follows the same validation rules as predicate left-hand sides.

use crate::compiler::{parse_list_index_at, parse_map_key_at};
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{lookup_map_value, resolve_path};
use crate::schema::{parse_tuple_schema, tuple_schema, AttributeMap, TypeClass};
use crate::trace::Trace;
use crate::value::{materialize, TupleView, Value};

/// Result-side conversion for `get_tuple_attribute_value`. A mismatch
/// between the requested type and the attribute's actual type reports
/// `WrongTypePassed`.
pub trait FromAttribute: Sized {
    fn from_value(value: Value) -> EvalResult<Self>;
}

macro_rules! scalar_from_attribute {
    ($($ty:ty => $variant:ident),*) => {$(
        impl FromAttribute for $ty {
            fn from_value(value: Value) -> EvalResult<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    _ => Err(EvalError::WrongTypePassed),
                }
            }
        }
    )*};
}

scalar_from_attribute!(
    bool => Boolean,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64
);

impl FromAttribute for String {
    fn from_value(value: Value) -> EvalResult<Self> {
        match value {
            Value::Rstring(s) | Value::Ustring(s) => Ok(s),
            Value::BString { value, .. } => Ok(value),
            _ => Err(EvalError::WrongTypePassed),
        }
    }
}

impl<T: FromAttribute> FromAttribute for Vec<T> {
    fn from_value(value: Value) -> EvalResult<Self> {
        match value {
            Value::List { items, .. }
            | Value::BList { items, .. }
            | Value::Set { items, .. }
            | Value::BSet { items, .. } => items.into_iter().map(T::from_value).collect(),
            _ => Err(EvalError::WrongTypePassed),
        }
    }
}

impl FromAttribute for Value {
    fn from_value(value: Value) -> EvalResult<Self> {
        Ok(value)
    }
}

/// Validated attribute reference: the layout shape of a predicate block
/// minus the verb and value slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLayout {
    pub path: String,
    pub type_str: String,
    pub index_or_key: String,
}

/// Validate a fetch path against an attribute map
fn validate_attribute_path(path: &str, attrs: &AttributeMap) -> EvalResult<AttributeLayout> {
    let text = path.trim_start();
    if text.is_empty() {
        return Err(EvalError::EmptyAttributeName);
    }

    let mut best: Option<(&str, &str)> = None;
    for (attr_path, type_str) in attrs {
        if let Some(tail) = text.strip_prefix(attr_path.as_str()) {
            let boundary = matches!(tail.bytes().next(), None | Some(b' ') | Some(b'['));
            if boundary && best.is_none_or(|(p, _)| attr_path.len() > p.len()) {
                best = Some((attr_path.as_str(), type_str.as_str()));
            }
        }
    }
    let Some((attr_path, type_str)) = best else {
        return Err(EvalError::LhsAttributeNameNotFound);
    };

    let mut pos = attr_path.len();
    let mut index_or_key = String::new();
    if text.as_bytes().get(pos) == Some(&b'[') {
        match TypeClass::classify(type_str) {
            TypeClass::List(_) | TypeClass::ListOfTuple(_) => {
                let (index, end) = parse_list_index_at(text, pos)?;
                index_or_key = index;
                pos = end;
            }
            TypeClass::Map(key_type, _) => {
                let (key, end) = parse_map_key_at(text, pos, &TypeClass::classify(&key_type))?;
                index_or_key = key;
                pos = end;
            }
            _ => return Err(EvalError::OpenBracketAfterScalarLhs),
        }
    }
    if !text[pos..].bytes().all(|b| b == b' ') {
        return Err(EvalError::NonSpaceCharacterAfterAttributeName);
    }

    Ok(AttributeLayout {
        path: attr_path.to_string(),
        type_str: type_str.to_string(),
        index_or_key,
    })
}

/// Fetch one attribute's value from a record.
///
/// ```rust
/// use rulegate::{get_tuple_attribute_value, value::{DataType, Value}};
///
/// let record = Value::tuple(vec![
///     ("qty", Value::UInt32(10)),
///     ("marks", Value::list(DataType::Int32, vec![Value::Int32(3), Value::Int32(7)])),
/// ]);
/// let qty: u32 = get_tuple_attribute_value("qty", &record, false).unwrap();
/// assert_eq!(qty, 10);
/// let mark: i32 = get_tuple_attribute_value("marks[1]", &record, false).unwrap();
/// assert_eq!(mark, 7);
/// ```
pub fn get_tuple_attribute_value<T: FromAttribute>(
    path: &str,
    tuple: &dyn TupleView,
    trace: bool,
) -> EvalResult<T> {
    let tracer = Trace::new(trace);
    if path.trim().is_empty() {
        return Err(EvalError::EmptyAttributeName);
    }
    let schema = tuple_schema(tuple)?;
    let attrs = parse_tuple_schema(&schema)?;
    let layout = validate_attribute_path(path, &attrs)?;
    tracer.section("ATTRIBUTE FETCH");
    tracer.line("path", &layout.path);
    tracer.line("type", &layout.type_str);

    let view = resolve_path(tuple, &layout.path)?;
    let value = if layout.index_or_key.is_empty() {
        materialize(view)?
    } else {
        match TypeClass::classify(&layout.type_str) {
            TypeClass::List(_) => {
                let index: usize = layout
                    .index_or_key
                    .parse()
                    .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
                let element = view
                    .iterate()
                    .nth(index)
                    .ok_or(EvalError::InvalidIndexForLhsListAttribute)?;
                materialize(element)?
            }
            TypeClass::ListOfTuple(_) => {
                let index: usize = layout
                    .index_or_key
                    .parse()
                    .map_err(|_| EvalError::InvalidOperationVerbAtEvalTime)?;
                let element = view
                    .iterate()
                    .nth(index)
                    .ok_or(EvalError::InvalidIndexForLhsListOfTupleAttribute)?;
                materialize(element)?
            }
            TypeClass::Map(_, _) => {
                let entry = lookup_map_value(view, &layout.index_or_key)?;
                materialize(entry)?
            }
            _ => return Err(EvalError::OpenBracketAfterScalarLhs),
        }
    };
    tracer.line("value", &value);
    T::from_value(value)
}
