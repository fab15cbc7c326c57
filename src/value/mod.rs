//! # Tuple Value Model
//!
//! The record side of the engine: a flat `MetaType` tag, a recursive
//! `DataType` descriptor, the `TupleView` capability through which the
//! evaluator reads host records, and an owned `Value` implementing that
//! capability so the crate is usable stand-alone.
//!
//! Empty collections keep their element type in `DataType`, which is what
//! lets the schema formatter render a canonical type string without probing
//! elements.
//!
//! ## Usage
//!
//! ```rust
//! use rulegate::value::{DataType, Value};
//!
//! let record = Value::tuple(vec![
//!     ("symbol", Value::rstring("INTC")),
//!     ("price", Value::Float32(97.5)),
//!     ("marks", Value::list(DataType::Int32, vec![Value::Int32(3)])),
//! ]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EvalError, EvalResult};

/// Flat type tag of a value, as reported by `TupleView::meta_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal32,
    Decimal64,
    Decimal128,
    Complex32,
    Complex64,
    Timestamp,
    Blob,
    Xml,
    Rstring,
    BString,
    Ustring,
    Enum,
    List,
    BList,
    Set,
    BSet,
    Map,
    BMap,
    Tuple,
}

/// Recursive type descriptor for any value the engine can see.
///
/// Bounded variants carry their bound `N`; validation treats them as the
/// unbounded base type, the formatter renders the `[N]` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal32,
    Decimal64,
    Decimal128,
    Complex32,
    Complex64,
    Timestamp,
    Blob,
    Xml,
    Rstring,
    /// Bounded rstring, rendered `rstring[N]`
    BString(usize),
    Ustring,
    /// Enumeration with its declaration-ordered variants
    Enum(Vec<String>),
    List(Box<DataType>),
    BList(Box<DataType>, usize),
    Set(Box<DataType>),
    BSet(Box<DataType>, usize),
    Map(Box<DataType>, Box<DataType>),
    BMap(Box<DataType>, Box<DataType>, usize),
    /// Named, ordered attributes
    Tuple(Vec<(String, DataType)>),
}

impl DataType {
    /// Flat tag for this type
    pub fn meta_type(&self) -> MetaType {
        match self {
            DataType::Boolean => MetaType::Boolean,
            DataType::Int8 => MetaType::Int8,
            DataType::Int16 => MetaType::Int16,
            DataType::Int32 => MetaType::Int32,
            DataType::Int64 => MetaType::Int64,
            DataType::UInt8 => MetaType::UInt8,
            DataType::UInt16 => MetaType::UInt16,
            DataType::UInt32 => MetaType::UInt32,
            DataType::UInt64 => MetaType::UInt64,
            DataType::Float32 => MetaType::Float32,
            DataType::Float64 => MetaType::Float64,
            DataType::Decimal32 => MetaType::Decimal32,
            DataType::Decimal64 => MetaType::Decimal64,
            DataType::Decimal128 => MetaType::Decimal128,
            DataType::Complex32 => MetaType::Complex32,
            DataType::Complex64 => MetaType::Complex64,
            DataType::Timestamp => MetaType::Timestamp,
            DataType::Blob => MetaType::Blob,
            DataType::Xml => MetaType::Xml,
            DataType::Rstring => MetaType::Rstring,
            DataType::BString(_) => MetaType::BString,
            DataType::Ustring => MetaType::Ustring,
            DataType::Enum(_) => MetaType::Enum,
            DataType::List(_) => MetaType::List,
            DataType::BList(_, _) => MetaType::BList,
            DataType::Set(_) => MetaType::Set,
            DataType::BSet(_, _) => MetaType::BSet,
            DataType::Map(_, _) => MetaType::Map,
            DataType::BMap(_, _, _) => MetaType::BMap,
            DataType::Tuple(_) => MetaType::Tuple,
        }
    }

    /// True for the numeric scalar types
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
        )
    }

    /// True for tuple-typed values
    pub fn is_tuple(&self) -> bool {
        matches!(self, DataType::Tuple(_))
    }
}

/// Capability through which the engine reads a record.
///
/// Hosts implement this over their own record representation; the crate's
/// `Value` is one such implementation. Typed extraction methods fail with
/// `WrongTypePassed` when the underlying type does not match, and every
/// structural method has a conservative default so scalar hosts only
/// implement what they carry.
pub trait TupleView {
    /// Full recursive type of this value
    fn data_type(&self) -> DataType;

    /// Flat type tag of this value
    fn meta_type(&self) -> MetaType {
        self.data_type().meta_type()
    }

    /// Attribute names with their positional indices (tuples only)
    fn attribute_names(&self) -> Vec<(String, usize)> {
        Vec::new()
    }

    /// Named attribute lookup (tuples only)
    fn attribute_value(&self, _name: &str) -> Option<&dyn TupleView> {
        None
    }

    /// Element iteration (lists and sets only)
    fn iterate(&self) -> Box<dyn Iterator<Item = &dyn TupleView> + '_> {
        Box::new(std::iter::empty())
    }

    /// Pair iteration (maps only)
    fn iterate_pairs(&self) -> Box<dyn Iterator<Item = (&dyn TupleView, &dyn TupleView)> + '_> {
        Box::new(std::iter::empty())
    }

    /// Declared bound for bounded variants
    fn bounded_size(&self) -> Option<usize> {
        None
    }

    fn as_boolean(&self) -> EvalResult<bool> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_int8(&self) -> EvalResult<i8> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_int16(&self) -> EvalResult<i16> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_int32(&self) -> EvalResult<i32> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_int64(&self) -> EvalResult<i64> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_uint8(&self) -> EvalResult<u8> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_uint16(&self) -> EvalResult<u16> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_uint32(&self) -> EvalResult<u32> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_uint64(&self) -> EvalResult<u64> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_float32(&self) -> EvalResult<f32> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_float64(&self) -> EvalResult<f64> {
        Err(EvalError::WrongTypePassed)
    }
    fn as_rstring(&self) -> EvalResult<&str> {
        Err(EvalError::WrongTypePassed)
    }
}

/// Owned record value implementing `TupleView`
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// Textual decimal; recognised in schemas, never compared
    Decimal32(String),
    Decimal64(String),
    Decimal128(String),
    Complex32(f32, f32),
    Complex64(f64, f64),
    Timestamp {
        seconds: i64,
        nanoseconds: u32,
    },
    Blob(Vec<u8>),
    Xml(String),
    Rstring(String),
    BString {
        value: String,
        bound: usize,
    },
    Ustring(String),
    Enum {
        variants: Vec<String>,
        value: String,
    },
    List {
        elem: DataType,
        items: Vec<Value>,
    },
    BList {
        elem: DataType,
        items: Vec<Value>,
        bound: usize,
    },
    Set {
        elem: DataType,
        items: Vec<Value>,
    },
    BSet {
        elem: DataType,
        items: Vec<Value>,
        bound: usize,
    },
    Map {
        key: DataType,
        value: DataType,
        entries: Vec<(Value, Value)>,
    },
    BMap {
        key: DataType,
        value: DataType,
        entries: Vec<(Value, Value)>,
        bound: usize,
    },
    Tuple {
        attributes: Vec<(String, Value)>,
    },
}

impl Value {
    /// rstring helper
    pub fn rstring(s: impl Into<String>) -> Self {
        Value::Rstring(s.into())
    }

    /// ustring helper
    pub fn ustring(s: impl Into<String>) -> Self {
        Value::Ustring(s.into())
    }

    /// list helper; `elem` is authoritative even when `items` is empty
    pub fn list(elem: DataType, items: Vec<Value>) -> Self {
        Value::List { elem, items }
    }

    /// set helper
    pub fn set(elem: DataType, items: Vec<Value>) -> Self {
        Value::Set { elem, items }
    }

    /// map helper
    pub fn map(key: DataType, value: DataType, entries: Vec<(Value, Value)>) -> Self {
        Value::Map { key, value, entries }
    }

    /// tuple helper
    pub fn tuple(attributes: Vec<(&str, Value)>) -> Self {
        Value::Tuple {
            attributes: attributes
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    /// enum helper; `value` must be one of `variants`
    pub fn enumeration(variants: Vec<&str>, value: &str) -> Self {
        Value::Enum {
            variants: variants.into_iter().map(str::to_string).collect(),
            value: value.to_string(),
        }
    }
}

impl TupleView for Value {
    fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt8(_) => DataType::UInt8,
            Value::UInt16(_) => DataType::UInt16,
            Value::UInt32(_) => DataType::UInt32,
            Value::UInt64(_) => DataType::UInt64,
            Value::Float32(_) => DataType::Float32,
            Value::Float64(_) => DataType::Float64,
            Value::Decimal32(_) => DataType::Decimal32,
            Value::Decimal64(_) => DataType::Decimal64,
            Value::Decimal128(_) => DataType::Decimal128,
            Value::Complex32(_, _) => DataType::Complex32,
            Value::Complex64(_, _) => DataType::Complex64,
            Value::Timestamp { .. } => DataType::Timestamp,
            Value::Blob(_) => DataType::Blob,
            Value::Xml(_) => DataType::Xml,
            Value::Rstring(_) => DataType::Rstring,
            Value::BString { bound, .. } => DataType::BString(*bound),
            Value::Ustring(_) => DataType::Ustring,
            Value::Enum { variants, .. } => DataType::Enum(variants.clone()),
            Value::List { elem, .. } => DataType::List(Box::new(elem.clone())),
            Value::BList { elem, bound, .. } => DataType::BList(Box::new(elem.clone()), *bound),
            Value::Set { elem, .. } => DataType::Set(Box::new(elem.clone())),
            Value::BSet { elem, bound, .. } => DataType::BSet(Box::new(elem.clone()), *bound),
            Value::Map { key, value, .. } => {
                DataType::Map(Box::new(key.clone()), Box::new(value.clone()))
            }
            Value::BMap {
                key, value, bound, ..
            } => DataType::BMap(Box::new(key.clone()), Box::new(value.clone()), *bound),
            Value::Tuple { attributes } => DataType::Tuple(
                attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.data_type()))
                    .collect(),
            ),
        }
    }

    fn attribute_names(&self) -> Vec<(String, usize)> {
        match self {
            Value::Tuple { attributes } => attributes
                .iter()
                .enumerate()
                .map(|(index, (name, _))| (name.clone(), index))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn attribute_value(&self, name: &str) -> Option<&dyn TupleView> {
        match self {
            Value::Tuple { attributes } => attributes
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, value)| value as &dyn TupleView),
            _ => None,
        }
    }

    fn iterate(&self) -> Box<dyn Iterator<Item = &dyn TupleView> + '_> {
        match self {
            Value::List { items, .. }
            | Value::BList { items, .. }
            | Value::Set { items, .. }
            | Value::BSet { items, .. } => {
                Box::new(items.iter().map(|item| item as &dyn TupleView))
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn iterate_pairs(&self) -> Box<dyn Iterator<Item = (&dyn TupleView, &dyn TupleView)> + '_> {
        match self {
            Value::Map { entries, .. } | Value::BMap { entries, .. } => Box::new(
                entries
                    .iter()
                    .map(|(key, value)| (key as &dyn TupleView, value as &dyn TupleView)),
            ),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn bounded_size(&self) -> Option<usize> {
        match self {
            Value::BString { bound, .. }
            | Value::BList { bound, .. }
            | Value::BSet { bound, .. }
            | Value::BMap { bound, .. } => Some(*bound),
            _ => None,
        }
    }

    fn as_boolean(&self) -> EvalResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_int8(&self) -> EvalResult<i8> {
        match self {
            Value::Int8(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_int16(&self) -> EvalResult<i16> {
        match self {
            Value::Int16(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_int32(&self) -> EvalResult<i32> {
        match self {
            Value::Int32(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_int64(&self) -> EvalResult<i64> {
        match self {
            Value::Int64(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_uint8(&self) -> EvalResult<u8> {
        match self {
            Value::UInt8(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_uint16(&self) -> EvalResult<u16> {
        match self {
            Value::UInt16(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_uint32(&self) -> EvalResult<u32> {
        match self {
            Value::UInt32(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_uint64(&self) -> EvalResult<u64> {
        match self {
            Value::UInt64(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_float32(&self) -> EvalResult<f32> {
        match self {
            Value::Float32(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_float64(&self) -> EvalResult<f64> {
        match self {
            Value::Float64(v) => Ok(*v),
            _ => Err(EvalError::WrongTypePassed),
        }
    }

    fn as_rstring(&self) -> EvalResult<&str> {
        match self {
            Value::Rstring(s) | Value::Ustring(s) => Ok(s),
            Value::BString { value, .. } => Ok(value),
            _ => Err(EvalError::WrongTypePassed),
        }
    }
}

/// Materialise any supported value reachable through a view into an owned
/// `Value`. Used by the attribute fetcher; types the capability surface
/// cannot extract (decimal, complex, timestamp, blob, xml, enum) report
/// `UnsupportedAttributeTypeForFetch`.
pub fn materialize(view: &dyn TupleView) -> EvalResult<Value> {
    match view.data_type() {
        DataType::Boolean => Ok(Value::Boolean(view.as_boolean()?)),
        DataType::Int8 => Ok(Value::Int8(view.as_int8()?)),
        DataType::Int16 => Ok(Value::Int16(view.as_int16()?)),
        DataType::Int32 => Ok(Value::Int32(view.as_int32()?)),
        DataType::Int64 => Ok(Value::Int64(view.as_int64()?)),
        DataType::UInt8 => Ok(Value::UInt8(view.as_uint8()?)),
        DataType::UInt16 => Ok(Value::UInt16(view.as_uint16()?)),
        DataType::UInt32 => Ok(Value::UInt32(view.as_uint32()?)),
        DataType::UInt64 => Ok(Value::UInt64(view.as_uint64()?)),
        DataType::Float32 => Ok(Value::Float32(view.as_float32()?)),
        DataType::Float64 => Ok(Value::Float64(view.as_float64()?)),
        DataType::Rstring | DataType::BString(_) => {
            Ok(Value::Rstring(view.as_rstring()?.to_string()))
        }
        DataType::List(elem) | DataType::BList(elem, _) => {
            let items = view.iterate().map(materialize).collect::<EvalResult<_>>()?;
            Ok(Value::List { elem: *elem, items })
        }
        DataType::Set(elem) | DataType::BSet(elem, _) => {
            let items = view.iterate().map(materialize).collect::<EvalResult<_>>()?;
            Ok(Value::Set { elem: *elem, items })
        }
        DataType::Map(key, value) | DataType::BMap(key, value, _) => {
            let entries = view
                .iterate_pairs()
                .map(|(k, v)| Ok((materialize(k)?, materialize(v)?)))
                .collect::<EvalResult<_>>()?;
            Ok(Value::Map {
                key: *key,
                value: *value,
                entries,
            })
        }
        DataType::Tuple(_) => {
            let attributes = view
                .attribute_names()
                .into_iter()
                .map(|(name, _)| {
                    let attr = view
                        .attribute_value(&name)
                        .ok_or(EvalError::AttributeResolutionFailedAtEvalTime)?;
                    Ok((name, materialize(attr)?))
                })
                .collect::<EvalResult<_>>()?;
            Ok(Value::Tuple { attributes })
        }
        _ => Err(EvalError::UnsupportedAttributeTypeForFetch),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Decimal32(s) | Value::Decimal64(s) | Value::Decimal128(s) => {
                write!(f, "{s}")
            }
            Value::Complex32(re, im) => write!(f, "({re},{im})"),
            Value::Complex64(re, im) => write!(f, "({re},{im})"),
            Value::Timestamp {
                seconds,
                nanoseconds,
            } => write!(f, "({seconds},{nanoseconds})"),
            Value::Blob(bytes) => write!(f, "blob[{}]", bytes.len()),
            Value::Xml(s) => write!(f, "{s}"),
            Value::Rstring(s) | Value::Ustring(s) => write!(f, "\"{s}\""),
            Value::BString { value, .. } => write!(f, "\"{value}\""),
            Value::Enum { value, .. } => write!(f, "{value}"),
            Value::List { items, .. }
            | Value::BList { items, .. }
            | Value::Set { items, .. }
            | Value::BSet { items, .. } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map { entries, .. } | Value::BMap { entries, .. } => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{key}:{value}")?;
                }
                write!(f, "}}")
            }
            Value::Tuple { attributes } => {
                write!(f, "{{")?;
                for (i, (name, value)) in attributes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
