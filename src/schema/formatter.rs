//! # Schema Formatter
//!
//! Renders the canonical type string of any value reachable through a
//! `TupleView`. The rendering is the `Display` impl of `DataType`, so a
//! nested type prints exactly the way the schema parser expects to read it
//! back: `tuple<rstring symbol,float32 price,list<int32> marks>`.

use std::fmt;

use crate::error::{EvalError, EvalResult};
use crate::value::{DataType, TupleView};

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "boolean"),
            DataType::Int8 => write!(f, "int8"),
            DataType::Int16 => write!(f, "int16"),
            DataType::Int32 => write!(f, "int32"),
            DataType::Int64 => write!(f, "int64"),
            DataType::UInt8 => write!(f, "uint8"),
            DataType::UInt16 => write!(f, "uint16"),
            DataType::UInt32 => write!(f, "uint32"),
            DataType::UInt64 => write!(f, "uint64"),
            DataType::Float32 => write!(f, "float32"),
            DataType::Float64 => write!(f, "float64"),
            DataType::Decimal32 => write!(f, "decimal32"),
            DataType::Decimal64 => write!(f, "decimal64"),
            DataType::Decimal128 => write!(f, "decimal128"),
            DataType::Complex32 => write!(f, "complex32"),
            DataType::Complex64 => write!(f, "complex64"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Blob => write!(f, "blob"),
            DataType::Xml => write!(f, "xml"),
            DataType::Rstring => write!(f, "rstring"),
            DataType::BString(bound) => write!(f, "rstring[{bound}]"),
            DataType::Ustring => write!(f, "ustring"),
            DataType::Enum(variants) => {
                write!(f, "enum<")?;
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{variant}")?;
                }
                write!(f, ">")
            }
            DataType::List(elem) => write!(f, "list<{elem}>"),
            DataType::BList(elem, bound) => write!(f, "list<{elem}>[{bound}]"),
            DataType::Set(elem) => write!(f, "set<{elem}>"),
            DataType::BSet(elem, bound) => write!(f, "set<{elem}>[{bound}]"),
            DataType::Map(key, value) => write!(f, "map<{key},{value}>"),
            DataType::BMap(key, value, bound) => write!(f, "map<{key},{value}>[{bound}]"),
            DataType::Tuple(fields) => {
                write!(f, "tuple<")?;
                for (i, (name, field_type)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{field_type} {name}")?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Canonical type string of a whole record. The root must be a tuple.
pub fn tuple_schema(tuple: &dyn TupleView) -> EvalResult<String> {
    let data_type = tuple.data_type();
    if !data_type.is_tuple() {
        return Err(EvalError::RootValueNotATuple);
    }
    Ok(data_type.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(DataType::Boolean.to_string(), "boolean");
        assert_eq!(DataType::UInt32.to_string(), "uint32");
        assert_eq!(DataType::BString(24).to_string(), "rstring[24]");
    }

    #[test]
    fn test_collection_rendering() {
        assert_eq!(
            DataType::List(Box::new(DataType::Int32)).to_string(),
            "list<int32>"
        );
        assert_eq!(
            DataType::Map(Box::new(DataType::Rstring), Box::new(DataType::Int32)).to_string(),
            "map<rstring,int32>"
        );
        assert_eq!(
            DataType::BList(Box::new(DataType::Float64), 10).to_string(),
            "list<float64>[10]"
        );
    }

    #[test]
    fn test_enum_rendering_preserves_declaration_order() {
        let e = DataType::Enum(vec!["sell".to_string(), "buy".to_string()]);
        assert_eq!(e.to_string(), "enum<sell,buy>");
    }

    #[test]
    fn test_nested_tuple_rendering() {
        let record = Value::tuple(vec![
            (
                "who",
                Value::tuple(vec![
                    ("name", Value::rstring("ann")),
                    ("id", Value::Int32(7)),
                ]),
            ),
            ("t", Value::Int64(0)),
        ]);
        assert_eq!(
            tuple_schema(&record).expect("schema"),
            "tuple<tuple<rstring name,int32 id> who,int64 t>"
        );
    }

    #[test]
    fn test_list_of_tuple_rendering() {
        let record = Value::tuple(vec![(
            "lot",
            Value::list(
                DataType::Tuple(vec![
                    ("a".to_string(), DataType::Int32),
                    ("b".to_string(), DataType::Int32),
                ]),
                vec![],
            ),
        )]);
        assert_eq!(
            tuple_schema(&record).expect("schema"),
            "tuple<list<tuple<int32 a,int32 b>> lot>"
        );
    }

    #[test]
    fn test_non_tuple_root_rejected() {
        assert_eq!(
            tuple_schema(&Value::Int32(1)),
            Err(EvalError::RootValueNotATuple)
        );
    }
}
