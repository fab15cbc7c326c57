//! Formatter/parser round trips: every leaf attribute reachable from a
//! record must come back out of the parsed canonical schema.

use rulegate::schema::{parse_tuple_schema, tuple_schema};
use rulegate::value::{DataType, TupleView, Value};

fn leaf_paths(value: &Value, prefix: &str, out: &mut Vec<String>) {
    match value.data_type() {
        DataType::Tuple(_) => {
            for (name, _) in value.attribute_names() {
                let child = value.attribute_value(&name).expect("attribute present");
                let qualified = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                match child.data_type() {
                    DataType::Tuple(_) => {
                        // nested tuples flatten; materialise the child to recurse
                        let owned = rulegate::value::materialize(child).expect("tuple");
                        leaf_paths(&owned, &qualified, out);
                    }
                    _ => out.push(qualified),
                }
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

fn assert_round_trip(record: &Value) {
    let schema = tuple_schema(record).expect("schema");
    let map = parse_tuple_schema(&schema).expect("parse");
    let mut expected = Vec::new();
    leaf_paths(record, "", &mut expected);
    let parsed: Vec<String> = map.keys().cloned().collect();
    assert_eq!(parsed, expected, "schema was: {schema}");
}

#[test]
fn flat_record_round_trips() {
    assert_round_trip(&Value::tuple(vec![
        ("symbol", Value::rstring("INTC")),
        ("price", Value::Float32(97.5)),
        ("qty", Value::UInt32(10)),
        ("buy", Value::Boolean(true)),
    ]));
}

#[test]
fn collection_record_round_trips() {
    assert_round_trip(&Value::tuple(vec![
        (
            "marks",
            Value::list(DataType::Int32, vec![Value::Int32(1)]),
        ),
        ("tags", Value::set(DataType::Rstring, vec![])),
        (
            "kv",
            Value::map(DataType::Rstring, DataType::Int32, vec![]),
        ),
    ]));
}

#[test]
fn nested_tuple_round_trips() {
    assert_round_trip(&Value::tuple(vec![
        (
            "who",
            Value::tuple(vec![
                ("name", Value::rstring("ann")),
                (
                    "address",
                    Value::tuple(vec![
                        ("city", Value::rstring("x")),
                        ("zip", Value::Int32(0)),
                    ]),
                ),
            ]),
        ),
        ("t", Value::Int64(1)),
    ]));
}

#[test]
fn list_of_tuple_is_one_leaf() {
    let record = Value::tuple(vec![
        (
            "legs",
            Value::list(
                DataType::Tuple(vec![
                    ("venue".to_string(), DataType::Rstring),
                    ("size".to_string(), DataType::Int32),
                ]),
                vec![],
            ),
        ),
        ("account", Value::rstring("A1")),
    ]);
    let schema = tuple_schema(&record).expect("schema");
    assert_eq!(
        schema,
        "tuple<list<tuple<rstring venue,int32 size>> legs,rstring account>"
    );
    let map = parse_tuple_schema(&schema).expect("parse");
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["legs", "account"]);
    assert_eq!(
        map.get("legs").map(String::as_str),
        Some("list<tuple<rstring venue,int32 size>>")
    );
}

#[test]
fn opaque_types_render_and_parse() {
    let record = Value::tuple(vec![
        (
            "ts",
            Value::Timestamp {
                seconds: 1,
                nanoseconds: 2,
            },
        ),
        ("d", Value::Decimal64("1.25".to_string())),
        ("c", Value::Complex32(1.0, 2.0)),
        ("payload", Value::Blob(vec![1, 2, 3])),
        ("doc", Value::Xml("<a/>".to_string())),
        ("u", Value::ustring("wide")),
        (
            "color",
            Value::enumeration(vec!["red", "green", "blue"], "green"),
        ),
    ]);
    let schema = tuple_schema(&record).expect("schema");
    assert_eq!(
        schema,
        "tuple<timestamp ts,decimal64 d,complex32 c,blob payload,xml doc,ustring u,enum<red,green,blue> color>"
    );
    let map = parse_tuple_schema(&schema).expect("parse");
    assert_eq!(map.len(), 7);
    assert_eq!(
        map.get("color").map(String::as_str),
        Some("enum<red,green,blue>")
    );
}

#[test]
fn bounded_variants_render_with_bounds_and_validate_as_base() {
    let record = Value::tuple(vec![
        (
            "tag",
            Value::BString {
                value: "ab".to_string(),
                bound: 8,
            },
        ),
        (
            "ids",
            Value::BList {
                elem: DataType::Int32,
                items: vec![Value::Int32(1)],
                bound: 4,
            },
        ),
    ]);
    let schema = tuple_schema(&record).expect("schema");
    assert_eq!(schema, "tuple<rstring[8] tag,list<int32>[4] ids>");
    let map = parse_tuple_schema(&schema).expect("parse");
    assert_eq!(map.get("tag").map(String::as_str), Some("rstring"));
    assert_eq!(map.get("ids").map(String::as_str), Some("list<int32>"));
}

#[test]
fn empty_collections_keep_their_element_types() {
    let record = Value::tuple(vec![(
        "empty",
        Value::list(DataType::List(Box::new(DataType::Float64)), vec![]),
    )]);
    let schema = tuple_schema(&record).expect("schema");
    assert_eq!(schema, "tuple<list<list<float64>> empty>");
}
