use wirebind_core::Colors;
use wirebind_format::Handle;

use super::Value;

fn sample() -> Value {
    Value::record([
        ("Id", Value::Int(1)),
        ("Name", Value::String("a\"b".to_string())),
        ("Tags", Value::Array(vec![])),
        ("Shape", Value::union(1, Value::Null)),
        ("Pipe", Value::Handle(Handle(3))),
        (
            "Counts",
            Value::Map(vec![(Value::String("x".to_string()), Value::UInt(2))]),
        ),
    ])
}

#[test]
fn compact_format() {
    insta::assert_snapshot!(
        sample().format(false, Colors::OFF),
        @r#"{"Id":1,"Name":"a\"b","Tags":[],"Shape":{"$tag":1,"$value":null},"Pipe":{"$handle":3},"Counts":[["x",2]]}"#
    );
}

#[test]
fn pretty_format() {
    let value = Value::record([
        ("Ok", Value::Bool(true)),
        ("Items", Value::Array(vec![Value::Float(1.5), Value::Null])),
    ]);

    insta::assert_snapshot!(value.format(true, Colors::OFF), @r#"
    {
      "Ok": true,
      "Items": [
        1.5,
        null
      ]
    }
    "#);
}

#[test]
fn colored_keys_and_strings() {
    let value = Value::record([("K", Value::String("v".to_string()))]);
    let out = value.format(false, Colors::new(true));

    assert!(out.contains("\x1b[34m\"K\"\x1b[0m"));
    assert!(out.contains("\x1b[32m\"v\"\x1b[0m"));
}

#[test]
fn serializes_like_format() {
    let value = sample();
    let json = serde_json::to_string(&value).unwrap();

    assert_eq!(json, value.format(false, Colors::OFF));
}

#[test]
fn key_order() {
    let mut keys = vec![
        Value::String("b".to_string()),
        Value::Int(3),
        Value::String("a".to_string()),
        Value::Int(-1),
        Value::Bool(true),
    ];
    keys.sort_by(Value::key_cmp);

    assert_eq!(
        keys,
        [
            Value::Bool(true),
            Value::Int(-1),
            Value::Int(3),
            Value::String("a".to_string()),
            Value::String("b".to_string()),
        ]
    );
}

#[test]
fn absence() {
    assert!(Value::Null.is_absent());
    assert!(Value::Handle(Handle::INVALID).is_absent());
    assert!(!Value::Handle(Handle(1)).is_absent());
    assert!(!Value::union(0, Value::Null).is_absent());
}
