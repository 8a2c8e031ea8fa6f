use indoc::indoc;

use super::*;

const SAMPLE: &str = indoc! {r#"
    {
        "resolved_types": {
            "k:Point": {
                "struct": {
                    "decl": { "short_name": "Point", "full_identifier": "geo.Point" },
                    "fields": [
                        { "decl": { "short_name": "x" }, "type": { "simple": "int32" }, "offset": 0 },
                        { "decl": { "short_name": "label" }, "type": { "string": { "nullable": true } }, "offset": 8 }
                    ],
                    "version_info": [
                        { "version_number": 0, "num_fields": 2, "num_bytes": 24 }
                    ]
                }
            },
            "k:Color": {
                "enum": {
                    "decl": { "short_name": "Color", "container_type_key": "k:Point" },
                    "values": [
                        { "decl": { "short_name": "RED" }, "int_value": 0 },
                        { "decl": { "short_name": "BLUE" }, "int_value": 4 }
                    ]
                }
            }
        },
        "files": [
            {
                "file_name": "geo.mojom",
                "declared": { "structs": ["k:Point"], "embedded_enums": ["k:Color"] }
            }
        ]
    }
"#};

#[test]
fn parses_struct() {
    let graph = TypeGraph::from_json(SAMPLE).unwrap();
    let Some(UserDefinedType::Struct(point)) = graph.get(&TypeKey::new("k:Point")) else {
        panic!("expected struct");
    };

    assert_eq!(point.decl.qualified(), "geo.Point");
    assert_eq!(point.fields.len(), 2);
    assert_eq!(point.fields[0].ty, Type::Simple(SimpleType::Int32));
    assert_eq!(point.fields[1].ty, Type::String { nullable: true });
    assert_eq!(point.fields[1].offset, 8);
    assert_eq!(point.fields[1].bit, 0);
    assert_eq!(point.version_info[0].num_bytes, 24);
}

#[test]
fn parses_enum_with_container() {
    let graph = TypeGraph::from_json(SAMPLE).unwrap();
    let ty = graph.get(&TypeKey::new("k:Color")).unwrap();

    assert_eq!(ty.kind_name(), "enum");
    assert_eq!(ty.decl().qualified(), "Color");
    assert_eq!(
        ty.decl().container_type_key,
        Some(TypeKey::new("k:Point"))
    );
}

#[test]
fn preserves_declaration_order() {
    let graph = TypeGraph::from_json(SAMPLE).unwrap();
    let keys: Vec<_> = graph.resolved_types.keys().map(TypeKey::as_str).collect();

    assert_eq!(keys, ["k:Point", "k:Color"]);
}

#[test]
fn finds_file() {
    let graph = TypeGraph::from_json(SAMPLE).unwrap();
    let file = graph.file("geo.mojom").unwrap();

    assert_eq!(file.declared.structs, [TypeKey::new("k:Point")]);
    assert!(file.declared.unions.is_empty());
    assert!(graph.file("other.mojom").is_none());
}

#[test]
fn nested_type_defaults() {
    let ty: Type = serde_json::from_str(r#"{ "array": { "element": { "simple": "bool" } } }"#)
        .unwrap();

    assert_eq!(
        ty,
        Type::Array {
            element: Box::new(Type::Simple(SimpleType::Bool)),
            fixed_length: None,
            nullable: false,
        }
    );
    assert!(!ty.is_nullable());
}

#[test]
fn reference_defaults() {
    let ty: Type = serde_json::from_str(r#"{ "reference": { "identifier": "Point" } }"#).unwrap();
    let Type::Reference(r) = ty else {
        panic!("expected reference");
    };

    assert_eq!(r.type_key, None);
    assert!(!r.is_interface_request);
}

#[test]
fn invalid_json_reports_error() {
    let err = TypeGraph::from_json("{ not json").unwrap_err();

    assert!(err.to_string().starts_with("JSON parse error"));
}
