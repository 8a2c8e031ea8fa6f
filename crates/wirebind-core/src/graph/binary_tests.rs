use super::*;

fn sample_graph() -> TypeGraph {
    let mut graph = TypeGraph::default();
    graph.resolved_types.insert(
        TypeKey::new("k:Msg"),
        UserDefinedType::Struct(StructDef {
            decl: DeclData::new("Msg"),
            fields: vec![StructField {
                decl: DeclData::new("values"),
                ty: Type::Map {
                    key: Box::new(Type::String { nullable: false }),
                    value: Box::new(Type::Handle {
                        kind: HandleKind::MessagePipe,
                        nullable: true,
                    }),
                    nullable: false,
                },
                offset: 0,
                bit: 0,
                min_version: 0,
            }],
            version_info: vec![VersionInfo {
                version_number: 0,
                num_fields: 1,
                num_bytes: 16,
            }],
        }),
    );
    graph.resolved_types.insert(
        TypeKey::new("k:Shape"),
        UserDefinedType::Union(UnionDef {
            decl: DeclData::new("Shape"),
            fields: vec![UnionField {
                decl: DeclData::new("msg"),
                ty: Type::Reference(TypeReference {
                    type_key: Some(TypeKey::new("k:Msg")),
                    identifier: "Msg".into(),
                    nullable: false,
                    is_interface_request: false,
                }),
                tag: 0,
            }],
        }),
    );
    graph
}

#[test]
fn roundtrip() {
    let graph = sample_graph();
    let binary = graph.to_binary().unwrap();
    let decoded = TypeGraph::from_binary(&binary).unwrap();

    assert_eq!(graph, decoded);
}

#[test]
fn roundtrip_preserves_order() {
    let graph = sample_graph();
    let decoded = TypeGraph::from_binary(&graph.to_binary().unwrap()).unwrap();
    let keys: Vec<_> = decoded.resolved_types.keys().map(TypeKey::as_str).collect();

    assert_eq!(keys, ["k:Msg", "k:Shape"]);
}

#[test]
fn json_and_binary_agree() {
    let graph = sample_graph();
    let json = graph.to_json().unwrap();
    let from_json = TypeGraph::from_json(&json).unwrap();

    assert_eq!(from_json.to_binary().unwrap(), graph.to_binary().unwrap());
}

#[test]
fn truncated_input_fails() {
    let binary = sample_graph().to_binary().unwrap();
    let err = TypeGraph::from_binary(&binary[..binary.len() / 2]).unwrap_err();

    assert!(matches!(err, GraphError::Binary(_)));
}
