use wirebind_core::{DeclData, SimpleType, StructDef, StructField, Type, TypeGraph, VersionInfo};

use super::{Classifier, layout_struct};
use crate::GenError;

fn field(name: &str, ty: Type, offset: u32, bit: u8, min_version: u32) -> StructField {
    StructField {
        decl: DeclData::new(name),
        ty,
        offset,
        bit,
        min_version,
    }
}

fn version(version_number: u32, num_bytes: u32) -> VersionInfo {
    VersionInfo {
        version_number,
        num_fields: 0,
        num_bytes,
    }
}

fn def(fields: Vec<StructField>, version_info: Vec<VersionInfo>) -> StructDef {
    StructDef {
        decl: DeclData::new("Sample"),
        fields,
        version_info,
    }
}

#[test]
fn order_ignores_declaration_order() {
    let graph = TypeGraph::default();
    let classifier = Classifier::new(&graph);
    let forward = def(
        vec![
            field("a", Type::Simple(SimpleType::Bool), 0, 0, 0),
            field("b", Type::Simple(SimpleType::Bool), 0, 1, 0),
            field("c", Type::Simple(SimpleType::Int32), 4, 0, 0),
            field("d", Type::String { nullable: false }, 8, 0, 0),
        ],
        vec![version(0, 24)],
    );
    let mut reversed = forward.clone();
    reversed.fields.reverse();

    let one = layout_struct(&classifier, "Sample", &forward).unwrap();
    let two = layout_struct(&classifier, "Sample", &reversed).unwrap();

    assert_eq!(one, two);
    let names: Vec<_> = one.fields.iter().map(|f| f.identifier.as_str()).collect();
    assert_eq!(names, ["s.A", "s.B", "s.C", "s.D"]);
}

#[test]
fn versions_are_sorted() {
    let graph = TypeGraph::default();
    let sample = def(
        vec![field("extra", Type::Simple(SimpleType::Int64), 8, 0, 2)],
        vec![version(2, 24), version(0, 8), version(1, 16)],
    );
    let layout = layout_struct(&Classifier::new(&graph), "Sample", &sample).unwrap();

    let numbers: Vec<_> = layout.versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, [0, 1, 2]);
    assert_eq!(layout.current, version(2, 24));
    assert_eq!(layout.fields[0].min_version, 2);
}

#[test]
fn missing_version_info() {
    let graph = TypeGraph::default();
    let err = layout_struct(&Classifier::new(&graph), "Sample", &def(vec![], vec![])).unwrap_err();

    assert_eq!(
        err,
        GenError::MissingVersionInfo {
            name: "Sample".to_string()
        }
    );
}

#[test]
fn duplicate_position() {
    let graph = TypeGraph::default();
    let sample = def(
        vec![
            field("x", Type::Simple(SimpleType::Bool), 0, 3, 0),
            field("y", Type::Simple(SimpleType::Bool), 0, 3, 0),
        ],
        vec![version(0, 16)],
    );
    let err = layout_struct(&Classifier::new(&graph), "Sample", &sample).unwrap_err();

    insta::assert_snapshot!(err, @"struct `Sample` has two fields at offset 0, bit 3");
}

#[test]
fn shrinking_version() {
    let graph = TypeGraph::default();
    let sample = def(vec![], vec![version(0, 24), version(1, 16)]);
    let err = layout_struct(&Classifier::new(&graph), "Sample", &sample).unwrap_err();

    assert_eq!(
        err,
        GenError::VersionSizeDecreased {
            name: "Sample".to_string(),
            version: 1
        }
    );
}

#[test]
fn field_newer_than_struct() {
    let graph = TypeGraph::default();
    let sample = def(
        vec![field("late", Type::Simple(SimpleType::Uint8), 0, 0, 3)],
        vec![version(0, 16), version(1, 16)],
    );
    let err = layout_struct(&Classifier::new(&graph), "Sample", &sample).unwrap_err();

    assert_eq!(
        err,
        GenError::FieldVersionTooNew {
            name: "Sample".to_string(),
            field: "Late".to_string()
        }
    );
}
