use indoc::indoc;
use wirebind_core::Colors;
use wirebind_format::{ElementKind, TableRef, TypeTables, dump_tables};

use crate::test_utils::{generate, graph, struct_graph};

fn tables(json: &str) -> TypeTables {
    generate(&graph(json)).tables.expect("tables are on by default")
}

const MIXED_FIELDS: &str = indoc! {r#"
    { "decl": { "short_name": "id" }, "type": { "simple": "uint32" }, "offset": 0 },
    { "decl": { "short_name": "items" }, "type": { "array": { "element": { "simple": "uint8" } } }, "offset": 24 },
    {
        "decl": { "short_name": "tags" },
        "type": { "map": { "key": { "string": {} }, "value": { "simple": "int32" }, "nullable": true } },
        "offset": 16
    },
    { "decl": { "short_name": "name" }, "type": { "string": {} }, "offset": 8 },
    { "decl": { "short_name": "pipe" }, "type": { "handle": {} }, "offset": 4 }
"#};

#[test]
fn struct_table_listing() {
    let generated = generate(&struct_graph(MIXED_FIELDS, 40, ""));
    let tables = generated.tables.unwrap();

    insta::assert_snapshot!(dump_tables(&tables, Colors::OFF), @r"
    [arrays]
    test_Test_16_0_0_0_1__PointerEntry = {&StringPointerEntry, 0, ARRAY, false}
    test_Test_16_0_8_8_2__PointerEntry = {NULL, 0, POD, false}
    test_Test_24_3__PointerEntry = {NULL, 0, POD, false}

    [structs]
    test_Test_16_0__PointerTable = {
        {&test_Test_16_0_0_0_1__PointerEntry, 0, 0, ARRAY, false, true},
        {&test_Test_16_0_8_8_2__PointerEntry, 8, 0, ARRAY, false, false},
    }
    test_Test__PointerTable = {
        {NULL, 4, 0, HANDLE, false, true},
        {&StringPointerEntry, 8, 0, ARRAY, false, true},
        {&test_Test_16_0__PointerTable, 16, 0, STRUCT, true, true},
        {&test_Test_24_3__PointerEntry, 24, 0, ARRAY, false, false},
    }

    [public]
    test_Test__PointerTable
    ");
}

#[test]
fn only_last_entry_stops() {
    let generated = generate(&struct_graph(MIXED_FIELDS, 40, ""));
    let tables = generated.tables.unwrap();

    for table in &tables.structs {
        let (last, rest) = table.entries.split_last().unwrap();
        assert!(!last.keep_going, "{}", table.name);
        assert!(rest.iter().all(|e| e.keep_going), "{}", table.name);
    }
}

#[test]
fn map_table_has_key_and_value_arrays() {
    let generated = generate(&struct_graph(MIXED_FIELDS, 40, ""));
    let tables = generated.tables.unwrap();
    let map = tables.struct_table("test_Test_16_0__PointerTable").unwrap();

    let shape: Vec<_> = map
        .entries
        .iter()
        .map(|e| (e.offset, e.elem_kind, e.nullable, e.keep_going))
        .collect();
    assert_eq!(
        shape,
        [
            (0, ElementKind::Array, false, true),
            (8, ElementKind::Array, false, false),
        ]
    );
    assert!(!tables.public_struct_names.contains(&map.name));

    let names: Vec<_> = map.entries.iter().map(|e| e.elem_table.name()).collect();
    assert_eq!(
        names,
        [
            "test_Test_16_0_0_0_1__PointerEntry",
            "test_Test_16_0_8_8_2__PointerEntry"
        ]
    );

    let owner = tables.struct_table("test_Test__PointerTable").unwrap();
    assert_eq!(
        owner.entries[2].elem_table,
        TableRef::Map("test_Test_16_0__PointerTable".to_string())
    );
}

#[test]
fn scalar_only_struct_has_empty_table() {
    let generated = generate(&struct_graph(
        r#"{ "decl": { "short_name": "n" }, "type": { "simple": "int64" }, "offset": 0 }"#,
        16,
        "",
    ));

    insta::assert_snapshot!(dump_tables(&generated.tables.unwrap(), Colors::OFF), @r"
    [structs]
    test_Test__PointerTable = {}

    [public]
    test_Test__PointerTable
    ");
}

#[test]
fn nested_and_fixed_arrays() {
    let generated = generate(&struct_graph(
        indoc! {r#"
            {
                "decl": { "short_name": "grid" },
                "type": { "array": { "element": { "array": { "element": { "handle": { "nullable": true } }, "fixed_length": 3 } } } },
                "offset": 0
            }
        "#},
        16,
        "",
    ));
    let tables = generated.tables.unwrap();

    let outer = tables.array_entry("test_Test_0_0__PointerEntry").unwrap();
    assert_eq!(
        outer.elem_table,
        TableRef::Array("test_Test_0_0_1__PointerEntry".to_string())
    );
    assert_eq!(outer.num_elements, 0);
    assert_eq!(outer.elem_bits, 64);

    let inner = tables.array_entry("test_Test_0_0_1__PointerEntry").unwrap();
    assert_eq!(inner.elem_table, TableRef::None);
    assert_eq!(inner.elem_kind, ElementKind::Handle);
    assert_eq!(inner.num_elements, 3);
    assert_eq!(inner.elem_bits, 32);
    assert!(inner.nullable);
}

#[test]
fn union_tables() {
    let tables = tables(indoc! {r#"
        {
            "resolved_types": {
                "k:Inner": {
                    "union": {
                        "decl": { "short_name": "Inner" },
                        "fields": [
                            { "decl": { "short_name": "count" }, "type": { "simple": "uint32" }, "tag": 0 },
                            { "decl": { "short_name": "label" }, "type": { "string": {} }, "tag": 1 }
                        ]
                    }
                },
                "k:Outer": {
                    "union": {
                        "decl": { "short_name": "Outer" },
                        "fields": [
                            { "decl": { "short_name": "inner" }, "type": { "reference": { "type_key": "k:Inner", "identifier": "Inner" } }, "tag": 0 },
                            { "decl": { "short_name": "maybe" }, "type": { "reference": { "type_key": "k:Inner", "identifier": "Inner", "nullable": true } }, "tag": 1 }
                        ]
                    }
                }
            },
            "files": [{ "file_name": "test.mojom", "declared": { "unions": ["k:Inner", "k:Outer"] } }]
        }
    "#});

    insta::assert_snapshot!(dump_tables(&tables, Colors::OFF), @r"
    [unions]
    Inner__PointerTable = {
        {&StringPointerEntry, 1, false, ARRAY, false},
    }
    Outer__PointerTable = {
        {&Inner__PointerTable, 0, false, UNION, true},
        {&Inner__PointerTable, 1, true, UNION, false},
    }

    [public]
    Inner__PointerTable
    Outer__PointerTable
    ");
}

#[test]
fn interface_parameter_tables() {
    let tables = tables(indoc! {r#"
        {
            "resolved_types": {
                "k:Calc": {
                    "interface": {
                        "decl": { "short_name": "Calc", "full_identifier": "calc.Calc" },
                        "methods": [
                            {
                                "decl": { "short_name": "Add" },
                                "ordinal": 0,
                                "parameters": {
                                    "decl": { "short_name": "Calc_Add_Params" },
                                    "fields": [
                                        { "decl": { "short_name": "a" }, "type": { "simple": "int32" }, "offset": 0 },
                                        { "decl": { "short_name": "peer" }, "type": { "reference": { "type_key": "k:Calc", "identifier": "Calc" } }, "offset": 4 }
                                    ],
                                    "version_info": [{ "version_number": 0, "num_fields": 2, "num_bytes": 16 }]
                                },
                                "response_parameters": {
                                    "decl": { "short_name": "Calc_Add_ResponseParams" },
                                    "fields": [
                                        { "decl": { "short_name": "text" }, "type": { "string": {} }, "offset": 0 }
                                    ],
                                    "version_info": [{ "version_number": 0, "num_fields": 1, "num_bytes": 16 }]
                                }
                            }
                        ]
                    }
                }
            },
            "files": [{ "file_name": "test.mojom", "declared": { "interfaces": ["k:Calc"] } }]
        }
    "#});

    insta::assert_snapshot!(dump_tables(&tables, Colors::OFF), @r"
    [structs]
    calc_Calc_Add__Params__PointerTable = {
        {NULL, 4, 0, INTERFACE, false, false},
    }
    calc_Calc_Add__ResponseParams__PointerTable = {
        {&StringPointerEntry, 0, 0, ARRAY, false, false},
    }

    [public]
    calc_Calc_Add__Params__PointerTable
    calc_Calc_Add__ResponseParams__PointerTable
    ");
}
