//! Test fixtures: one source file exercising every slot kind.

use indoc::indoc;
use wirebind_compiler::{Config, Generated, Generator};
use wirebind_core::TypeGraph;

pub const TEST_FILE: &str = "test.mojom";

pub const FIXTURE: &str = indoc! {r#"
    {
        "resolved_types": {
            "k:Point": {
                "struct": {
                    "decl": { "short_name": "Point", "full_identifier": "test.Point" },
                    "fields": [
                        { "decl": { "short_name": "x" }, "type": { "simple": "int32" }, "offset": 0 },
                        { "decl": { "short_name": "y" }, "type": { "simple": "int32" }, "offset": 4 }
                    ],
                    "version_info": [{ "version_number": 0, "num_fields": 2, "num_bytes": 16 }]
                }
            },
            "k:Person": {
                "struct": {
                    "decl": { "short_name": "Person", "full_identifier": "test.Person" },
                    "fields": [
                        { "decl": { "short_name": "id" }, "type": { "simple": "uint32" }, "offset": 0 },
                        { "decl": { "short_name": "flag" }, "type": { "simple": "bool" }, "offset": 4 },
                        { "decl": { "short_name": "name" }, "type": { "string": {} }, "offset": 8 },
                        { "decl": { "short_name": "nick" }, "type": { "string": { "nullable": true } }, "offset": 16 },
                        { "decl": { "short_name": "scores" }, "type": { "array": { "element": { "simple": "int16" } } }, "offset": 24 },
                        { "decl": { "short_name": "origin" }, "type": { "reference": { "type_key": "k:Point", "identifier": "Point", "nullable": true } }, "offset": 32 }
                    ],
                    "version_info": [{ "version_number": 0, "num_fields": 6, "num_bytes": 48 }]
                }
            },
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
            },
            "k:Holder": {
                "struct": {
                    "decl": { "short_name": "Holder", "full_identifier": "test.Holder" },
                    "fields": [
                        { "decl": { "short_name": "shape" }, "type": { "reference": { "type_key": "k:Outer", "identifier": "Outer" } }, "offset": 0 }
                    ],
                    "version_info": [{ "version_number": 0, "num_fields": 1, "num_bytes": 24 }]
                }
            },
            "k:Dict": {
                "struct": {
                    "decl": { "short_name": "Dict", "full_identifier": "test.Dict" },
                    "fields": [
                        { "decl": { "short_name": "m" }, "type": { "map": { "key": { "string": {} }, "value": { "simple": "int32" } } }, "offset": 0 }
                    ],
                    "version_info": [{ "version_number": 0, "num_fields": 1, "num_bytes": 16 }]
                }
            },
            "k:Pipes": {
                "struct": {
                    "decl": { "short_name": "Pipes", "full_identifier": "test.Pipes" },
                    "fields": [
                        { "decl": { "short_name": "a" }, "type": { "handle": { "kind": "message_pipe" } }, "offset": 0 },
                        { "decl": { "short_name": "b" }, "type": { "handle": { "nullable": true } }, "offset": 4 }
                    ],
                    "version_info": [{ "version_number": 0, "num_fields": 2, "num_bytes": 16 }]
                }
            },
            "k:Rgb": {
                "struct": {
                    "decl": { "short_name": "Rgb", "full_identifier": "test.Rgb" },
                    "fields": [
                        { "decl": { "short_name": "c" }, "type": { "array": { "element": { "simple": "uint8" }, "fixed_length": 3 } }, "offset": 0 }
                    ],
                    "version_info": [{ "version_number": 0, "num_fields": 1, "num_bytes": 16 }]
                }
            },
            "k:Grow": {
                "struct": {
                    "decl": { "short_name": "Grow", "full_identifier": "test.Grow" },
                    "fields": [
                        { "decl": { "short_name": "old" }, "type": { "simple": "int32" }, "offset": 0 },
                        { "decl": { "short_name": "new" }, "type": { "string": { "nullable": true } }, "offset": 8, "min_version": 1 }
                    ],
                    "version_info": [
                        { "version_number": 0, "num_fields": 1, "num_bytes": 16 },
                        { "version_number": 1, "num_fields": 2, "num_bytes": 24 }
                    ]
                }
            }
        },
        "files": [
            {
                "file_name": "test.mojom",
                "declared": {
                    "structs": ["k:Point", "k:Person", "k:Holder", "k:Dict", "k:Pipes", "k:Rgb", "k:Grow"],
                    "unions": ["k:Inner", "k:Outer"]
                }
            }
        ]
    }
"#};

/// Codec programs and pointer tables for [`FIXTURE`].
pub fn fixture() -> Generated {
    let graph = TypeGraph::from_json(FIXTURE).expect("fixture graph should parse");
    Generator::new(&graph, Config::new())
        .generate_file(TEST_FILE)
        .expect("fixture should generate")
}
