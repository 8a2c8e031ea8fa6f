//! Test utilities: graph fixtures and rendering shortcuts.

use wirebind_core::{Colors, TypeGraph};

use crate::{Config, Generated, Generator};

/// File name used by the single-file fixtures.
pub const TEST_FILE: &str = "test.mojom";

/// Route `tracing` output to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn graph(json: &str) -> TypeGraph {
    TypeGraph::from_json(json).expect("fixture graph should parse")
}

/// Graph with one file declaring a single struct `Test` (key `k:Test`)
/// with the given JSON field list, plus any extra `"key": {...}` types.
pub fn struct_graph(fields: &str, num_bytes: u32, extra_types: &str) -> TypeGraph {
    let extra = if extra_types.trim().is_empty() {
        String::new()
    } else {
        format!(",{extra_types}")
    };
    graph(&format!(
        r#"{{
            "resolved_types": {{
                "k:Test": {{
                    "struct": {{
                        "decl": {{ "short_name": "Test", "full_identifier": "test.Test" }},
                        "fields": [{fields}],
                        "version_info": [
                            {{ "version_number": 0, "num_fields": 0, "num_bytes": {num_bytes} }}
                        ]
                    }}
                }}{extra}
            }},
            "files": [
                {{ "file_name": "{TEST_FILE}", "declared": {{ "structs": ["k:Test"] }} }}
            ]
        }}"#
    ))
}

pub fn generate(graph: &TypeGraph) -> Generated {
    init_tracing();
    Generator::new(graph, Config::new())
        .generate_file(TEST_FILE)
        .expect("generation should succeed")
}

/// Rendered encode program of `name`, without the struct header and
/// terminator.
pub fn encode_fields(generated: &Generated, name: &str) -> String {
    let codec = generated
        .codecs
        .struct_codec(name)
        .expect("struct codec should exist");
    let ops = &codec.encode[1..codec.encode.len() - 1];
    wirebind_format::dump_encode(ops, Colors::OFF)
}

/// Rendered decode program of `name`, without the struct header and
/// terminator.
pub fn decode_fields(generated: &Generated, name: &str) -> String {
    let codec = generated
        .codecs
        .struct_codec(name)
        .expect("struct codec should exist");
    let ops = &codec.decode[1..codec.decode.len() - 1];
    wirebind_format::dump_decode(ops, Colors::OFF)
}
