//! Dynamic values consumed and produced by the interpreter.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use wirebind_core::Colors;
use wirebind_format::Handle;

/// Self-contained message value.
///
/// `Struct` keeps fields in serialization order. `Null` stands for every
/// absent value: null pointer, null union, invalid handle.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Handle(Handle),
    Enum(i32),
    Array(Vec<Value>),
    /// Entries in wire order.
    Map(Vec<(Value, Value)>),
    Struct(IndexMap<String, Value>),
    Union {
        tag: u32,
        value: Box<Value>,
    },
}

impl Value {
    /// Struct value from `(field, value)` pairs.
    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    pub fn union(tag: u32, value: Value) -> Self {
        Self::Union {
            tag,
            value: Box::new(value),
        }
    }

    /// Whether the value stands for a missing payload.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Handle(handle) => !handle.is_valid(),
            _ => false,
        }
    }

    /// Lowercase variant name, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Handle(_) => "handle",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
            Self::Union { .. } => "union",
        }
    }

    /// Total order used to sort map keys before encoding.
    ///
    /// Values of the same variant compare by content (floats with
    /// `total_cmp`); different variants compare by variant.
    pub fn key_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::UInt(a), Self::UInt(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Handle(a), Self::Handle(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.key_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::UInt(_) => 3,
            Self::Float(_) => 4,
            Self::String(_) => 5,
            Self::Handle(_) => 6,
            Self::Enum(_) => 7,
            Self::Array(_) => 8,
            Self::Map(_) => 9,
            Self::Struct(_) => 10,
            Self::Union { .. } => 11,
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Handle(h) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$handle", &h.0)?;
                map.end()
            }
            Value::Enum(n) => serializer.serialize_i32(*n),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for (key, value) in entries {
                    seq.serialize_element(&[key, value])?;
                }
                seq.end()
            }
            Value::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Union { tag, value } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("$tag", tag)?;
                map.serialize_entry("$value", value)?;
                map.end()
            }
        }
    }
}

impl Value {
    /// Format value as colored JSON.
    ///
    /// Color scheme (jq-inspired):
    /// - Keys: Blue
    /// - String values: Green
    /// - Numbers, booleans: Normal
    /// - null: Dim
    /// - Structure `{}[]:,`: Dim
    pub fn format(&self, pretty: bool, colors: Colors) -> String {
        let mut out = String::new();
        format_value(&mut out, self, &colors, pretty, 0);
        out
    }
}

fn format_value(out: &mut String, value: &Value, c: &Colors, pretty: bool, indent: usize) {
    match value {
        Value::Null => {
            out.push_str(c.dim);
            out.push_str("null");
            out.push_str(c.reset);
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::UInt(n) => out.push_str(&n.to_string()),
        Value::Float(n) => out.push_str(&n.to_string()),
        Value::Enum(n) => out.push_str(&n.to_string()),
        Value::String(s) => format_string(out, s, c),
        Value::Handle(h) => {
            let fields = [("$handle".to_string(), Value::UInt(h.0.into()))];
            format_object(out, &fields, c, pretty, indent);
        }
        Value::Array(arr) => {
            format_array(out, arr, c, pretty, indent);
        }
        Value::Map(entries) => {
            let pairs: Vec<_> = entries
                .iter()
                .map(|(k, v)| Value::Array(vec![k.clone(), v.clone()]))
                .collect();
            format_array(out, &pairs, c, pretty, indent);
        }
        Value::Struct(fields) => {
            let fields: Vec<_> = fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            format_object(out, &fields, c, pretty, indent);
        }
        Value::Union { tag, value } => {
            let fields = [
                ("$tag".to_string(), Value::UInt((*tag).into())),
                ("$value".to_string(), (**value).clone()),
            ];
            format_object(out, &fields, c, pretty, indent);
        }
    }
}

fn format_string(out: &mut String, s: &str, c: &Colors) {
    out.push_str(c.green);
    out.push('"');
    out.push_str(&escape_json_string(s));
    out.push('"');
    out.push_str(c.reset);
}

fn format_array(out: &mut String, arr: &[Value], c: &Colors, pretty: bool, indent: usize) {
    out.push_str(c.dim);
    out.push('[');
    out.push_str(c.reset);

    if arr.is_empty() {
        out.push_str(c.dim);
        out.push(']');
        out.push_str(c.reset);
        return;
    }

    let elem_indent = if pretty { indent + 2 } else { 0 };

    for (i, item) in arr.iter().enumerate() {
        if i > 0 {
            out.push_str(c.dim);
            out.push(',');
            out.push_str(c.reset);
        }

        if pretty {
            out.push('\n');
            out.push_str(&" ".repeat(elem_indent));
        }

        format_value(out, item, c, pretty, elem_indent);
    }

    if pretty {
        out.push('\n');
        out.push_str(&" ".repeat(indent));
    }

    out.push_str(c.dim);
    out.push(']');
    out.push_str(c.reset);
}

fn format_object(
    out: &mut String,
    fields: &[(String, Value)],
    c: &Colors,
    pretty: bool,
    indent: usize,
) {
    out.push_str(c.dim);
    out.push('{');
    out.push_str(c.reset);

    if fields.is_empty() {
        out.push_str(c.dim);
        out.push('}');
        out.push_str(c.reset);
        return;
    }

    let field_indent = if pretty { indent + 2 } else { 0 };

    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(c.dim);
            out.push(',');
            out.push_str(c.reset);
        }

        if pretty {
            out.push('\n');
            out.push_str(&" ".repeat(field_indent));
        }

        // Key in blue
        out.push_str(c.blue);
        out.push('"');
        out.push_str(&escape_json_string(key));
        out.push('"');
        out.push_str(c.reset);

        out.push_str(c.dim);
        out.push(':');
        out.push_str(c.reset);

        if pretty {
            out.push(' ');
        }

        format_value(out, value, c, pretty, field_indent);
    }

    if pretty {
        out.push('\n');
        out.push_str(&" ".repeat(indent));
    }

    out.push_str(c.dim);
    out.push('}');
    out.push_str(c.reset);
}

fn escape_json_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
