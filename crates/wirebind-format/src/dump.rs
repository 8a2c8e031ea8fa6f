//! Human-readable listings of codec programs and pointer tables.
//!
//! Programs are printed as Go-like pseudo-source with four-space indentation,
//! one statement per operation. Places are blue and numeric literals green
//! when colors are enabled.

use std::fmt::Write as _;

use wirebind_core::Colors;

use crate::codec::{CodecSet, DecodeOp, EncodeOp, EnumCodec, Place, StructCodec, UnionCodec};
use crate::error::ValidationErrorKind;
use crate::tables::{ArrayEntry, StructEntry, TableRef, TypeTables, UnionEntry};

const INDENT: &str = "    ";

/// Render every enum, struct and union program of a set.
pub fn dump_codecs(set: &CodecSet, colors: Colors) -> String {
    let mut out = String::new();
    for codec in &set.enums {
        dump_enum(&mut out, codec, colors);
    }
    for codec in &set.structs {
        dump_struct(&mut out, codec, colors);
    }
    for codec in &set.unions {
        dump_union(&mut out, codec, colors);
    }
    out
}

/// Render an encode program at indentation level zero.
pub fn dump_encode(ops: &[EncodeOp], colors: Colors) -> String {
    let mut printer = Printer::new(colors);
    printer.encode_ops(ops);
    printer.out
}

/// Render a decode program at indentation level zero.
pub fn dump_decode(ops: &[DecodeOp], colors: Colors) -> String {
    let mut printer = Printer::new(colors);
    printer.decode_ops(ops);
    printer.out
}

fn dump_enum(out: &mut String, codec: &EnumCodec, colors: Colors) {
    let c = colors;
    writeln!(out, "const ( // {}{}{}", c.blue, codec.name, c.reset).unwrap();
    for (name, value) in &codec.values {
        writeln!(out, "{INDENT}{name} = {}{value}{}", c.green, c.reset).unwrap();
    }
    out.push_str(")\n\n");
}

fn dump_struct(out: &mut String, codec: &StructCodec, colors: Colors) {
    let name = colors.paint(colors.blue, &codec.name);

    writeln!(out, "func (s *{name}) Encode(encoder *Encoder) error {{").unwrap();
    let mut printer = Printer::nested(colors);
    printer.encode_ops(&codec.encode);
    printer.line("return nil");
    out.push_str(&printer.out);
    out.push_str("}\n\n");

    writeln!(out, "func (s *{name}) Decode(decoder *Decoder) error {{").unwrap();
    let mut printer = Printer::nested(colors);
    printer.decode_ops(&codec.decode);
    printer.line("return nil");
    out.push_str(&printer.out);
    out.push_str("}\n\n");
}

fn dump_union(out: &mut String, codec: &UnionCodec, colors: Colors) {
    let name = colors.paint(colors.blue, &codec.name);

    writeln!(out, "func (u *{name}) Encode(encoder *Encoder) error {{").unwrap();
    let mut printer = Printer::nested(colors);
    printer.line("encoder.StartUnion(u.Tag)");
    printer.line("switch u.Tag {");
    for arm in &codec.arms {
        let tag = printer.number(arm.tag);
        printer.line(&format!("case {tag}: // {}", arm.name));
        printer.indented(|p| p.encode_ops(&arm.encode));
    }
    printer.line("default:");
    printer.indented(|p| p.fail(ValidationErrorKind::UnknownUnionTag));
    printer.line("}");
    printer.line("encoder.Finish()");
    printer.line("return nil");
    out.push_str(&printer.out);
    out.push_str("}\n\n");

    writeln!(out, "func (u *{name}) Decode(decoder *Decoder) error {{").unwrap();
    let mut printer = Printer::nested(colors);
    printer.line("tag, ok := decoder.ReadUnionHeader()");
    printer.line("if !ok {");
    printer.indented(|p| p.line("return nil"));
    printer.line("}");
    printer.line("switch tag {");
    for arm in &codec.arms {
        let tag = printer.number(arm.tag);
        printer.line(&format!("case {tag}: // {}", arm.name));
        printer.indented(|p| p.decode_ops(&arm.decode));
    }
    printer.line("default:");
    printer.indented(|p| p.fail(ValidationErrorKind::UnknownUnionTag));
    printer.line("}");
    printer.line("decoder.Finish()");
    printer.line("return nil");
    out.push_str(&printer.out);
    out.push_str("}\n\n");
}

struct Printer {
    out: String,
    colors: Colors,
    depth: usize,
}

impl Printer {
    fn new(colors: Colors) -> Self {
        Self {
            out: String::new(),
            colors,
            depth: 0,
        }
    }

    fn nested(colors: Colors) -> Self {
        Self {
            depth: 1,
            ..Self::new(colors)
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn place(&self, place: &Place) -> String {
        self.colors.paint(self.colors.blue, &place.to_string())
    }

    fn var(&self, name: &str) -> String {
        self.colors.paint(self.colors.blue, name)
    }

    fn number(&self, n: impl std::fmt::Display) -> String {
        self.colors.paint(self.colors.green, &n.to_string())
    }

    fn fail(&mut self, kind: ValidationErrorKind) {
        self.line(&format!("return {kind}"));
    }

    fn block(&mut self, head: &str, body: impl FnOnce(&mut Self)) {
        self.line(&format!("{head} {{"));
        self.indented(body);
        self.line("}");
    }

    fn encode_ops(&mut self, ops: &[EncodeOp]) {
        for op in ops {
            self.encode_op(op);
        }
    }

    fn encode_op(&mut self, op: &EncodeOp) {
        match op {
            EncodeOp::StartStruct { num_bytes, version } => {
                let (n, v) = (self.number(num_bytes), self.number(version));
                self.line(&format!("encoder.StartStruct({n}, {v})"));
            }
            EncodeOp::WritePointer => self.line("encoder.WritePointer()"),
            EncodeOp::WriteNullPointer => self.line("encoder.WriteNullPointer()"),
            EncodeOp::WriteInvalidHandle => self.line("encoder.WriteInvalidHandle()"),
            EncodeOp::WriteNullUnion => self.line("encoder.WriteNullUnion()"),
            EncodeOp::Write { value, scalar } => {
                let value = self.place(value);
                self.line(&format!("encoder.{}({value})", scalar.write_fn()));
            }
            EncodeOp::EncodeStruct { value, .. } | EncodeOp::EncodeUnion { value, .. } => {
                let value = self.place(value);
                self.line(&format!("{value}.Encode(encoder)"));
            }
            EncodeOp::StartNestedUnion => self.line("encoder.StartNestedUnion()"),
            EncodeOp::StartArray {
                value,
                element_bits,
                fixed_length,
            } => {
                let v = self.place(value);
                if *fixed_length > 0 {
                    let fixed = self.number(fixed_length);
                    self.block(&format!("if len({v}) != {fixed}"), |p| {
                        p.fail(ValidationErrorKind::UnexpectedArrayHeader)
                    });
                }
                let bits = self.number(element_bits);
                self.line(&format!("encoder.StartArray(len({v}), {bits})"));
            }
            EncodeOp::StartMap => self.line("encoder.StartMap()"),
            EncodeOp::Finish => self.line("encoder.Finish()"),
            EncodeOp::ForEach { value, item, body } => {
                let head = format!("for _, {} := range {}", self.var(item), self.place(value));
                self.block(&head, |p| p.encode_ops(body));
            }
            EncodeOp::IfAbsent {
                value,
                then,
                otherwise,
            } => {
                let value = self.place(value);
                self.line(&format!("if {value} == nil {{"));
                self.indented(|p| p.encode_ops(then));
                if !otherwise.is_empty() {
                    self.line("} else {");
                    self.indented(|p| p.encode_ops(otherwise));
                }
                self.line("}");
            }
            EncodeOp::SplitMap {
                value,
                keys,
                values,
                sort_keys,
            } => {
                let (k, v) = (self.var(keys), self.var(values));
                let value = self.place(value);
                self.line(&format!("{k}, {v} := entries({value})"));
                if *sort_keys {
                    self.line(&format!("sortByKey({k}, {v})"));
                }
            }
            EncodeOp::Fail(kind) => self.fail(*kind),
        }
    }

    fn decode_ops(&mut self, ops: &[DecodeOp]) {
        for op in ops {
            self.decode_op(op);
        }
    }

    fn decode_op(&mut self, op: &DecodeOp) {
        match op {
            DecodeOp::ReadStructHeader { versions } => {
                self.line("header := decoder.StartStruct()");
                let known: Vec<_> = versions
                    .iter()
                    .map(|v| format!("{{{}, {}}}", self.number(v.version), self.number(v.num_bytes)))
                    .collect();
                self.line(&format!(
                    "decoder.CheckVersion(header, []Version{{{}}})",
                    known.join(", ")
                ));
            }
            DecodeOp::ReadPointer => self.line("pointer := decoder.ReadPointer()"),
            DecodeOp::IfNullPointer { then, otherwise } => {
                self.line("if pointer == 0 {");
                self.indented(|p| p.decode_ops(then));
                if !otherwise.is_empty() {
                    self.line("} else {");
                    self.indented(|p| p.decode_ops(otherwise));
                }
                self.line("}");
            }
            DecodeOp::Read { target, scalar } => {
                let target = self.place(target);
                self.line(&format!("{target} = decoder.{}()", scalar.read_fn()));
            }
            DecodeOp::IfInvalidHandle { target, then } => {
                let head = format!("if !{}.IsValid()", self.place(target));
                self.block(&head, |p| p.decode_ops(then));
            }
            DecodeOp::DecodeStruct { target, .. } | DecodeOp::DecodeUnion { target, .. } => {
                let target = self.place(target);
                self.line(&format!("{target}.Decode(decoder)"));
            }
            DecodeOp::IfAbsent { target, then } => {
                let head = format!("if {} == nil", self.place(target));
                self.block(&head, |p| p.decode_ops(then));
            }
            DecodeOp::StartNestedUnion => self.line("decoder.StartNestedUnion()"),
            DecodeOp::StartArray {
                len,
                element_bits,
                fixed_length,
                ..
            } => {
                let len = self.var(len);
                let bits = self.number(element_bits);
                self.line(&format!("{len} := decoder.StartArray({bits})"));
                if *fixed_length > 0 {
                    let fixed = self.number(fixed_length);
                    self.block(&format!("if {len} != {fixed}"), |p| {
                        p.fail(ValidationErrorKind::UnexpectedArrayHeader)
                    });
                }
            }
            DecodeOp::ForEachIndex {
                target,
                len,
                item,
                body,
            } => {
                let head = format!("for range {}", self.var(len));
                let append = format!(
                    "{target} = append({target}, {item})",
                    target = self.place(target),
                    item = self.var(item),
                );
                self.block(&head, |p| {
                    p.decode_ops(body);
                    p.line(&append);
                });
            }
            DecodeOp::StartMap => self.line("decoder.StartMap()"),
            DecodeOp::Finish => self.line("decoder.Finish()"),
            DecodeOp::CheckMapSizes { keys, values } => {
                let head = format!("if len({}) != len({})", self.var(keys), self.var(values));
                self.block(&head, |p| {
                    p.fail(ValidationErrorKind::DifferentSizedArraysInMap)
                });
            }
            DecodeOp::ZipMap {
                target,
                keys,
                values,
            } => {
                let line = format!(
                    "{} = zip({}, {})",
                    self.place(target),
                    self.var(keys),
                    self.var(values)
                );
                self.line(&line);
            }
            DecodeOp::SetAbsent { target } => {
                let target = self.place(target);
                self.line(&format!("{target} = nil"));
            }
            DecodeOp::VersionGate {
                min_version,
                target,
                body,
            } => {
                let min = self.number(min_version);
                let target = self.place(target);
                self.line(&format!("if header.Version >= {min} {{"));
                self.indented(|p| p.decode_ops(body));
                self.line("} else {");
                self.indented(|p| p.line(&format!("{target} = nil")));
                self.line("}");
            }
            DecodeOp::Fail(kind) => self.fail(*kind),
        }
    }
}

/// Render pointer tables as C-style initializers.
///
/// Entry fields appear in wire order: struct entries as
/// `{table, offset, min_version, kind, nullable, keep_going}`, union entries
/// as `{table, tag, nullable, kind, keep_going}` and array entries as
/// `{table, num_elements, kind, nullable}`.
pub fn dump_tables(tables: &TypeTables, colors: Colors) -> String {
    let mut out = String::new();
    let c = &colors;

    if !tables.arrays.is_empty() {
        writeln!(out, "{}[arrays]{}", c.blue, c.reset).unwrap();
        for entry in &tables.arrays {
            dump_array_entry(&mut out, entry, colors);
        }
        out.push('\n');
    }

    if !tables.structs.is_empty() {
        writeln!(out, "{}[structs]{}", c.blue, c.reset).unwrap();
        for table in &tables.structs {
            let entries: Vec<_> = table
                .entries
                .iter()
                .map(|e| format_struct_entry(e, colors))
                .collect();
            dump_table(&mut out, &table.name, &entries, colors);
        }
        out.push('\n');
    }

    if !tables.unions.is_empty() {
        writeln!(out, "{}[unions]{}", c.blue, c.reset).unwrap();
        for table in &tables.unions {
            let entries: Vec<_> = table
                .entries
                .iter()
                .map(|e| format_union_entry(e, colors))
                .collect();
            dump_table(&mut out, &table.name, &entries, colors);
        }
        out.push('\n');
    }

    let public: Vec<_> = tables
        .public_struct_names
        .iter()
        .chain(&tables.public_union_names)
        .collect();
    if !public.is_empty() {
        writeln!(out, "{}[public]{}", c.blue, c.reset).unwrap();
        for name in public {
            writeln!(out, "{name}").unwrap();
        }
    }

    out
}

fn table_ref(table: &TableRef, colors: Colors) -> String {
    match table {
        TableRef::None => table.name().to_string(),
        _ => format!("&{}", colors.paint(colors.blue, table.name())),
    }
}

fn dump_array_entry(out: &mut String, entry: &ArrayEntry, colors: Colors) {
    let c = &colors;
    writeln!(
        out,
        "{}{}{} = {{{}, {}{}{}, {}, {}}}",
        c.blue,
        entry.name,
        c.reset,
        table_ref(&entry.elem_table, colors),
        c.green,
        entry.num_elements,
        c.reset,
        entry.elem_kind.as_str(),
        entry.nullable,
    )
    .unwrap();
}

fn format_struct_entry(entry: &StructEntry, colors: Colors) -> String {
    let c = &colors;
    format!(
        "{{{}, {}{}{}, {}{}{}, {}, {}, {}}}",
        table_ref(&entry.elem_table, colors),
        c.green,
        entry.offset,
        c.reset,
        c.green,
        entry.min_version,
        c.reset,
        entry.elem_kind.as_str(),
        entry.nullable,
        entry.keep_going,
    )
}

fn format_union_entry(entry: &UnionEntry, colors: Colors) -> String {
    let c = &colors;
    format!(
        "{{{}, {}{}{}, {}, {}, {}}}",
        table_ref(&entry.elem_table, colors),
        c.green,
        entry.tag,
        c.reset,
        entry.nullable,
        entry.elem_kind.as_str(),
        entry.keep_going,
    )
}

fn dump_table(out: &mut String, name: &str, entries: &[String], colors: Colors) {
    let name = colors.paint(colors.blue, name);
    if entries.is_empty() {
        writeln!(out, "{name} = {{}}").unwrap();
        return;
    }
    writeln!(out, "{name} = {{").unwrap();
    for entry in entries {
        writeln!(out, "{INDENT}{entry},").unwrap();
    }
    out.push_str("}\n");
}
