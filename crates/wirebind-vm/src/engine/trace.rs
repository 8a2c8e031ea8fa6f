//! Tracing infrastructure for debugging codec execution.
//!
//! # Design: Zero-Cost Abstraction
//!
//! When `NoopTracer` is used every trait method is an `#[inline(always)]`
//! empty function, so the calls and their arguments compile away. No tracing
//! state lives in the interpreter itself.
//!
//! # Design: Tracer-Owned State
//!
//! Display-only state (the nesting depth used for indentation) is kept by the
//! tracer. `trace_enter` pushes, `trace_exit` pops.

use wirebind_core::Colors;
use wirebind_format::{DecodeOp, EncodeOp, ValidationError};

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Codec entry and exit, plus errors.
    #[default]
    Default,
    /// Every executed operation as well.
    Verbose,
}

/// Which program is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Encode,
    Decode,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Encode => "encode",
            Self::Decode => "decode",
        }
    }
}

/// Tracer trait for interpreter instrumentation.
///
/// Each method is called at a specific point during execution:
/// - `trace_enter` - before running a struct or union program
/// - `trace_exit` - after the program completed
/// - `trace_encode_op` / `trace_decode_op` - before executing an operation
/// - `trace_error` - once, when a run fails
pub trait Tracer {
    fn trace_enter(&mut self, direction: Direction, codec: &str);

    fn trace_exit(&mut self, direction: Direction, codec: &str);

    fn trace_encode_op(&mut self, op: &EncodeOp);

    fn trace_decode_op(&mut self, op: &DecodeOp);

    fn trace_error(&mut self, error: &ValidationError);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_enter(&mut self, _direction: Direction, _codec: &str) {}

    #[inline(always)]
    fn trace_exit(&mut self, _direction: Direction, _codec: &str) {}

    #[inline(always)]
    fn trace_encode_op(&mut self, _op: &EncodeOp) {}

    #[inline(always)]
    fn trace_decode_op(&mut self, _op: &DecodeOp) {}

    #[inline(always)]
    fn trace_error(&mut self, _error: &ValidationError) {}
}

/// Tracer that collects an indented execution log.
pub struct PrintTracer {
    verbosity: Verbosity,
    /// Collected trace lines.
    lines: Vec<String>,
    /// Names of the programs currently running.
    stack: Vec<String>,
    colors: Colors,
}

impl PrintTracer {
    pub fn new(verbosity: Verbosity, colors: Colors) -> Self {
        Self {
            verbosity,
            lines: Vec::new(),
            stack: Vec::new(),
            colors,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    fn add_line(&mut self, symbol: &str, content: &str) {
        let indent = "  ".repeat(self.stack.len());
        self.lines.push(format!("{indent}{symbol} {content}"));
    }

    fn add_op(&mut self, content: String) {
        if self.verbosity == Verbosity::Verbose {
            let c = self.colors;
            self.add_line(&format!("{}·{}", c.dim, c.reset), &content);
        }
    }
}

impl Tracer for PrintTracer {
    fn trace_enter(&mut self, direction: Direction, codec: &str) {
        let name = self.colors.paint(self.colors.blue, codec);
        self.add_line("▶", &format!("{} {name}", direction.as_str()));
        self.stack.push(codec.to_string());
    }

    fn trace_exit(&mut self, direction: Direction, codec: &str) {
        self.stack.pop();
        let name = self.colors.paint(self.colors.blue, codec);
        self.add_line("◀", &format!("{} {name}", direction.as_str()));
    }

    fn trace_encode_op(&mut self, op: &EncodeOp) {
        self.add_op(encode_label(op));
    }

    fn trace_decode_op(&mut self, op: &DecodeOp) {
        self.add_op(decode_label(op));
    }

    fn trace_error(&mut self, error: &ValidationError) {
        let at = self.stack.last().cloned().unwrap_or_default();
        self.stack.clear();
        self.add_line("✗", &format!("{error} (in {at})"));
    }
}

/// One-line summary of an operation. Nested bodies are not expanded.
fn encode_label(op: &EncodeOp) -> String {
    match op {
        EncodeOp::StartStruct { num_bytes, version } => {
            format!("StartStruct {num_bytes} v{version}")
        }
        EncodeOp::WritePointer => "WritePointer".to_string(),
        EncodeOp::WriteNullPointer => "WriteNullPointer".to_string(),
        EncodeOp::WriteInvalidHandle => "WriteInvalidHandle".to_string(),
        EncodeOp::WriteNullUnion => "WriteNullUnion".to_string(),
        EncodeOp::Write { value, scalar } => format!("{} {value}", scalar.write_fn()),
        EncodeOp::EncodeStruct { value, name } | EncodeOp::EncodeUnion { value, name } => {
            format!("Encode {value} as {name}")
        }
        EncodeOp::StartNestedUnion => "StartNestedUnion".to_string(),
        EncodeOp::StartArray {
            value,
            element_bits,
            ..
        } => format!("StartArray {value} x{element_bits}"),
        EncodeOp::StartMap => "StartMap".to_string(),
        EncodeOp::Finish => "Finish".to_string(),
        EncodeOp::ForEach { value, item, .. } => format!("ForEach {item} in {value}"),
        EncodeOp::IfAbsent { value, .. } => format!("IfAbsent {value}"),
        EncodeOp::SplitMap { value, .. } => format!("SplitMap {value}"),
        EncodeOp::Fail(kind) => format!("Fail {kind}"),
    }
}

fn decode_label(op: &DecodeOp) -> String {
    match op {
        DecodeOp::ReadStructHeader { versions } => {
            format!("ReadStructHeader ({} known)", versions.len())
        }
        DecodeOp::ReadPointer => "ReadPointer".to_string(),
        DecodeOp::IfNullPointer { .. } => "IfNullPointer".to_string(),
        DecodeOp::Read { target, scalar } => format!("{} {target}", scalar.read_fn()),
        DecodeOp::IfInvalidHandle { target, .. } => format!("IfInvalidHandle {target}"),
        DecodeOp::DecodeStruct { target, name } | DecodeOp::DecodeUnion { target, name } => {
            format!("Decode {target} as {name}")
        }
        DecodeOp::IfAbsent { target, .. } => format!("IfAbsent {target}"),
        DecodeOp::StartNestedUnion => "StartNestedUnion".to_string(),
        DecodeOp::StartArray {
            len, element_bits, ..
        } => format!("StartArray {len} x{element_bits}"),
        DecodeOp::ForEachIndex { target, item, .. } => format!("ForEachIndex {item} into {target}"),
        DecodeOp::StartMap => "StartMap".to_string(),
        DecodeOp::Finish => "Finish".to_string(),
        DecodeOp::CheckMapSizes { keys, values } => format!("CheckMapSizes {keys} {values}"),
        DecodeOp::ZipMap { target, .. } => format!("ZipMap {target}"),
        DecodeOp::SetAbsent { target } => format!("SetAbsent {target}"),
        DecodeOp::VersionGate {
            min_version,
            target,
            ..
        } => format!("VersionGate v{min_version} {target}"),
        DecodeOp::Fail(kind) => format!("Fail {kind}"),
    }
}
