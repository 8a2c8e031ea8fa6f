//! Interpreter for codec programs.
//!
//! Encode programs read from a [`Value`] and drive an [`Encoder`]; decode
//! programs drive a [`Decoder`] and build a [`Value`]. Every struct or union
//! program runs in its own scope: `s`/`u` is the value being processed and
//! loop or map variables are locals of that scope.

use indexmap::IndexMap;
use wirebind_core::SimpleType;
use wirebind_format::codec::{STRUCT_VAR, UNION_VALUE_FIELD, UNION_VAR};
use wirebind_format::{
    CodecSet, DataHeader, DecodeOp, Decoder, EncodeOp, Encoder, Message, Place, Result, Scalar,
    StructCodec, UnionCodec, ValidationError, ValidationErrorKind, check_struct_version,
};

use super::trace::{Direction, NoopTracer, Tracer};
use super::value::Value;

/// Default nesting limit for structs and unions.
pub const DEFAULT_MAX_DEPTH: usize = 100;

static NULL: Value = Value::Null;

/// Runs the programs of one [`CodecSet`].
pub struct Interpreter<'c, T: Tracer = NoopTracer> {
    codecs: &'c CodecSet,
    tracer: T,
    max_depth: usize,
}

impl<'c> Interpreter<'c> {
    pub fn new(codecs: &'c CodecSet) -> Self {
        Self {
            codecs,
            tracer: NoopTracer,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl<'c, T: Tracer> Interpreter<'c, T> {
    /// Replace the tracer.
    pub fn with_tracer<U: Tracer>(self, tracer: U) -> Interpreter<'c, U> {
        Interpreter {
            codecs: self.codecs,
            tracer,
            max_depth: self.max_depth,
        }
    }

    /// Set the struct and union nesting limit.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    pub fn into_tracer(self) -> T {
        self.tracer
    }

    /// Encode `value` as the root struct `name`.
    pub fn encode(&mut self, name: &str, value: &Value) -> Result<Message> {
        let _span = tracing::debug_span!("encode", codec = name).entered();
        let mut encoder = Encoder::new();
        let result = self.encode_struct(&mut encoder, name, value, 0);
        if let Err(error) = &result {
            tracing::debug!(%error, "encode failed");
            self.tracer.trace_error(error);
        }
        result?;
        Ok(encoder.into_message())
    }

    /// Decode `message` as the root struct `name`.
    pub fn decode(&mut self, name: &str, message: &Message) -> Result<Value> {
        let _span = tracing::debug_span!("decode", codec = name, bytes = message.data.len())
            .entered();
        let mut decoder = Decoder::new(message);
        let result = self.decode_struct(&mut decoder, name, 0);
        if let Err(error) = &result {
            tracing::debug!(%error, "decode failed");
            self.tracer.trace_error(error);
        }
        result
    }

    fn struct_codec(&self, name: &str) -> Result<&'c StructCodec> {
        let codecs = self.codecs;
        codecs.struct_codec(name).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::UnknownCodec,
                format!("no struct codec named `{name}`"),
            )
        })
    }

    fn union_codec(&self, name: &str) -> Result<&'c UnionCodec> {
        let codecs = self.codecs;
        codecs.union_codec(name).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::UnknownCodec,
                format!("no union codec named `{name}`"),
            )
        })
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(ValidationError::new(
                ValidationErrorKind::MaxDepthExceeded,
                format!("nesting deeper than {}", self.max_depth),
            ));
        }
        Ok(())
    }

    fn encode_struct(
        &mut self,
        encoder: &mut Encoder,
        name: &str,
        value: &Value,
        depth: usize,
    ) -> Result<()> {
        let codec = self.struct_codec(name)?;
        match value {
            Value::Struct(_) => {}
            Value::Null => return Err(ValidationErrorKind::UnexpectedNullPointer.into()),
            other => return Err(mismatch("struct", other)),
        }
        self.check_depth(depth)?;

        self.tracer.trace_enter(Direction::Encode, name);
        let mut scope = EncodeScope::new(value);
        self.run_encode(encoder, &codec.encode, &mut scope, depth)?;
        self.tracer.trace_exit(Direction::Encode, name);
        Ok(())
    }

    fn encode_union(
        &mut self,
        encoder: &mut Encoder,
        name: &str,
        value: &Value,
        depth: usize,
    ) -> Result<()> {
        let codec = self.union_codec(name)?;
        let tag = match value {
            Value::Union { tag, .. } => *tag,
            Value::Null => return Err(ValidationErrorKind::UnexpectedNullUnion.into()),
            other => return Err(mismatch("union", other)),
        };
        let arm = codec.arm(tag).ok_or_else(|| unknown_tag(name, tag))?;
        self.check_depth(depth)?;

        self.tracer.trace_enter(Direction::Encode, name);
        encoder.start_union(tag)?;
        let mut scope = EncodeScope::new(value);
        self.run_encode(encoder, &arm.encode, &mut scope, depth)?;
        encoder.finish()?;
        self.tracer.trace_exit(Direction::Encode, name);
        Ok(())
    }

    fn run_encode(
        &mut self,
        encoder: &mut Encoder,
        ops: &[EncodeOp],
        scope: &mut EncodeScope<'_>,
        depth: usize,
    ) -> Result<()> {
        for op in ops {
            self.tracer.trace_encode_op(op);
            match op {
                EncodeOp::StartStruct { num_bytes, version } => {
                    encoder.start_struct(*num_bytes, *version)?
                }
                EncodeOp::WritePointer => encoder.write_pointer()?,
                EncodeOp::WriteNullPointer => encoder.write_null_pointer()?,
                EncodeOp::WriteInvalidHandle => encoder.write_invalid_handle()?,
                EncodeOp::WriteNullUnion => encoder.write_null_union()?,
                EncodeOp::Write { value, scalar } => {
                    write_scalar(encoder, *scalar, scope.get(value)?)?
                }
                EncodeOp::EncodeStruct { value, name } => {
                    let nested = scope.get(value)?;
                    self.encode_struct(encoder, name, nested, depth + 1)?;
                }
                EncodeOp::EncodeUnion { value, name } => {
                    let nested = scope.get(value)?;
                    self.encode_union(encoder, name, nested, depth + 1)?;
                }
                EncodeOp::StartNestedUnion => encoder.start_nested_union()?,
                EncodeOp::StartArray {
                    value,
                    element_bits,
                    fixed_length,
                } => {
                    let len = match scope.get(value)? {
                        Value::Array(items) => items.len(),
                        other => return Err(mismatch("array", other)),
                    };
                    check_fixed_length(*fixed_length, len)?;
                    encoder.start_array(len, *element_bits)?;
                }
                EncodeOp::StartMap => encoder.start_map()?,
                EncodeOp::Finish => encoder.finish()?,
                EncodeOp::ForEach { value, item, body } => {
                    let items = match scope.get(value)? {
                        Value::Array(items) => items.clone(),
                        other => return Err(mismatch("array", other)),
                    };
                    for element in items {
                        let mark = scope.locals.len();
                        scope.locals.push((item.clone(), element));
                        self.run_encode(encoder, body, scope, depth)?;
                        scope.locals.truncate(mark);
                    }
                }
                EncodeOp::IfAbsent {
                    value,
                    then,
                    otherwise,
                } => {
                    let branch = if scope.get(value)?.is_absent() {
                        then
                    } else {
                        otherwise
                    };
                    self.run_encode(encoder, branch, scope, depth)?;
                }
                EncodeOp::SplitMap {
                    value,
                    keys,
                    values,
                    sort_keys,
                } => {
                    let mut entries = match scope.get(value)? {
                        Value::Map(entries) => entries.clone(),
                        other => return Err(mismatch("map", other)),
                    };
                    if *sort_keys {
                        entries.sort_by(|a, b| a.0.key_cmp(&b.0));
                    }
                    let (k, v): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
                    scope.locals.push((keys.clone(), Value::Array(k)));
                    scope.locals.push((values.clone(), Value::Array(v)));
                }
                EncodeOp::Fail(kind) => return Err((*kind).into()),
            }
        }
        Ok(())
    }

    fn decode_struct(
        &mut self,
        decoder: &mut Decoder<'_>,
        name: &str,
        depth: usize,
    ) -> Result<Value> {
        let codec = self.struct_codec(name)?;
        self.check_depth(depth)?;

        self.tracer.trace_enter(Direction::Decode, name);
        let mut scope = DecodeScope::new(Value::Struct(IndexMap::new()));
        self.run_decode(decoder, &codec.decode, &mut scope, depth)?;
        self.tracer.trace_exit(Direction::Decode, name);
        Ok(scope.this)
    }

    fn decode_union(
        &mut self,
        decoder: &mut Decoder<'_>,
        name: &str,
        depth: usize,
    ) -> Result<Value> {
        let codec = self.union_codec(name)?;
        let Some(tag) = decoder.read_union_header()? else {
            return Ok(Value::Null);
        };
        let arm = codec.arm(tag).ok_or_else(|| unknown_tag(name, tag))?;
        self.check_depth(depth)?;

        self.tracer.trace_enter(Direction::Decode, name);
        let mut scope = DecodeScope::new(Value::union(tag, Value::Null));
        self.run_decode(decoder, &arm.decode, &mut scope, depth)?;
        decoder.finish()?;
        self.tracer.trace_exit(Direction::Decode, name);
        Ok(scope.this)
    }

    fn run_decode(
        &mut self,
        decoder: &mut Decoder<'_>,
        ops: &[DecodeOp],
        scope: &mut DecodeScope,
        depth: usize,
    ) -> Result<()> {
        for op in ops {
            self.tracer.trace_decode_op(op);
            match op {
                DecodeOp::ReadStructHeader { versions } => {
                    let header = decoder.start_struct()?;
                    check_struct_version(header, versions)?;
                    scope.header = Some(header);
                }
                DecodeOp::ReadPointer => scope.pointer = decoder.read_pointer()?,
                DecodeOp::IfNullPointer { then, otherwise } => {
                    let branch = if scope.pointer == 0 { then } else { otherwise };
                    self.run_decode(decoder, branch, scope, depth)?;
                }
                DecodeOp::Read { target, scalar } => {
                    let value = read_scalar(decoder, *scalar)?;
                    scope.set(target, value)?;
                }
                DecodeOp::IfInvalidHandle { target, then } => {
                    if matches!(scope.get(target)?, Value::Handle(h) if !h.is_valid()) {
                        self.run_decode(decoder, then, scope, depth)?;
                    }
                }
                DecodeOp::DecodeStruct { target, name } => {
                    let value = self.decode_struct(decoder, name, depth + 1)?;
                    scope.set(target, value)?;
                }
                DecodeOp::DecodeUnion { target, name } => {
                    let value = self.decode_union(decoder, name, depth + 1)?;
                    scope.set(target, value)?;
                }
                DecodeOp::IfAbsent { target, then } => {
                    if scope.get(target)?.is_absent() {
                        self.run_decode(decoder, then, scope, depth)?;
                    }
                }
                DecodeOp::StartNestedUnion => decoder.start_nested_union()?,
                DecodeOp::StartArray {
                    target,
                    len,
                    element_bits,
                    fixed_length,
                } => {
                    let count = decoder.start_array(*element_bits)?;
                    check_fixed_length(*fixed_length, count as usize)?;
                    scope.set_var(len, Value::UInt(count.into()));
                    scope.set(target, Value::Array(Vec::with_capacity(count as usize)))?;
                }
                DecodeOp::ForEachIndex {
                    target,
                    len,
                    item,
                    body,
                } => {
                    let count = match scope.get(&Place::var(len.as_str()))? {
                        Value::UInt(n) => *n,
                        other => return Err(mismatch("length", other)),
                    };
                    for _ in 0..count {
                        let mark = scope.locals.len();
                        self.run_decode(decoder, body, scope, depth)?;
                        let element = scope.take_var(item);
                        scope.locals.truncate(mark);
                        match scope.get_mut(target)? {
                            Value::Array(items) => items.push(element),
                            other => return Err(mismatch("array", other)),
                        }
                    }
                }
                DecodeOp::StartMap => decoder.start_map()?,
                DecodeOp::Finish => decoder.finish()?,
                DecodeOp::CheckMapSizes { keys, values } => {
                    let num_keys = array_len(scope.get(&Place::var(keys.as_str()))?)?;
                    let num_values = array_len(scope.get(&Place::var(values.as_str()))?)?;
                    if num_keys != num_values {
                        return Err(ValidationError::new(
                            ValidationErrorKind::DifferentSizedArraysInMap,
                            format!("{num_keys} keys, {num_values} values"),
                        ));
                    }
                }
                DecodeOp::ZipMap {
                    target,
                    keys,
                    values,
                } => {
                    let (Value::Array(k), Value::Array(v)) =
                        (scope.take_var(keys), scope.take_var(values))
                    else {
                        return Err(ValidationError::new(
                            ValidationErrorKind::TypeMismatch,
                            "map parts are not arrays",
                        ));
                    };
                    scope.set(target, Value::Map(k.into_iter().zip(v).collect()))?;
                }
                DecodeOp::SetAbsent { target } => scope.set(target, Value::Null)?,
                DecodeOp::VersionGate {
                    min_version,
                    target,
                    body,
                } => {
                    let version = scope.header.map_or(0, |h| h.elements_or_version);
                    if version >= *min_version {
                        self.run_decode(decoder, body, scope, depth)?;
                    } else {
                        scope.set(target, Value::Null)?;
                    }
                }
                DecodeOp::Fail(kind) => return Err((*kind).into()),
            }
        }
        Ok(())
    }
}

/// Locals and the value under encoding for one program run.
struct EncodeScope<'v> {
    this: &'v Value,
    locals: Vec<(String, Value)>,
}

impl<'v> EncodeScope<'v> {
    fn new(this: &'v Value) -> Self {
        Self {
            this,
            locals: Vec::new(),
        }
    }

    fn get(&self, place: &Place) -> Result<&Value> {
        match place {
            Place::Var(name) => self
                .locals
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| unbound(name)),
            Place::Field { base, field } => match (self.this, base.as_str()) {
                (Value::Struct(fields), STRUCT_VAR) => Ok(fields.get(field).unwrap_or(&NULL)),
                (Value::Union { value, .. }, UNION_VAR) if field == UNION_VALUE_FIELD => {
                    Ok(value.as_ref())
                }
                (other, _) => Err(mismatch(base, other)),
            },
        }
    }
}

/// Locals and the value under construction for one program run.
struct DecodeScope {
    this: Value,
    locals: Vec<(String, Value)>,
    /// Value of the last pointer read.
    pointer: u64,
    header: Option<DataHeader>,
}

impl DecodeScope {
    fn new(this: Value) -> Self {
        Self {
            this,
            locals: Vec::new(),
            pointer: 0,
            header: None,
        }
    }

    fn get(&self, place: &Place) -> Result<&Value> {
        match place {
            Place::Var(name) => self
                .locals
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| unbound(name)),
            Place::Field { base, field } => match (&self.this, base.as_str()) {
                (Value::Struct(fields), STRUCT_VAR) => Ok(fields.get(field).unwrap_or(&NULL)),
                (Value::Union { value, .. }, UNION_VAR) if field == UNION_VALUE_FIELD => {
                    Ok(value.as_ref())
                }
                (other, _) => Err(mismatch(base, other)),
            },
        }
    }

    /// Mutable slot for `place`, created as null when missing.
    fn get_mut(&mut self, place: &Place) -> Result<&mut Value> {
        match place {
            Place::Var(name) => {
                let index = match self.locals.iter().rposition(|(n, _)| n == name) {
                    Some(index) => index,
                    None => {
                        self.locals.push((name.clone(), Value::Null));
                        self.locals.len() - 1
                    }
                };
                Ok(&mut self.locals[index].1)
            }
            Place::Field { base, field } => {
                let found = self.this.kind_name();
                match (&mut self.this, base.as_str()) {
                    (Value::Struct(fields), STRUCT_VAR) => {
                        Ok(fields.entry(field.clone()).or_insert(Value::Null))
                    }
                    (Value::Union { value, .. }, UNION_VAR) if field == UNION_VALUE_FIELD => {
                        Ok(value.as_mut())
                    }
                    _ => Err(mismatch_kind(base, found)),
                }
            }
        }
    }

    fn set(&mut self, place: &Place, value: Value) -> Result<()> {
        *self.get_mut(place)? = value;
        Ok(())
    }

    fn set_var(&mut self, name: &str, value: Value) {
        match self.locals.iter_mut().rev().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.locals.push((name.to_string(), value)),
        }
    }

    /// Move a local out, leaving null behind.
    fn take_var(&mut self, name: &str) -> Value {
        self.locals
            .iter_mut()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| std::mem::replace(v, Value::Null))
            .unwrap_or(Value::Null)
    }
}

fn mismatch(expected: &str, found: &Value) -> ValidationError {
    mismatch_kind(expected, found.kind_name())
}

fn mismatch_kind(expected: &str, found: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::TypeMismatch,
        format!("expected {expected}, found {found}"),
    )
}

fn unbound(name: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::TypeMismatch,
        format!("unbound variable `{name}`"),
    )
}

fn unknown_tag(name: &str, tag: u32) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::UnknownUnionTag,
        format!("union `{name}` has no member with tag {tag}"),
    )
}

fn check_fixed_length(fixed_length: u32, len: usize) -> Result<()> {
    if fixed_length > 0 && len != fixed_length as usize {
        return Err(ValidationError::new(
            ValidationErrorKind::UnexpectedArrayHeader,
            format!("expected {fixed_length} elements, found {len}"),
        ));
    }
    Ok(())
}

fn array_len(value: &Value) -> Result<usize> {
    match value {
        Value::Array(items) => Ok(items.len()),
        other => Err(mismatch("array", other)),
    }
}

fn write_scalar(encoder: &mut Encoder, scalar: Scalar, value: &Value) -> Result<()> {
    match (scalar, value) {
        (Scalar::String, Value::String(s)) => encoder.write_string(s),
        (Scalar::String, Value::Null) => Err(ValidationErrorKind::UnexpectedNullPointer.into()),
        (Scalar::Handle, Value::Handle(h)) => encoder.write_handle(*h),
        (Scalar::Handle, Value::Null) => Err(ValidationErrorKind::UnexpectedInvalidHandle.into()),
        (Scalar::Enum, Value::Enum(n)) => encoder.write_i32(*n),
        (Scalar::Enum, Value::Int(_)) => encoder.write_i32(as_int(value)?),
        (Scalar::Simple(simple), _) => write_simple(encoder, simple, value),
        (Scalar::String, other) => Err(mismatch("string", other)),
        (Scalar::Handle, other) => Err(mismatch("handle", other)),
        (Scalar::Enum, other) => Err(mismatch("enum", other)),
    }
}

fn write_simple(encoder: &mut Encoder, simple: SimpleType, value: &Value) -> Result<()> {
    match simple {
        SimpleType::Bool => match value {
            Value::Bool(b) => encoder.write_bool(*b),
            other => Err(mismatch("bool", other)),
        },
        SimpleType::Int8 => encoder.write_i8(as_int(value)?),
        SimpleType::Int16 => encoder.write_i16(as_int(value)?),
        SimpleType::Int32 => encoder.write_i32(as_int(value)?),
        SimpleType::Int64 => encoder.write_i64(as_int(value)?),
        SimpleType::Uint8 => encoder.write_u8(as_int(value)?),
        SimpleType::Uint16 => encoder.write_u16(as_int(value)?),
        SimpleType::Uint32 => encoder.write_u32(as_int(value)?),
        SimpleType::Uint64 => encoder.write_u64(as_int(value)?),
        SimpleType::Float => encoder.write_f32(as_float(value)? as f32),
        SimpleType::Double => encoder.write_f64(as_float(value)?),
    }
}

/// Integer conversion that rejects out-of-range values.
fn as_int<N>(value: &Value) -> Result<N>
where
    N: TryFrom<i64> + TryFrom<u64>,
{
    let converted = match value {
        Value::Int(n) => N::try_from(*n).ok(),
        Value::UInt(n) => N::try_from(*n).ok(),
        _ => None,
    };
    converted.ok_or_else(|| mismatch("integer in range", value))
}

fn as_float(value: &Value) -> Result<f64> {
    match value {
        Value::Float(n) => Ok(*n),
        other => Err(mismatch("float", other)),
    }
}

fn read_scalar(decoder: &mut Decoder<'_>, scalar: Scalar) -> Result<Value> {
    let value = match scalar {
        Scalar::Simple(simple) => match simple {
            SimpleType::Bool => Value::Bool(decoder.read_bool()?),
            SimpleType::Int8 => Value::Int(decoder.read_i8()?.into()),
            SimpleType::Int16 => Value::Int(decoder.read_i16()?.into()),
            SimpleType::Int32 => Value::Int(decoder.read_i32()?.into()),
            SimpleType::Int64 => Value::Int(decoder.read_i64()?),
            SimpleType::Uint8 => Value::UInt(decoder.read_u8()?.into()),
            SimpleType::Uint16 => Value::UInt(decoder.read_u16()?.into()),
            SimpleType::Uint32 => Value::UInt(decoder.read_u32()?.into()),
            SimpleType::Uint64 => Value::UInt(decoder.read_u64()?),
            SimpleType::Float => Value::Float(decoder.read_f32()?.into()),
            SimpleType::Double => Value::Float(decoder.read_f64()?),
        },
        Scalar::String => Value::String(decoder.read_string()?),
        Scalar::Enum => Value::Enum(decoder.read_i32()?),
        Scalar::Handle => Value::Handle(decoder.read_handle()?),
    };
    Ok(value)
}
