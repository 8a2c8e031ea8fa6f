//! Codec programs: a typed listing of encode and decode operations.
//!
//! The compiler emits one program per struct and one arm per union member.
//! Programs are consumed by two backends: the text renderer in [`crate::dump`]
//! and the interpreter in `wirebind-vm`.

use wirebind_core::SimpleType;

use crate::error::ValidationErrorKind;
use crate::wire::StructVersion;

/// Field name used for the payload of a union value (`u.Value`).
pub const UNION_VALUE_FIELD: &str = "Value";

/// Name bound to the struct being encoded or decoded.
pub const STRUCT_VAR: &str = "s";

/// Name bound to the union being encoded or decoded.
pub const UNION_VAR: &str = "u";

/// A storage location read or written by an operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Place {
    /// A local binding (`elem0`, `keys1`).
    Var(String),
    /// A named field of a local binding (`s.Name`).
    Field { base: String, field: String },
}

impl Place {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn field(base: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Field {
            base: base.into(),
            field: field.into(),
        }
    }

    /// The `u.Value` place of a union arm.
    pub fn union_value() -> Self {
        Self::field(UNION_VAR, UNION_VALUE_FIELD)
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Var(name) => f.write_str(name),
            Self::Field { base, field } => write!(f, "{base}.{field}"),
        }
    }
}

/// Kind of a single inline write or read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Simple(SimpleType),
    /// Length-prefixed UTF-8 bytes behind an already written pointer.
    String,
    /// 32-bit ordinal.
    Enum,
    Handle,
}

impl Scalar {
    /// Encoder method name, as rendered in listings.
    pub fn write_fn(&self) -> &'static str {
        match self {
            Self::Simple(simple) => match simple {
                SimpleType::Bool => "WriteBool",
                SimpleType::Int8 => "WriteInt8",
                SimpleType::Int16 => "WriteInt16",
                SimpleType::Int32 => "WriteInt32",
                SimpleType::Int64 => "WriteInt64",
                SimpleType::Uint8 => "WriteUint8",
                SimpleType::Uint16 => "WriteUint16",
                SimpleType::Uint32 => "WriteUint32",
                SimpleType::Uint64 => "WriteUint64",
                SimpleType::Float => "WriteFloat32",
                SimpleType::Double => "WriteFloat64",
            },
            Self::String => "WriteString",
            Self::Enum => "WriteInt32",
            Self::Handle => "WriteHandle",
        }
    }

    /// Decoder method name, as rendered in listings.
    pub fn read_fn(&self) -> &'static str {
        match self {
            Self::Simple(simple) => match simple {
                SimpleType::Bool => "ReadBool",
                SimpleType::Int8 => "ReadInt8",
                SimpleType::Int16 => "ReadInt16",
                SimpleType::Int32 => "ReadInt32",
                SimpleType::Int64 => "ReadInt64",
                SimpleType::Uint8 => "ReadUint8",
                SimpleType::Uint16 => "ReadUint16",
                SimpleType::Uint32 => "ReadUint32",
                SimpleType::Uint64 => "ReadUint64",
                SimpleType::Float => "ReadFloat32",
                SimpleType::Double => "ReadFloat64",
            },
            Self::String => "ReadString",
            Self::Enum => "ReadInt32",
            Self::Handle => "ReadHandle",
        }
    }
}

/// One encode operation.
#[derive(Clone, Debug, PartialEq)]
pub enum EncodeOp {
    /// Open the struct block with the current size and version.
    StartStruct { num_bytes: u32, version: u32 },
    /// Offset placeholder for the block started next.
    WritePointer,
    WriteNullPointer,
    WriteInvalidHandle,
    WriteNullUnion,
    Write { value: Place, scalar: Scalar },
    /// Run the named struct's encode program on `value`.
    EncodeStruct { value: Place, name: String },
    /// Write `value`'s tag into the next union slot, then run the matching arm.
    EncodeUnion { value: Place, name: String },
    StartNestedUnion,
    /// Array header for `value`'s elements. `fixed_length` 0 is unbounded.
    StartArray {
        value: Place,
        element_bits: u32,
        fixed_length: u32,
    },
    StartMap,
    /// Close the innermost block.
    Finish,
    ForEach {
        value: Place,
        item: String,
        body: Vec<EncodeOp>,
    },
    IfAbsent {
        value: Place,
        then: Vec<EncodeOp>,
        otherwise: Vec<EncodeOp>,
    },
    /// Split a map into parallel key and value sequences, optionally sorted
    /// by key.
    SplitMap {
        value: Place,
        keys: String,
        values: String,
        sort_keys: bool,
    },
    Fail(ValidationErrorKind),
}

/// One decode operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeOp {
    /// Open the struct block and check its header against known versions.
    ReadStructHeader { versions: Vec<StructVersion> },
    ReadPointer,
    /// Branch on the pointer read last.
    IfNullPointer {
        then: Vec<DecodeOp>,
        otherwise: Vec<DecodeOp>,
    },
    Read { target: Place, scalar: Scalar },
    IfInvalidHandle { target: Place, then: Vec<DecodeOp> },
    DecodeStruct { target: Place, name: String },
    /// Read the next union slot into `target` (absent for a null union).
    DecodeUnion { target: Place, name: String },
    IfAbsent { target: Place, then: Vec<DecodeOp> },
    StartNestedUnion,
    /// Read an array header, storing the element count in `len`.
    StartArray {
        target: Place,
        len: String,
        element_bits: u32,
        fixed_length: u32,
    },
    /// Decode `len` elements into `item`, appending each to `target`.
    ForEachIndex {
        target: Place,
        len: String,
        item: String,
        body: Vec<DecodeOp>,
    },
    StartMap,
    Finish,
    CheckMapSizes { keys: String, values: String },
    ZipMap {
        target: Place,
        keys: String,
        values: String,
    },
    SetAbsent { target: Place },
    /// Decode `body` only when the struct header version is at least
    /// `min_version`; otherwise leave `target` absent.
    VersionGate {
        min_version: u32,
        target: Place,
        body: Vec<DecodeOp>,
    },
    Fail(ValidationErrorKind),
}

/// Encode and decode programs for one struct.
#[derive(Clone, Debug, PartialEq)]
pub struct StructCodec {
    pub name: String,
    /// Field names in serialization order.
    pub fields: Vec<String>,
    pub versions: Vec<StructVersion>,
    pub encode: Vec<EncodeOp>,
    pub decode: Vec<DecodeOp>,
}

impl StructCodec {
    pub fn current_version(&self) -> Option<StructVersion> {
        self.versions.last().copied()
    }
}

/// Programs for one union member. They address the payload as `u.Value`.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionArm {
    pub tag: u32,
    pub name: String,
    pub encode: Vec<EncodeOp>,
    pub decode: Vec<DecodeOp>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnionCodec {
    pub name: String,
    pub arms: Vec<UnionArm>,
}

impl UnionCodec {
    pub fn arm(&self, tag: u32) -> Option<&UnionArm> {
        self.arms.iter().find(|arm| arm.tag == tag)
    }
}

/// Named constants of one enum (`Color_Red = 0`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumCodec {
    pub name: String,
    pub values: Vec<(String, i32)>,
}

/// Every program generated for one source file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodecSet {
    pub structs: Vec<StructCodec>,
    pub unions: Vec<UnionCodec>,
    pub enums: Vec<EnumCodec>,
}

impl CodecSet {
    pub fn struct_codec(&self, name: &str) -> Option<&StructCodec> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn union_codec(&self, name: &str) -> Option<&UnionCodec> {
        self.unions.iter().find(|u| u.name == name)
    }

    pub fn enum_codec(&self, name: &str) -> Option<&EnumCodec> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Append another set, keeping order.
    pub fn extend(&mut self, other: CodecSet) {
        self.structs.extend(other.structs);
        self.unions.extend(other.unions);
        self.enums.extend(other.enums);
    }
}
