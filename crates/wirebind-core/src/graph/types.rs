//! Resolved type graph definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opaque key identifying a user-defined type in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(pub String);

impl TypeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declaration metadata shared by every named entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclData {
    pub short_name: String,
    /// Dotted, module-qualified name (e.g. `geo.Point`).
    #[serde(default)]
    pub full_identifier: Option<String>,
    /// Enclosing struct or interface for nested declarations.
    #[serde(default)]
    pub container_type_key: Option<TypeKey>,
}

impl DeclData {
    pub fn new(short_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            full_identifier: None,
            container_type_key: None,
        }
    }

    /// Fully qualified identifier, falling back to the short name.
    pub fn qualified(&self) -> &str {
        self.full_identifier.as_deref().unwrap_or(&self.short_name)
    }
}

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
}

impl SimpleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

/// Handle subkinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    #[default]
    Unspecified,
    MessagePipe,
    DataPipeConsumer,
    DataPipeProducer,
    SharedBuffer,
}

impl HandleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "handle",
            Self::MessagePipe => "message_pipe",
            Self::DataPipeConsumer => "data_pipe_consumer",
            Self::DataPipeProducer => "data_pipe_producer",
            Self::SharedBuffer => "shared_buffer",
        }
    }
}

/// Declared type of a field, as written in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Simple(SimpleType),
    String {
        #[serde(default)]
        nullable: bool,
    },
    Handle {
        #[serde(default)]
        kind: HandleKind,
        #[serde(default)]
        nullable: bool,
    },
    Array {
        element: Box<Type>,
        /// `None` for variable-length arrays.
        #[serde(default)]
        fixed_length: Option<u32>,
        #[serde(default)]
        nullable: bool,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
        #[serde(default)]
        nullable: bool,
    },
    Reference(TypeReference),
}

impl Type {
    /// Declared nullability. Simple types are never nullable.
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Simple(_) => false,
            Self::String { nullable }
            | Self::Handle { nullable, .. }
            | Self::Array { nullable, .. }
            | Self::Map { nullable, .. } => *nullable,
            Self::Reference(r) => r.nullable,
        }
    }
}

/// Reference to a user-defined type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeReference {
    /// Resolved key. `None` means the resolver left it dangling.
    #[serde(default)]
    pub type_key: Option<TypeKey>,
    /// Identifier as written at the use site.
    pub identifier: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub is_interface_request: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    pub decl: DeclData,
    #[serde(rename = "type")]
    pub ty: Type,
    pub offset: u32,
    #[serde(default)]
    pub bit: u8,
    #[serde(default)]
    pub min_version: u32,
}

/// One entry of a struct's version history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version_number: u32,
    pub num_fields: u32,
    /// Total size including the 8-byte header.
    pub num_bytes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub decl: DeclData,
    pub fields: Vec<StructField>,
    #[serde(default)]
    pub version_info: Vec<VersionInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionField {
    pub decl: DeclData,
    #[serde(rename = "type")]
    pub ty: Type,
    pub tag: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionDef {
    pub decl: DeclData,
    pub fields: Vec<UnionField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub decl: DeclData,
    pub int_value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub decl: DeclData,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub decl: DeclData,
    pub ordinal: u32,
    pub parameters: StructDef,
    #[serde(default)]
    pub response_parameters: Option<StructDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub decl: DeclData,
    pub methods: Vec<MethodDef>,
}

/// A user-defined type reachable through a [`TypeKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDefinedType {
    Enum(EnumDef),
    Struct(StructDef),
    Union(UnionDef),
    Interface(InterfaceDef),
}

impl UserDefinedType {
    pub fn decl(&self) -> &DeclData {
        match self {
            Self::Enum(e) => &e.decl,
            Self::Struct(s) => &s.decl,
            Self::Union(u) => &u.decl,
            Self::Interface(i) => &i.decl,
        }
    }

    /// Lowercase variant name, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Enum(_) => "enum",
            Self::Struct(_) => "struct",
            Self::Union(_) => "union",
            Self::Interface(_) => "interface",
        }
    }
}

/// Keys of the types declared directly in one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredObjects {
    #[serde(default)]
    pub structs: Vec<TypeKey>,
    #[serde(default)]
    pub unions: Vec<TypeKey>,
    #[serde(default)]
    pub top_level_enums: Vec<TypeKey>,
    #[serde(default)]
    pub embedded_enums: Vec<TypeKey>,
    #[serde(default)]
    pub interfaces: Vec<TypeKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub file_name: String,
    #[serde(default)]
    pub module_namespace: Option<String>,
    #[serde(default)]
    pub declared: DeclaredObjects,
}

/// Fully resolved type graph, as produced by an external schema resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeGraph {
    /// Every user-defined type, in declaration order.
    pub resolved_types: IndexMap<TypeKey, UserDefinedType>,
    #[serde(default)]
    pub files: Vec<SourceFile>,
}

impl TypeGraph {
    pub fn get(&self, key: &TypeKey) -> Option<&UserDefinedType> {
        self.resolved_types.get(key)
    }

    pub fn file(&self, file_name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.file_name == file_name)
    }
}
