//! Type classification.
//!
//! Derives the complete encoding contract of a declared field type: whether it
//! lives inline or behind a pointer, its slot width, its nullability and, for
//! containers, the contracts of its parts.

use wirebind_core::{
    EnumDef, HandleKind, InterfaceDef, SimpleType, StructDef, Type, TypeGraph, TypeKey,
    TypeReference, UnionDef, UserDefinedType,
};
use wirebind_format::wire::{ENUM_BITS, HANDLE_BITS, POINTER_BITS, UNION_BITS};

use crate::{GenError, Result};

/// Where a union value is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnionPlacement {
    /// The 16-byte slot sits in the enclosing block.
    Inline,
    /// The slot is boxed behind a pointer (union members of unions).
    Nested,
}

/// What a 32-bit handle slot carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleRole {
    Raw,
    /// Bound interface endpoint.
    Interface,
    /// Message pipe endpoint requesting an interface.
    InterfaceRequest,
}

/// Encoding contract of one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldTypeDescriptor {
    Simple(SimpleType),
    String {
        nullable: bool,
    },
    Handle {
        kind: HandleKind,
        role: HandleRole,
        nullable: bool,
    },
    EnumRef {
        key: TypeKey,
    },
    StructRef {
        key: TypeKey,
        nullable: bool,
    },
    UnionRef {
        key: TypeKey,
        nullable: bool,
        nested: bool,
    },
    Array {
        element: Box<FieldTypeDescriptor>,
        /// Declared length, 0 for unbounded arrays.
        fixed_length: u32,
        nullable: bool,
    },
    /// Implicit struct with a key array at offset 0 and a value array at 8.
    /// `key` and `value` describe the elements; see
    /// [`FieldTypeDescriptor::map_array`] for the arrays themselves.
    Map {
        key: Box<FieldTypeDescriptor>,
        value: Box<FieldTypeDescriptor>,
        nullable: bool,
    },
}

impl FieldTypeDescriptor {
    /// Slot width in bits.
    pub fn bits(&self) -> u32 {
        match self {
            Self::Simple(simple) => simple_bits(*simple),
            Self::EnumRef { .. } => ENUM_BITS,
            Self::Handle { .. } => HANDLE_BITS,
            Self::UnionRef { nested: false, .. } => UNION_BITS,
            Self::String { .. }
            | Self::StructRef { .. }
            | Self::UnionRef { nested: true, .. }
            | Self::Array { .. }
            | Self::Map { .. } => POINTER_BITS,
        }
    }

    /// Whether the slot holds a pointer to an out-of-line block.
    pub fn is_pointer(&self) -> bool {
        match self {
            Self::String { .. }
            | Self::StructRef { .. }
            | Self::Array { .. }
            | Self::Map { .. } => true,
            Self::UnionRef { nested, .. } => *nested,
            Self::Simple(_) | Self::EnumRef { .. } | Self::Handle { .. } => false,
        }
    }

    /// The non-nullable, unbounded array holding one side of a map.
    pub fn map_array(element: &FieldTypeDescriptor) -> Self {
        Self::Array {
            element: Box::new(element.clone()),
            fixed_length: 0,
            nullable: false,
        }
    }

    /// Nullability. Always false for simple and enum types.
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Simple(_) | Self::EnumRef { .. } => false,
            Self::String { nullable }
            | Self::Handle { nullable, .. }
            | Self::StructRef { nullable, .. }
            | Self::UnionRef { nullable, .. }
            | Self::Array { nullable, .. }
            | Self::Map { nullable, .. } => *nullable,
        }
    }
}

/// Bit width of a simple type.
fn simple_bits(simple: SimpleType) -> u32 {
    match simple {
        SimpleType::Bool => 1,
        SimpleType::Int8 | SimpleType::Uint8 => 8,
        SimpleType::Int16 | SimpleType::Uint16 => 16,
        SimpleType::Int32 | SimpleType::Uint32 | SimpleType::Float => 32,
        SimpleType::Int64 | SimpleType::Uint64 | SimpleType::Double => 64,
    }
}

/// Classifies declared types against a resolved graph.
#[derive(Clone, Copy, Debug)]
pub struct Classifier<'g> {
    graph: &'g TypeGraph,
}

impl<'g> Classifier<'g> {
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g TypeGraph {
        self.graph
    }

    pub fn classify(&self, ty: &Type, placement: UnionPlacement) -> Result<FieldTypeDescriptor> {
        let descriptor = match ty {
            Type::Simple(simple) => FieldTypeDescriptor::Simple(*simple),
            Type::String { nullable } => FieldTypeDescriptor::String {
                nullable: *nullable,
            },
            Type::Handle { kind, nullable } => FieldTypeDescriptor::Handle {
                kind: *kind,
                role: HandleRole::Raw,
                nullable: *nullable,
            },
            Type::Array {
                element,
                fixed_length,
                nullable,
            } => FieldTypeDescriptor::Array {
                element: Box::new(self.classify(element, UnionPlacement::Inline)?),
                fixed_length: fixed_length.unwrap_or(0),
                nullable: *nullable,
            },
            Type::Map {
                key,
                value,
                nullable,
            } => FieldTypeDescriptor::Map {
                key: Box::new(self.classify(key, UnionPlacement::Inline)?),
                value: Box::new(self.classify(value, UnionPlacement::Inline)?),
                nullable: *nullable,
            },
            Type::Reference(reference) => self.classify_reference(reference, placement)?,
        };
        Ok(descriptor)
    }

    fn classify_reference(
        &self,
        reference: &TypeReference,
        placement: UnionPlacement,
    ) -> Result<FieldTypeDescriptor> {
        let nullable = reference.nullable;
        if reference.is_interface_request {
            return Ok(FieldTypeDescriptor::Handle {
                kind: HandleKind::MessagePipe,
                role: HandleRole::InterfaceRequest,
                nullable,
            });
        }

        let key = reference
            .type_key
            .clone()
            .ok_or_else(|| GenError::UnresolvedReference {
                key: reference.identifier.clone(),
            })?;
        let resolved = self.lookup(&key)?;
        tracing::debug!(key = %key, kind = resolved.kind_name(), "classified reference");

        let descriptor = match resolved {
            UserDefinedType::Struct(_) => FieldTypeDescriptor::StructRef { key, nullable },
            UserDefinedType::Union(_) => FieldTypeDescriptor::UnionRef {
                key,
                nullable,
                nested: placement == UnionPlacement::Nested,
            },
            UserDefinedType::Enum(_) => {
                if nullable {
                    tracing::warn!(key = %key, "nullable enum reference, nullability ignored");
                }
                FieldTypeDescriptor::EnumRef { key }
            }
            UserDefinedType::Interface(_) => FieldTypeDescriptor::Handle {
                kind: HandleKind::MessagePipe,
                role: HandleRole::Interface,
                nullable,
            },
        };
        Ok(descriptor)
    }

    pub fn lookup(&self, key: &TypeKey) -> Result<&'g UserDefinedType> {
        self.graph
            .get(key)
            .ok_or_else(|| GenError::UnresolvedReference {
                key: key.to_string(),
            })
    }

    pub fn struct_def(&self, key: &TypeKey) -> Result<&'g StructDef> {
        match self.lookup(key)? {
            UserDefinedType::Struct(def) => Ok(def),
            other => Err(kind_mismatch(key, "struct", other)),
        }
    }

    pub fn union_def(&self, key: &TypeKey) -> Result<&'g UnionDef> {
        match self.lookup(key)? {
            UserDefinedType::Union(def) => Ok(def),
            other => Err(kind_mismatch(key, "union", other)),
        }
    }

    pub fn enum_def(&self, key: &TypeKey) -> Result<&'g EnumDef> {
        match self.lookup(key)? {
            UserDefinedType::Enum(def) => Ok(def),
            other => Err(kind_mismatch(key, "enum", other)),
        }
    }

    pub fn interface_def(&self, key: &TypeKey) -> Result<&'g InterfaceDef> {
        match self.lookup(key)? {
            UserDefinedType::Interface(def) => Ok(def),
            other => Err(kind_mismatch(key, "interface", other)),
        }
    }
}

fn kind_mismatch(key: &TypeKey, expected: &'static str, found: &UserDefinedType) -> GenError {
    GenError::KindMismatch {
        key: key.clone(),
        expected,
        found: found.kind_name(),
    }
}
