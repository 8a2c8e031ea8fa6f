//! Resolved type graph consumed by the generator.
//!
//! The graph is produced by an external schema resolver. It can be loaded
//! from JSON or from a compact postcard encoding.

mod binary;
mod json;
mod types;

#[cfg(test)]
mod binary_tests;
#[cfg(test)]
mod json_tests;

pub use json::GraphError;
pub use types::{
    DeclData, DeclaredObjects, EnumDef, EnumValue, HandleKind, InterfaceDef, MethodDef,
    SimpleType, SourceFile, StructDef, StructField, Type, TypeGraph, TypeKey, TypeReference,
    UnionDef, UnionField, UserDefinedType, VersionInfo,
};
