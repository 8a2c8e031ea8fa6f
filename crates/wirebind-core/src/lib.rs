#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for wirebind.
//!
//! - **Type graph**: the fully resolved schema handed over by an external
//!   resolver (structs, unions, enums, interfaces keyed by [`TypeKey`])
//! - **Naming utilities**: identifier normalization shared by all backends
//! - **Colors**: ANSI palette for rendered listings

mod colors;
pub mod graph;
pub mod utils;

#[cfg(test)]
mod utils_tests;

pub use colors::Colors;
pub use graph::{
    DeclData, DeclaredObjects, EnumDef, EnumValue, GraphError, HandleKind, InterfaceDef,
    MethodDef, SimpleType, SourceFile, StructDef, StructField, Type, TypeGraph, TypeKey,
    TypeReference, UnionDef, UnionField, UserDefinedType, VersionInfo,
};
