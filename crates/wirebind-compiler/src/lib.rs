//! wirebind compiler: classification, layout and emission.
//!
//! This crate turns a resolved type graph into codec programs and pointer
//! tables:
//! - `analyze` - type classification and struct field layout
//! - `naming` - memoized type key to identifier resolution
//! - `emit` - codec programs and pointer tables
//! - `generate` - per-file generation facade

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod analyze;
mod config;
mod context;
pub mod emit;
mod generate;
pub mod naming;

#[cfg(test)]
pub mod test_utils;


pub use analyze::{Classifier, FieldTypeDescriptor, HandleRole, StructLayout, UnionPlacement};
pub use config::Config;
pub use context::GenContext;
pub use generate::{Generated, Generator};
pub use naming::NameResolver;

use wirebind_core::TypeKey;

/// Errors that abort a generation run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenError {
    /// A type reference whose key is missing from the graph.
    #[error("unresolved type reference `{key}`")]
    UnresolvedReference { key: String },

    #[error("`{key}` is a {found}, expected a {expected}")]
    KindMismatch {
        key: TypeKey,
        expected: &'static str,
        found: &'static str,
    },

    #[error("struct `{name}` has no version info")]
    MissingVersionInfo { name: String },

    #[error("struct `{name}` has two fields at offset {offset}, bit {bit}")]
    DuplicateFieldPosition { name: String, offset: u32, bit: u8 },

    #[error("struct `{name}` shrinks at version {version}")]
    VersionSizeDecreased { name: String, version: u32 },

    #[error("field `{field}` of struct `{name}` needs a version newer than the struct's current one")]
    FieldVersionTooNew { name: String, field: String },

    #[error("no source file named `{name}`")]
    UnknownFile { name: String },
}

/// Result type for generation passes.
pub type Result<T> = std::result::Result<T, GenError>;
