//! Type analysis: wire contracts of declared types and struct field order.
//!
//! - `classify` - declared type to [`FieldTypeDescriptor`]
//! - `layout` - serialization order and version history of a struct

mod classify;
mod layout;

#[cfg(test)]
mod layout_tests;

pub use classify::{Classifier, FieldTypeDescriptor, HandleRole, UnionPlacement};
pub use layout::{LayoutField, StructLayout, layout_struct};
