//! Struct field layout.
//!
//! Serialization order is (byte offset, bit) ascending, independent of the
//! declaration order. The version history is sorted by version number; its
//! last entry describes the current layout.

use wirebind_core::utils::format_name;
use wirebind_core::{StructDef, VersionInfo};
use wirebind_format::codec::STRUCT_VAR;

use super::classify::{Classifier, FieldTypeDescriptor, UnionPlacement};
use crate::{GenError, Result};

/// A struct field in serialization order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutField {
    /// Formatted field name (`FUint8`).
    pub name: String,
    /// Accessor used by codec programs (`s.FUint8`).
    pub identifier: String,
    pub descriptor: FieldTypeDescriptor,
    pub offset: u32,
    pub bit: u8,
    pub min_version: u32,
}

/// Serialization layout of one struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<LayoutField>,
    /// Sorted by version number.
    pub versions: Vec<VersionInfo>,
    /// Last entry of `versions`.
    pub current: VersionInfo,
}

/// Order and validate the fields of `def`.
pub fn layout_struct(
    classifier: &Classifier<'_>,
    name: &str,
    def: &StructDef,
) -> Result<StructLayout> {
    let mut versions = def.version_info.clone();
    if versions.is_empty() {
        return Err(GenError::MissingVersionInfo {
            name: name.to_string(),
        });
    }
    versions.sort_by_key(|v| v.version_number);
    for pair in versions.windows(2) {
        if pair[1].num_bytes < pair[0].num_bytes {
            return Err(GenError::VersionSizeDecreased {
                name: name.to_string(),
                version: pair[1].version_number,
            });
        }
    }
    let current = versions[versions.len() - 1];

    let mut sorted: Vec<_> = def.fields.iter().collect();
    sorted.sort_by_key(|f| (f.offset, f.bit));
    for pair in sorted.windows(2) {
        if (pair[0].offset, pair[0].bit) == (pair[1].offset, pair[1].bit) {
            return Err(GenError::DuplicateFieldPosition {
                name: name.to_string(),
                offset: pair[1].offset,
                bit: pair[1].bit,
            });
        }
    }

    let mut fields = Vec::with_capacity(sorted.len());
    for field in sorted {
        let field_name = format_name(&field.decl.short_name);
        if field.min_version > current.version_number {
            return Err(GenError::FieldVersionTooNew {
                name: name.to_string(),
                field: field_name,
            });
        }
        let descriptor = classifier.classify(&field.ty, UnionPlacement::Inline)?;
        fields.push(LayoutField {
            identifier: format!("{STRUCT_VAR}.{field_name}"),
            name: field_name,
            descriptor,
            offset: field.offset,
            bit: field.bit,
            min_version: field.min_version,
        });
    }

    tracing::debug!(
        name,
        fields = fields.len(),
        version = current.version_number,
        "laid out struct"
    );
    Ok(StructLayout {
        name: name.to_string(),
        fields,
        versions,
        current,
    })
}
