//! Pointer-table construction.
//!
//! A struct or union table lists the slots that hold pointers or handles, in
//! serialization order. Inline unions are listed as well since they may carry
//! pointers. Arrays and maps found along the way synthesize their own
//! entries, named from the enclosing slot and the context's table counter.

use wirebind_core::{InterfaceDef, StructDef, TypeKey, UnionDef};
use wirebind_format::tables::{
    ArrayEntry, ENTRY_SUFFIX, ElementKind, StructEntry, StructTable, TABLE_SUFFIX, TableRef,
    TypeTables, UnionEntry, UnionTable, link_entries,
};
use wirebind_format::wire::{MAP_KEYS_OFFSET, MAP_VALUES_OFFSET};

use crate::analyze::{Classifier, FieldTypeDescriptor, HandleRole, UnionPlacement};
use crate::context::GenContext;
use crate::naming::{params_table_prefix, response_params_table_prefix, table_prefix};
use crate::Result;

/// How one slot is described in a table.
struct SlotInfo {
    table: TableRef,
    kind: ElementKind,
    nullable: bool,
}

/// Builds the pointer tables of one file.
pub struct TableBuilder<'a, 'g> {
    classifier: Classifier<'g>,
    ctx: &'a mut GenContext,
    tables: TypeTables,
}

impl<'a, 'g> TableBuilder<'a, 'g> {
    pub fn new(classifier: Classifier<'g>, ctx: &'a mut GenContext) -> Self {
        Self {
            classifier,
            ctx,
            tables: TypeTables::default(),
        }
    }

    pub fn finish(self) -> TypeTables {
        self.tables
    }

    pub fn add_struct(&mut self, key: &TypeKey) -> Result<()> {
        let def = self.classifier.struct_def(key)?;
        self.insert_struct_table(&table_prefix(def.decl.qualified()), def)
    }

    pub fn add_union(&mut self, key: &TypeKey) -> Result<()> {
        let def = self.classifier.union_def(key)?;
        self.insert_union_table(def)
    }

    /// Tables for the request and response parameters of every method.
    pub fn add_interface(&mut self, key: &TypeKey) -> Result<()> {
        let def: &InterfaceDef = self.classifier.interface_def(key)?;
        for method in &def.methods {
            self.insert_struct_table(&params_table_prefix(def, method), &method.parameters)?;
            if let Some(response) = &method.response_parameters {
                self.insert_struct_table(&response_params_table_prefix(def, method), response)?;
            }
        }
        Ok(())
    }

    fn insert_struct_table(&mut self, prefix: &str, def: &StructDef) -> Result<()> {
        let mut fields: Vec<_> = def.fields.iter().collect();
        fields.sort_by_key(|f| (f.offset, f.bit));

        let mut entries = Vec::new();
        for field in fields {
            let descriptor = self.classifier.classify(&field.ty, UnionPlacement::Inline)?;
            if !has_pointer_or_handle(&descriptor) {
                continue;
            }
            entries.push(self.struct_entry(prefix, field.offset, field.min_version, &descriptor)?);
        }
        link_entries(&mut entries, |e| &mut e.keep_going);

        let name = format!("{prefix}{TABLE_SUFFIX}");
        tracing::debug!(table = %name, entries = entries.len(), "built struct table");
        self.tables.public_struct_names.push(name.clone());
        self.tables.structs.push(StructTable { name, entries });
        Ok(())
    }

    fn insert_union_table(&mut self, def: &UnionDef) -> Result<()> {
        let prefix = table_prefix(def.decl.qualified());
        let mut entries = Vec::new();
        for field in &def.fields {
            let descriptor = self.classifier.classify(&field.ty, UnionPlacement::Nested)?;
            if !has_pointer_or_handle(&descriptor) {
                continue;
            }
            let slot = self.slot_info(&format!("{prefix}_{}", field.tag), &descriptor)?;
            entries.push(UnionEntry {
                elem_table: slot.table,
                tag: field.tag,
                nullable: slot.nullable,
                elem_kind: slot.kind,
                keep_going: true,
            });
        }
        link_entries(&mut entries, |e| &mut e.keep_going);

        let name = format!("{prefix}{TABLE_SUFFIX}");
        tracing::debug!(table = %name, entries = entries.len(), "built union table");
        self.tables.public_union_names.push(name.clone());
        self.tables.unions.push(UnionTable { name, entries });
        Ok(())
    }

    fn struct_entry(
        &mut self,
        prefix: &str,
        offset: u32,
        min_version: u32,
        descriptor: &FieldTypeDescriptor,
    ) -> Result<StructEntry> {
        let slot = self.slot_info(&format!("{prefix}_{offset}"), descriptor)?;
        Ok(StructEntry {
            elem_table: slot.table,
            offset,
            min_version,
            elem_kind: slot.kind,
            nullable: slot.nullable,
            keep_going: true,
        })
    }

    /// Describe a slot, synthesizing array entries and map tables under
    /// `prefix`.
    fn slot_info(&mut self, prefix: &str, descriptor: &FieldTypeDescriptor) -> Result<SlotInfo> {
        let nullable = descriptor.is_nullable();
        let (table, kind) = match descriptor {
            FieldTypeDescriptor::Simple(_) | FieldTypeDescriptor::EnumRef { .. } => {
                (TableRef::None, ElementKind::Pod)
            }
            FieldTypeDescriptor::String { .. } => (TableRef::String, ElementKind::Array),
            FieldTypeDescriptor::Handle { role, .. } => match role {
                HandleRole::Interface => (TableRef::None, ElementKind::Interface),
                HandleRole::Raw | HandleRole::InterfaceRequest => {
                    (TableRef::None, ElementKind::Handle)
                }
            },
            FieldTypeDescriptor::StructRef { key, .. } => {
                let def = self.classifier.struct_def(key)?;
                let name = format!("{}{TABLE_SUFFIX}", table_prefix(def.decl.qualified()));
                (TableRef::Struct(name), ElementKind::Struct)
            }
            FieldTypeDescriptor::UnionRef { key, .. } => {
                let def = self.classifier.union_def(key)?;
                let name = format!("{}{TABLE_SUFFIX}", table_prefix(def.decl.qualified()));
                (TableRef::Union(name), ElementKind::Union)
            }
            FieldTypeDescriptor::Array {
                element,
                fixed_length,
                ..
            } => {
                let base = format!("{prefix}_{}", self.ctx.next_table_id());
                let name = self.insert_array_entry(&base, element, *fixed_length)?;
                (TableRef::Array(name), ElementKind::Array)
            }
            FieldTypeDescriptor::Map { key, value, .. } => {
                let base = format!("{prefix}_{}", self.ctx.next_table_id());
                let name = self.insert_map_table(&base, key, value)?;
                (TableRef::Map(name), ElementKind::Struct)
            }
        };
        Ok(SlotInfo {
            table,
            kind,
            nullable,
        })
    }

    fn insert_array_entry(
        &mut self,
        base: &str,
        element: &FieldTypeDescriptor,
        fixed_length: u32,
    ) -> Result<String> {
        let slot = self.slot_info(base, element)?;
        let name = format!("{base}{ENTRY_SUFFIX}");
        self.tables.arrays.push(ArrayEntry {
            name: name.clone(),
            elem_table: slot.table,
            num_elements: fixed_length,
            elem_bits: element.bits(),
            nullable: slot.nullable,
            elem_kind: slot.kind,
        });
        Ok(name)
    }

    /// Two-entry table: the key array at offset 0, the value array at 8.
    /// Each side's prefix already ends in its offset, which `struct_entry`
    /// appends again (`<map>_0_0_<n>`, `<map>_8_8_<n>`).
    fn insert_map_table(
        &mut self,
        base: &str,
        key: &FieldTypeDescriptor,
        value: &FieldTypeDescriptor,
    ) -> Result<String> {
        let keys = FieldTypeDescriptor::map_array(key);
        let values = FieldTypeDescriptor::map_array(value);
        let keys_prefix = format!("{base}_{MAP_KEYS_OFFSET}");
        let values_prefix = format!("{base}_{MAP_VALUES_OFFSET}");
        let mut entries = vec![
            self.struct_entry(&keys_prefix, MAP_KEYS_OFFSET, 0, &keys)?,
            self.struct_entry(&values_prefix, MAP_VALUES_OFFSET, 0, &values)?,
        ];
        link_entries(&mut entries, |e| &mut e.keep_going);

        let name = format!("{base}{TABLE_SUFFIX}");
        self.tables.structs.push(StructTable {
            name: name.clone(),
            entries,
        });
        Ok(name)
    }
}

/// Whether a slot of this type needs a table entry.
fn has_pointer_or_handle(descriptor: &FieldTypeDescriptor) -> bool {
    match descriptor {
        FieldTypeDescriptor::Simple(_) | FieldTypeDescriptor::EnumRef { .. } => false,
        FieldTypeDescriptor::String { .. }
        | FieldTypeDescriptor::Handle { .. }
        | FieldTypeDescriptor::StructRef { .. }
        | FieldTypeDescriptor::UnionRef { .. }
        | FieldTypeDescriptor::Array { .. }
        | FieldTypeDescriptor::Map { .. } => true,
    }
}
