//! Type key to identifier resolution.
//!
//! Names are derived from the short name through [`format_name`]. Enums
//! declared inside a struct or interface are prefixed with the container's
//! name (`Shape_Kind`). Results are cached for the lifetime of the resolver.

use indexmap::IndexMap;
use wirebind_core::utils::{format_name, to_c_name};
use wirebind_core::{InterfaceDef, MethodDef, TypeGraph, TypeKey, UserDefinedType};

use crate::{GenError, Result};

#[derive(Clone, Debug, Default)]
pub struct NameResolver {
    cache: IndexMap<TypeKey, String>,
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical identifier for `key`.
    pub fn type_name(&mut self, graph: &TypeGraph, key: &TypeKey) -> Result<String> {
        if let Some(name) = self.cache.get(key) {
            return Ok(name.clone());
        }

        let resolved = graph.get(key).ok_or_else(|| GenError::UnresolvedReference {
            key: key.to_string(),
        })?;
        let decl = resolved.decl();
        let mut name = format_name(&decl.short_name);
        if let (UserDefinedType::Enum(_), Some(container)) = (resolved, &decl.container_type_key) {
            let container_name = self.type_name(graph, container)?;
            name = format!("{container_name}_{name}");
        }

        if let Some((other, _)) = self.cache.iter().find(|(_, n)| **n == name) {
            // TODO: disambiguate colliding names once module namespaces are
            // part of the generated identifiers.
            tracing::warn!(key = %key, other = %other, name = %name, "type name collision");
        }
        self.cache.insert(key.clone(), name.clone());
        Ok(name)
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Qualified enum constant (`Color_Red`).
pub fn enum_value_name(enum_name: &str, value: &str) -> String {
    format!("{enum_name}_{}", format_name(value))
}

/// Codec name of a method's request parameters (`Calc_Add_Params`).
pub fn params_codec_name(interface_name: &str, method: &MethodDef) -> String {
    format!("{interface_name}_{}_Params", format_name(&method.decl.short_name))
}

/// Codec name of a method's response parameters.
pub fn response_params_codec_name(interface_name: &str, method: &MethodDef) -> String {
    format!(
        "{interface_name}_{}_ResponseParams",
        format_name(&method.decl.short_name)
    )
}

/// Flat symbol prefix of a struct or union table (`geo_Point`).
pub fn table_prefix(qualified: &str) -> String {
    to_c_name(qualified)
}

/// Table prefix of a method's request parameters (`calc_Calc_Add__Params`).
pub fn params_table_prefix(interface: &InterfaceDef, method: &MethodDef) -> String {
    format!(
        "{}_{}__Params",
        to_c_name(interface.decl.qualified()),
        method.decl.short_name
    )
}

/// Table prefix of a method's response parameters.
pub fn response_params_table_prefix(interface: &InterfaceDef, method: &MethodDef) -> String {
    format!(
        "{}_{}__ResponseParams",
        to_c_name(interface.decl.qualified()),
        method.decl.short_name
    )
}
