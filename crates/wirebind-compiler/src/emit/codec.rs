//! Codec program emission.
//!
//! Every field becomes an encode fragment and a mirrored decode fragment,
//! chosen by matching on its [`FieldTypeDescriptor`]. Containers recurse with
//! the nesting level appended to their loop variables (`elem0`, `keys1`).

use wirebind_core::utils::format_name;
use wirebind_core::{StructDef, TypeKey};
use wirebind_format::ValidationErrorKind;
use wirebind_format::codec::{
    DecodeOp, EncodeOp, EnumCodec, Place, STRUCT_VAR, Scalar, StructCodec, UnionArm, UnionCodec,
};
use wirebind_format::wire::StructVersion;

use crate::analyze::{Classifier, FieldTypeDescriptor, UnionPlacement, layout_struct};
use crate::context::GenContext;
use crate::naming::{enum_value_name, params_codec_name, response_params_codec_name};
use crate::Result;

/// Emits codec programs for the types of one generation run.
pub struct CodecEmitter<'a, 'g> {
    classifier: Classifier<'g>,
    ctx: &'a mut GenContext,
    sort_map_keys: bool,
}

impl<'a, 'g> CodecEmitter<'a, 'g> {
    pub fn new(classifier: Classifier<'g>, ctx: &'a mut GenContext, sort_map_keys: bool) -> Self {
        Self {
            classifier,
            ctx,
            sort_map_keys,
        }
    }

    fn type_name(&mut self, key: &TypeKey) -> Result<String> {
        self.ctx.names.type_name(self.classifier.graph(), key)
    }

    pub fn emit_struct(&mut self, key: &TypeKey) -> Result<StructCodec> {
        let def = self.classifier.struct_def(key)?;
        let name = self.type_name(key)?;
        self.emit_struct_def(&name, def)
    }

    /// Emit the programs of a struct that may not live in the graph
    /// (method parameters).
    pub fn emit_struct_def(&mut self, name: &str, def: &StructDef) -> Result<StructCodec> {
        let layout = layout_struct(&self.classifier, name, def)?;
        let versions: Vec<_> = layout
            .versions
            .iter()
            .map(|v| StructVersion {
                version: v.version_number,
                num_bytes: v.num_bytes,
            })
            .collect();

        let mut encode = vec![EncodeOp::StartStruct {
            num_bytes: layout.current.num_bytes,
            version: layout.current.version_number,
        }];
        let mut decode = vec![DecodeOp::ReadStructHeader {
            versions: versions.clone(),
        }];
        for field in &layout.fields {
            let place = Place::field(STRUCT_VAR, &field.name);
            encode.extend(self.encode(&field.descriptor, &place, 0)?);

            let ops = self.decode(&field.descriptor, &place, 0)?;
            if field.min_version > 0 {
                decode.push(DecodeOp::VersionGate {
                    min_version: field.min_version,
                    target: place,
                    body: ops,
                });
            } else {
                decode.extend(ops);
            }
        }
        encode.push(EncodeOp::Finish);
        decode.push(DecodeOp::Finish);

        tracing::debug!(name, ops = encode.len() + decode.len(), "emitted struct codec");
        Ok(StructCodec {
            name: name.to_string(),
            fields: layout.fields.into_iter().map(|f| f.name).collect(),
            versions,
            encode,
            decode,
        })
    }

    pub fn emit_union(&mut self, key: &TypeKey) -> Result<UnionCodec> {
        let def = self.classifier.union_def(key)?;
        let name = self.type_name(key)?;
        let value = Place::union_value();

        let mut arms = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            let descriptor = self.classifier.classify(&field.ty, UnionPlacement::Nested)?;
            arms.push(UnionArm {
                tag: field.tag,
                name: format_name(&field.decl.short_name),
                encode: self.encode(&descriptor, &value, 0)?,
                decode: self.decode(&descriptor, &value, 0)?,
            });
        }

        tracing::debug!(name = %name, arms = arms.len(), "emitted union codec");
        Ok(UnionCodec { name, arms })
    }

    /// Parameter structs of every method, request before response.
    pub fn emit_interface(&mut self, key: &TypeKey) -> Result<Vec<StructCodec>> {
        let def = self.classifier.interface_def(key)?;
        let interface_name = self.type_name(key)?;
        let mut codecs = Vec::new();
        for method in &def.methods {
            let name = params_codec_name(&interface_name, method);
            codecs.push(self.emit_struct_def(&name, &method.parameters)?);
            if let Some(response) = &method.response_parameters {
                let name = response_params_codec_name(&interface_name, method);
                codecs.push(self.emit_struct_def(&name, response)?);
            }
        }
        Ok(codecs)
    }

    pub fn emit_enum(&mut self, key: &TypeKey) -> Result<EnumCodec> {
        let def = self.classifier.enum_def(key)?;
        let name = self.type_name(key)?;
        let values = def
            .values
            .iter()
            .map(|v| (enum_value_name(&name, &v.decl.short_name), v.int_value))
            .collect();
        Ok(EnumCodec { name, values })
    }

    fn encode(
        &mut self,
        descriptor: &FieldTypeDescriptor,
        value: &Place,
        level: u32,
    ) -> Result<Vec<EncodeOp>> {
        let ops = match descriptor {
            FieldTypeDescriptor::Simple(simple) => vec![EncodeOp::Write {
                value: value.clone(),
                scalar: Scalar::Simple(*simple),
            }],
            FieldTypeDescriptor::EnumRef { .. } => vec![EncodeOp::Write {
                value: value.clone(),
                scalar: Scalar::Enum,
            }],
            FieldTypeDescriptor::Handle { nullable, .. } => {
                let write = vec![EncodeOp::Write {
                    value: value.clone(),
                    scalar: Scalar::Handle,
                }];
                if *nullable {
                    vec![EncodeOp::IfAbsent {
                        value: value.clone(),
                        then: vec![EncodeOp::WriteInvalidHandle],
                        otherwise: write,
                    }]
                } else {
                    write
                }
            }
            FieldTypeDescriptor::String { nullable } => encode_pointer(
                value,
                *nullable,
                vec![
                    EncodeOp::WritePointer,
                    EncodeOp::Write {
                        value: value.clone(),
                        scalar: Scalar::String,
                    },
                ],
            ),
            FieldTypeDescriptor::StructRef { key, nullable } => {
                let name = self.type_name(key)?;
                encode_pointer(
                    value,
                    *nullable,
                    vec![
                        EncodeOp::WritePointer,
                        EncodeOp::EncodeStruct {
                            value: value.clone(),
                            name,
                        },
                    ],
                )
            }
            FieldTypeDescriptor::UnionRef {
                key,
                nullable,
                nested,
            } => {
                let name = self.type_name(key)?;
                let absent = if *nullable {
                    EncodeOp::WriteNullUnion
                } else {
                    EncodeOp::Fail(ValidationErrorKind::UnexpectedNullUnion)
                };
                let slot = EncodeOp::IfAbsent {
                    value: value.clone(),
                    then: vec![absent],
                    otherwise: vec![EncodeOp::EncodeUnion {
                        value: value.clone(),
                        name,
                    }],
                };
                if *nested {
                    vec![
                        EncodeOp::WritePointer,
                        EncodeOp::StartNestedUnion,
                        slot,
                        EncodeOp::Finish,
                    ]
                } else {
                    vec![slot]
                }
            }
            FieldTypeDescriptor::Array {
                element,
                fixed_length,
                nullable,
            } => {
                let item = format!("elem{level}");
                let body = self.encode_array(element, *fixed_length, value, &item, level)?;
                encode_pointer(value, *nullable, body)
            }
            FieldTypeDescriptor::Map {
                key,
                value: map_value,
                nullable,
            } => {
                let keys_var = format!("keys{level}");
                let values_var = format!("values{level}");
                let mut body = vec![
                    EncodeOp::WritePointer,
                    EncodeOp::StartMap,
                    EncodeOp::SplitMap {
                        value: value.clone(),
                        keys: keys_var.clone(),
                        values: values_var.clone(),
                        sort_keys: self.sort_map_keys,
                    },
                ];
                for (element, var, item) in [
                    (key, keys_var, format!("key{level}")),
                    (map_value, values_var, format!("value{level}")),
                ] {
                    body.extend(self.encode_array(element, 0, &Place::var(var), &item, level)?);
                }
                body.push(EncodeOp::Finish);
                encode_pointer(value, *nullable, body)
            }
        };
        Ok(ops)
    }

    /// Pointer, header, elements and terminator of one array block.
    fn encode_array(
        &mut self,
        element: &FieldTypeDescriptor,
        fixed_length: u32,
        value: &Place,
        item: &str,
        level: u32,
    ) -> Result<Vec<EncodeOp>> {
        let body = self.encode(element, &Place::var(item), level + 1)?;
        Ok(vec![
            EncodeOp::WritePointer,
            EncodeOp::StartArray {
                value: value.clone(),
                element_bits: element.bits(),
                fixed_length,
            },
            EncodeOp::ForEach {
                value: value.clone(),
                item: item.to_string(),
                body,
            },
            EncodeOp::Finish,
        ])
    }

    fn decode(
        &mut self,
        descriptor: &FieldTypeDescriptor,
        target: &Place,
        level: u32,
    ) -> Result<Vec<DecodeOp>> {
        let ops = match descriptor {
            FieldTypeDescriptor::Simple(simple) => vec![DecodeOp::Read {
                target: target.clone(),
                scalar: Scalar::Simple(*simple),
            }],
            FieldTypeDescriptor::EnumRef { .. } => vec![DecodeOp::Read {
                target: target.clone(),
                scalar: Scalar::Enum,
            }],
            FieldTypeDescriptor::Handle { nullable, .. } => vec![
                DecodeOp::Read {
                    target: target.clone(),
                    scalar: Scalar::Handle,
                },
                DecodeOp::IfInvalidHandle {
                    target: target.clone(),
                    then: vec![absent_or_fail(
                        target,
                        *nullable,
                        ValidationErrorKind::UnexpectedInvalidHandle,
                    )],
                },
            ],
            FieldTypeDescriptor::String { nullable } => decode_pointer(
                target,
                *nullable,
                ValidationErrorKind::UnexpectedNullPointer,
                vec![DecodeOp::Read {
                    target: target.clone(),
                    scalar: Scalar::String,
                }],
            ),
            FieldTypeDescriptor::StructRef { key, nullable } => {
                let name = self.type_name(key)?;
                decode_pointer(
                    target,
                    *nullable,
                    ValidationErrorKind::UnexpectedNullPointer,
                    vec![DecodeOp::DecodeStruct {
                        target: target.clone(),
                        name,
                    }],
                )
            }
            FieldTypeDescriptor::UnionRef {
                key,
                nullable,
                nested,
            } => {
                let name = self.type_name(key)?;
                let mut slot = vec![DecodeOp::DecodeUnion {
                    target: target.clone(),
                    name,
                }];
                if !nullable {
                    slot.push(DecodeOp::IfAbsent {
                        target: target.clone(),
                        then: vec![DecodeOp::Fail(ValidationErrorKind::UnexpectedNullUnion)],
                    });
                }
                if *nested {
                    let mut boxed = vec![DecodeOp::StartNestedUnion];
                    boxed.extend(slot);
                    boxed.push(DecodeOp::Finish);
                    decode_pointer(
                        target,
                        *nullable,
                        ValidationErrorKind::UnexpectedNullUnion,
                        boxed,
                    )
                } else {
                    slot
                }
            }
            FieldTypeDescriptor::Array {
                element,
                fixed_length,
                nullable,
            } => {
                let len = format!("len{level}");
                let item = format!("elem{level}");
                let body = self.decode_array(element, *fixed_length, target, &len, &item, level)?;
                decode_pointer(
                    target,
                    *nullable,
                    ValidationErrorKind::UnexpectedNullPointer,
                    body,
                )
            }
            FieldTypeDescriptor::Map {
                key,
                value,
                nullable,
            } => {
                let keys_var = format!("keys{level}");
                let values_var = format!("values{level}");
                let len = format!("len{level}");
                let mut body = vec![DecodeOp::StartMap];
                for (element, var, item) in [
                    (key, &keys_var, format!("key{level}")),
                    (value, &values_var, format!("value{level}")),
                ] {
                    let place = Place::var(var.as_str());
                    let array = self.decode_array(element, 0, &place, &len, &item, level)?;
                    body.extend(decode_pointer(
                        &place,
                        false,
                        ValidationErrorKind::UnexpectedNullPointer,
                        array,
                    ));
                }
                body.push(DecodeOp::Finish);
                body.push(DecodeOp::CheckMapSizes {
                    keys: keys_var.clone(),
                    values: values_var.clone(),
                });
                body.push(DecodeOp::ZipMap {
                    target: target.clone(),
                    keys: keys_var,
                    values: values_var,
                });
                decode_pointer(
                    target,
                    *nullable,
                    ValidationErrorKind::UnexpectedNullPointer,
                    body,
                )
            }
        };
        Ok(ops)
    }

    /// Header, elements and terminator of one array block. The pointer has
    /// already been read.
    fn decode_array(
        &mut self,
        element: &FieldTypeDescriptor,
        fixed_length: u32,
        target: &Place,
        len: &str,
        item: &str,
        level: u32,
    ) -> Result<Vec<DecodeOp>> {
        let body = self.decode(element, &Place::var(item), level + 1)?;
        Ok(vec![
            DecodeOp::StartArray {
                target: target.clone(),
                len: len.to_string(),
                element_bits: element.bits(),
                fixed_length,
            },
            DecodeOp::ForEachIndex {
                target: target.clone(),
                len: len.to_string(),
                item: item.to_string(),
                body,
            },
            DecodeOp::Finish,
        ])
    }
}

/// Guard a pointer-shaped payload with a null check when the field is
/// nullable.
fn encode_pointer(value: &Place, nullable: bool, body: Vec<EncodeOp>) -> Vec<EncodeOp> {
    if !nullable {
        return body;
    }
    vec![EncodeOp::IfAbsent {
        value: value.clone(),
        then: vec![EncodeOp::WriteNullPointer],
        otherwise: body,
    }]
}

fn decode_pointer(
    target: &Place,
    nullable: bool,
    null_error: ValidationErrorKind,
    payload: Vec<DecodeOp>,
) -> Vec<DecodeOp> {
    vec![
        DecodeOp::ReadPointer,
        DecodeOp::IfNullPointer {
            then: vec![absent_or_fail(target, nullable, null_error)],
            otherwise: payload,
        },
    ]
}

fn absent_or_fail(target: &Place, nullable: bool, error: ValidationErrorKind) -> DecodeOp {
    if nullable {
        DecodeOp::SetAbsent {
            target: target.clone(),
        }
    } else {
        DecodeOp::Fail(error)
    }
}
