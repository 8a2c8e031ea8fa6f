//! Wire format and generated-program types for wirebind.
//!
//! This crate contains:
//! - The message layout (headers, pointers, handles) with an encoder and a
//!   validating decoder
//! - Codec programs: typed encode/decode operation listings
//! - Pointer tables for table-driven walkers
//! - Text dumps of programs and tables

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod codec;
pub mod decoder;
pub mod dump;
pub mod encoder;
pub mod error;
pub mod tables;
pub mod wire;

#[cfg(test)]
mod decoder_tests;

pub use codec::{
    CodecSet, DecodeOp, EncodeOp, EnumCodec, Place, Scalar, StructCodec, UnionArm, UnionCodec,
};
pub use decoder::Decoder;
pub use dump::{dump_codecs, dump_decode, dump_encode, dump_tables};
pub use encoder::Encoder;
pub use error::{Result, ValidationError, ValidationErrorKind};
pub use tables::{
    ArrayEntry, ElementKind, StructEntry, StructTable, TableRef, TypeTables, UnionEntry,
    UnionTable,
};
pub use wire::{DataHeader, Handle, Message, StructVersion, check_struct_version};
