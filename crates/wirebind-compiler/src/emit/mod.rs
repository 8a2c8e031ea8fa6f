//! Emission of codec programs and pointer tables.
//!
//! - `codec` - per-field encode and decode fragments, assembled into
//!   struct, union and enum programs
//! - `pointer_table` - reflection tables for table-driven walkers

mod codec;
mod pointer_table;

#[cfg(test)]
mod pointer_table_tests;

pub use codec::CodecEmitter;
pub use pointer_table::TableBuilder;
