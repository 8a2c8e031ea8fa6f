//! Runtime engine for codec programs and pointer tables.
//!
//! The interpreter runs generated encode and decode programs over dynamic
//! [`Value`]s. The walker validates an encoded message against pointer tables
//! alone.

mod interpreter;
mod trace;
mod value;
mod walker;

#[cfg(test)]
mod value_tests;

pub use interpreter::{DEFAULT_MAX_DEPTH, Interpreter};
pub use trace::{Direction, NoopTracer, PrintTracer, Tracer, Verbosity};
pub use value::Value;
pub use walker::{TableWalker, WalkStats};
