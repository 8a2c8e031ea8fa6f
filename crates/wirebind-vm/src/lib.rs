//! Runtime for wirebind codec programs.
//!
//! This crate executes the programs produced by `wirebind-compiler` against
//! dynamic values, producing and consuming wire messages, and validates
//! messages with the generated pointer tables.

pub mod engine;

#[cfg(test)]
mod test_utils;

pub use engine::{
    DEFAULT_MAX_DEPTH, Direction, Interpreter, NoopTracer, PrintTracer, TableWalker, Tracer, Value,
    Verbosity, WalkStats,
};
