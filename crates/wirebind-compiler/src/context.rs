use crate::naming::NameResolver;

/// Mutable state of one generation run.
///
/// A context belongs to a single file run and is passed by `&mut` to every
/// pass that names things. Independent runs use independent contexts.
#[derive(Clone, Debug, Default)]
pub struct GenContext {
    pub names: NameResolver,
    table_counter: u32,
}

impl GenContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next suffix for a synthesized table name.
    pub fn next_table_id(&mut self) -> u32 {
        let id = self.table_counter;
        self.table_counter += 1;
        id
    }
}
