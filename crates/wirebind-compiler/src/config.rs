//! Generation options.

use wirebind_core::Colors;

/// Configuration for a generation run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Sort map entries by key before encoding
    pub(crate) deterministic_maps: bool,
    /// Build pointer tables alongside codec programs
    pub(crate) emit_tables: bool,
    /// Color configuration for dumps
    pub(crate) colors: Colors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deterministic_maps: true,
            emit_tables: true,
            colors: Colors::OFF,
        }
    }
}

impl Config {
    /// Create a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether map keys are sorted before encoding.
    pub fn deterministic_maps(mut self, value: bool) -> Self {
        self.deterministic_maps = value;
        self
    }

    /// Set whether pointer tables are generated.
    pub fn emit_tables(mut self, value: bool) -> Self {
        self.emit_tables = value;
        self
    }

    /// Set whether to use colored output.
    pub fn colored(mut self, enabled: bool) -> Self {
        self.colors = Colors::new(enabled);
        self
    }

    pub fn colors(&self) -> Colors {
        self.colors
    }
}
