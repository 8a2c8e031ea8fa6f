//! Generation facade.
//!
//! One run per source file: enums, structs, unions and interface parameters
//! declared in the file become codec programs, and (unless disabled) pointer
//! tables. Each run owns a fresh [`GenContext`].

use wirebind_core::{Colors, SourceFile, TypeGraph};
use wirebind_format::{CodecSet, TypeTables, dump_codecs, dump_tables};

use crate::analyze::Classifier;
use crate::config::Config;
use crate::context::GenContext;
use crate::emit::{CodecEmitter, TableBuilder};
use crate::{GenError, Result};

/// Output of one file run.
#[derive(Clone, Debug, PartialEq)]
pub struct Generated {
    pub file_name: String,
    pub codecs: CodecSet,
    pub tables: Option<TypeTables>,
}

impl Generated {
    /// Listing of every program followed by the tables.
    pub fn dump(&self, colors: Colors) -> String {
        let mut out = dump_codecs(&self.codecs, colors);
        if let Some(tables) = &self.tables {
            out.push_str(&dump_tables(tables, colors));
        }
        out
    }
}

pub struct Generator<'g> {
    graph: &'g TypeGraph,
    config: Config,
}

impl<'g> Generator<'g> {
    pub fn new(graph: &'g TypeGraph, config: Config) -> Self {
        Self { graph, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generate_file(&self, file_name: &str) -> Result<Generated> {
        let file = self
            .graph
            .file(file_name)
            .ok_or_else(|| GenError::UnknownFile {
                name: file_name.to_string(),
            })?;
        self.generate(file)
    }

    /// Run every source file of the graph, in order.
    pub fn generate_all(&self) -> Result<Vec<Generated>> {
        self.graph.files.iter().map(|f| self.generate(f)).collect()
    }

    fn generate(&self, file: &SourceFile) -> Result<Generated> {
        let _span = tracing::info_span!("generate_file", file = %file.file_name).entered();
        let classifier = Classifier::new(self.graph);
        let mut ctx = GenContext::new();

        let codecs = self.emit_codecs(classifier, &mut ctx, file)?;
        let tables = if self.config.emit_tables {
            Some(build_tables(classifier, &mut ctx, file)?)
        } else {
            None
        };

        tracing::info!(
            structs = codecs.structs.len(),
            unions = codecs.unions.len(),
            enums = codecs.enums.len(),
            "generated file"
        );
        Ok(Generated {
            file_name: file.file_name.clone(),
            codecs,
            tables,
        })
    }

    fn emit_codecs(
        &self,
        classifier: Classifier<'g>,
        ctx: &mut GenContext,
        file: &SourceFile,
    ) -> Result<CodecSet> {
        let declared = &file.declared;
        let mut emitter = CodecEmitter::new(classifier, ctx, self.config.deterministic_maps);
        let mut set = CodecSet::default();

        for key in declared.top_level_enums.iter().chain(&declared.embedded_enums) {
            set.enums.push(emitter.emit_enum(key)?);
        }
        for key in &declared.structs {
            set.structs.push(emitter.emit_struct(key)?);
        }
        for key in &declared.unions {
            set.unions.push(emitter.emit_union(key)?);
        }
        for key in &declared.interfaces {
            set.structs.extend(emitter.emit_interface(key)?);
        }
        Ok(set)
    }
}

fn build_tables(
    classifier: Classifier<'_>,
    ctx: &mut GenContext,
    file: &SourceFile,
) -> Result<TypeTables> {
    let declared = &file.declared;
    let mut builder = TableBuilder::new(classifier, ctx);
    for key in &declared.structs {
        builder.add_struct(key)?;
    }
    for key in &declared.unions {
        builder.add_union(key)?;
    }
    for key in &declared.interfaces {
        builder.add_interface(key)?;
    }
    Ok(builder.finish())
}
