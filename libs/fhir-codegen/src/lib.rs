//! FHIR Type-Model Code Generator
//!
//! Compiles FHIR StructureDefinitions into typed data-model source code.
//!
//! ## Architecture
//!
//! The generator uses a three-stage pipeline:
//! 1. **Parser**: Rebuilds nested type trees from flat StructureDefinition element lists
//! 2. **IR (Intermediate Representation)**: Language-agnostic type model
//! 3. **Lowering + Generators**: Declaration syntax tree, rendered per target language
//!
//! This architecture allows adding new target languages without re-reading
//! definition bundles.

pub mod decl;
pub mod error;
pub mod generators;
pub mod ir;
pub mod lower;
pub mod parser;

pub use error::{Result, StructureError};

use std::fs;
use std::path::Path;

use anyhow::Context;
use argon_models::Bundle;
use decl::Declaration;
use generators::python::PythonGenerator;
use generators::{Generator, GeneratorConfig};
use ir::Definition;
use lower::LowerConfig;

/// Main entry point for code generation
pub struct CodeGenerator {
    definitions: Vec<Definition>,
}

impl CodeGenerator {
    /// Create a new code generator from a definitions bundle
    pub fn from_bundle(bundle: &Bundle) -> Result<Self> {
        let definitions = parser::parse_bundle(bundle)?;
        Ok(Self { definitions })
    }

    /// Get the parsed type model
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Lower the type model into the declaration sequence
    pub fn lower(&self, config: &LowerConfig) -> Vec<Declaration> {
        lower::lower(&self.definitions, config)
    }

    /// Lower and render for a specific target language
    pub fn generate<G: Generator>(
        &self,
        generator: G,
        config: &LowerConfig,
    ) -> anyhow::Result<G::Output> {
        generator.generate(&self.lower(config))
    }
}

/// Convenience helper to run the Python generator over a bundle file.
///
/// Returns the rendered declaration body; the static preamble is prepended
/// by the driver once per artifact.
pub fn generate_python_from_bundle(
    bundle_path: &Path,
    config: GeneratorConfig,
) -> anyhow::Result<String> {
    let raw = fs::read_to_string(bundle_path)
        .with_context(|| format!("reading bundle {}", bundle_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing bundle {}", bundle_path.display()))?;
    let bundle = Bundle::from_value(&value).context("loading bundle")?;

    let codegen = CodeGenerator::from_bundle(&bundle).context("building type model")?;

    let generator = PythonGenerator::new(config);
    codegen
        .generate(generator, &LowerConfig::default())
        .context("running Python generator")
}
