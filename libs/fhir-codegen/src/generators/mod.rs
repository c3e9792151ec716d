//! Code generators for target languages
//!
//! Generators turn a lowered declaration sequence into source text. All
//! semantic decisions happen during lowering; a generator only formats.

pub mod python;

use crate::decl::Declaration;
use anyhow::Result;

/// Trait that all language generators must implement
pub trait Generator {
    /// The output type of this generator
    type Output;

    /// Render a declaration sequence
    fn generate(&self, declarations: &[Declaration]) -> Result<Self::Output>;
}

/// Configuration options for code generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Import path of the base model class generated records extend,
    /// e.g. "pydantic.BaseModel"
    pub base_model: String,
    /// Whether to render documentation strings
    pub generate_docs: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_model: "pydantic.BaseModel".to_string(),
            generate_docs: true,
        }
    }
}
