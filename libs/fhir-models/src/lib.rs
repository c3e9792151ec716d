//! Version-agnostic FHIR models for definition bundles
//!
//! Covers the subset of Bundle, StructureDefinition and ElementDefinition
//! needed to read type schemas out of FHIR definition bundles.

pub mod bundle;
pub mod element_definition;
pub mod error;
pub mod structure_definition;

// Re-export commonly used types
pub use bundle::*;
pub use element_definition::*;
pub use error::{Error, Result};
pub use structure_definition::*;
