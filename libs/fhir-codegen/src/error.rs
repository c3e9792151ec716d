//! Error types for type-model extraction

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StructureError>;

/// Fatal errors raised while reading a structure definition into the type model.
///
/// Every variant aborts the bundle it occurred in; no declarations are
/// produced for a bundle whose reader failed.
#[derive(Error, Debug)]
pub enum StructureError {
    #[error("Malformed structure definition: {0}")]
    Model(#[from] argon_models::Error),

    #[error("No root element matching type '{0}'")]
    MissingRoot(String),

    #[error("Missing path component '{component}' while inserting '{path}'")]
    MissingPathComponent { path: String, component: String },

    #[error("Target profile is not a StructureDefinition reference: {0}")]
    InvalidTargetProfile(String),
}
