//! Intermediate Representation (IR)
//!
//! Language-agnostic type model extracted from FHIR StructureDefinitions.
//! One [`Definition`] per structure-definition record, each a tree of typed,
//! cardinality-annotated properties.

use indexmap::IndexMap;

pub use argon_models::StructureDefinitionKind;

/// One candidate type for a property.
///
/// A property may carry several (a "choice of types"); at most one
/// alternative is selected per actual value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyType {
    /// Resolved type name: a target primitive or another definition's name
    pub code: String,
    /// Cardinality minimum >= 1 for this choice
    pub required: bool,
    /// Cardinality maximum != 1
    pub isarray: bool,
    /// Denotes a fixed literal value rather than an open type
    pub literal: bool,
    /// Allowed target definitions when `code` is a polymorphic reference type
    pub target_profile: Vec<String>,
    /// Original wire name, set when the emitted identifier has to differ
    pub alias: Option<String>,
}

impl PropertyType {
    pub fn new(code: impl Into<String>) -> Self {
        PropertyType {
            code: code.into(),
            required: false,
            isarray: false,
            literal: false,
            target_profile: Vec::new(),
            alias: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn isarray(mut self, isarray: bool) -> Self {
        self.isarray = isarray;
        self
    }

    pub fn literal(mut self, literal: bool) -> Self {
        self.literal = literal;
        self
    }

    pub fn target_profile(mut self, target_profile: Vec<String>) -> Self {
        self.target_profile = target_profile;
        self
    }
}

/// Ordered child map of a definition node.
///
/// Insertion order follows schema declaration order, which keeps output
/// deterministic across runs.
pub type Elements = IndexMap<String, Definition>;

/// One node of the type tree: a root resource/complex/primitive type, or a
/// nested property.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Declaration name (root and nested complex nodes) or property name (leaves)
    pub id: String,
    /// Human-readable description, carried through for documentation
    pub docstring: String,
    /// Zero entries = untyped, one = monomorphic, more = polymorphic choice
    pub types: Vec<PropertyType>,
    /// Child properties, keyed by property name
    pub elements: Elements,
    /// Structure kind; `None` for scalar leaves
    pub kind: Option<StructureDefinitionKind>,
}

impl Definition {
    pub fn new(id: impl Into<String>, docstring: impl Into<String>) -> Self {
        Definition {
            id: id.into(),
            docstring: docstring.into(),
            types: Vec::new(),
            elements: Elements::new(),
            kind: None,
        }
    }

    /// More than one candidate type
    pub fn is_polymorphic(&self) -> bool {
        self.types.len() > 1
    }

    /// Polymorphic with every alternative mandatory: cannot be lowered to a
    /// single record of optional fields.
    pub fn is_required_polymorphic(&self) -> bool {
        self.is_polymorphic() && self.types.iter().all(|t| t.required)
    }

    /// Derive a new definition with the id replaced.
    pub fn with_id(&self, id: impl Into<String>) -> Definition {
        Definition {
            id: id.into(),
            ..self.clone()
        }
    }

    /// Derive a new definition with the type list replaced.
    pub fn with_types(&self, types: Vec<PropertyType>) -> Definition {
        Definition {
            types,
            ..self.clone()
        }
    }

    /// Derive a new definition with the child map replaced.
    pub fn with_elements(&self, elements: Elements) -> Definition {
        Definition {
            elements,
            ..self.clone()
        }
    }
}
