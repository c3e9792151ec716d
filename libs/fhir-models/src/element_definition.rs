//! FHIR ElementDefinition model
//!
//! Version-agnostic model for ElementDefinition (used in StructureDefinition
//! snapshots and differentials), trimmed to the fields that carry type
//! information.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR ElementDefinition - defines an element in a resource or data type structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinition {
    /// Unique id for inter-element referencing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Path of the element in the hierarchy (e.g., "Patient.name")
    pub path: String,

    /// Short label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Full formal definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// Minimum cardinality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,

    /// Maximum cardinality (can be "*")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,

    /// Base definition information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<ElementDefinitionBase>,

    /// Reference to definition of content if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_reference: Option<String>,

    /// Data type and profile for this element
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<ElementDefinitionType>>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// Base definition information for an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionBase {
    /// Path that identifies the base element
    pub path: String,

    /// Min cardinality of the base element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,

    /// Max cardinality of the base element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

/// Data type for an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinitionType {
    /// Data type code
    pub code: String,

    /// Profile (StructureDefinition) for Reference/canonical target types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_profile: Option<Vec<String>>,
}

impl ElementDefinition {
    /// Get the parent path (everything before the last '.')
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rfind('.').map(|pos| &self.path[..pos])
    }

    /// Number of dot-separated components in the path
    pub fn path_depth(&self) -> usize {
        self.path.split('.').count()
    }

    /// Check if this is a choice type element (ends with [x])
    pub fn is_choice_type(&self) -> bool {
        self.path.ends_with("[x]")
    }

    /// Check if element is required (min > 0)
    pub fn is_required(&self) -> bool {
        self.min.unwrap_or(0) > 0
    }

    /// Check if element is list-valued (max != "1")
    pub fn is_array(&self) -> bool {
        self.max.as_deref().map(|m| m != "1").unwrap_or(false)
    }

    /// Human-readable description: the formal definition, falling back to the short label
    pub fn docstring(&self) -> &str {
        self.definition
            .as_deref()
            .or(self.short.as_deref())
            .unwrap_or_default()
    }

    /// Overlay another element onto this one, field by field.
    ///
    /// Fields present on the overlay win; fields absent on the overlay keep
    /// the receiver's value. Path and id always come from the receiver.
    pub fn merged_with(&self, overlay: &ElementDefinition) -> ElementDefinition {
        let mut extensions = self.extensions.clone();
        extensions.extend(overlay.extensions.clone());

        ElementDefinition {
            id: self.id.clone(),
            path: self.path.clone(),
            short: overlay.short.clone().or_else(|| self.short.clone()),
            definition: overlay
                .definition
                .clone()
                .or_else(|| self.definition.clone()),
            min: overlay.min.or(self.min),
            max: overlay.max.clone().or_else(|| self.max.clone()),
            base: overlay.base.clone().or_else(|| self.base.clone()),
            content_reference: overlay
                .content_reference
                .clone()
                .or_else(|| self.content_reference.clone()),
            types: overlay.types.clone().or_else(|| self.types.clone()),
            extensions,
        }
    }
}

/// Snapshot - a set of elements that define the structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub element: Vec<ElementDefinition>,
}

/// Differential - a set of elements that define changes from the base
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Differential {
    pub element: Vec<ElementDefinition>,
}
