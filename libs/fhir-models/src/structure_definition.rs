//! FHIR StructureDefinition model
//!
//! Version-agnostic model for StructureDefinition resources, trimmed to the
//! fields needed to rebuild the type tree they describe.

use super::element_definition::{Differential, Snapshot};
use super::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// FHIR StructureDefinition resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinition {
    /// Resource type - always "StructureDefinition"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id of this artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Canonical identifier for this structure definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Name for this structure definition (computer friendly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Natural language description of the structure definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// primitive-type | complex-type | resource | capability | operation
    ///
    /// Kept as the raw wire string; parse with [`StructureDefinitionKind`]
    /// to fail loudly on unknown values.
    pub kind: String,

    /// Whether the structure is abstract
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub is_abstract: Option<bool>,

    /// Type defined or constrained by this structure
    #[serde(rename = "type")]
    pub type_name: String,

    /// Snapshot view of the structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,

    /// Differential view of the structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential: Option<Differential>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "StructureDefinition".to_string()
}

impl StructureDefinition {
    /// Parse from JSON Value
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(Error::from)
    }

    /// Parse the wire kind string into the exhaustive kind enum
    pub fn parsed_kind(&self) -> Result<StructureDefinitionKind> {
        self.kind.parse()
    }
}

/// Kind of structure a StructureDefinition describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureDefinitionKind {
    PrimitiveType,
    ComplexType,
    Capability,
    Operation,
    Resource,
}

impl FromStr for StructureDefinitionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "primitive-type" => Ok(StructureDefinitionKind::PrimitiveType),
            "complex-type" => Ok(StructureDefinitionKind::ComplexType),
            "capability" => Ok(StructureDefinitionKind::Capability),
            "operation" => Ok(StructureDefinitionKind::Operation),
            "resource" => Ok(StructureDefinitionKind::Resource),
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_structure_definition() {
        let json = json!({
            "resourceType": "StructureDefinition",
            "id": "Patient",
            "url": "http://hl7.org/fhir/StructureDefinition/Patient",
            "name": "Patient",
            "kind": "resource",
            "abstract": false,
            "type": "Patient",
            "snapshot": {
                "element": [
                    {"id": "Patient", "path": "Patient", "definition": "Demographics"}
                ]
            }
        });

        let sd = StructureDefinition::from_value(&json).unwrap();
        assert_eq!(sd.type_name, "Patient");
        assert_eq!(
            sd.parsed_kind().unwrap(),
            StructureDefinitionKind::Resource
        );
        assert_eq!(sd.snapshot.as_ref().unwrap().element.len(), 1);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "primitive-type".parse::<StructureDefinitionKind>().unwrap(),
            StructureDefinitionKind::PrimitiveType
        );
        assert_eq!(
            "complex-type".parse::<StructureDefinitionKind>().unwrap(),
            StructureDefinitionKind::ComplexType
        );
        assert!(matches!(
            "logical".parse::<StructureDefinitionKind>(),
            Err(Error::UnknownKind(kind)) if kind == "logical"
        ));
    }
}
