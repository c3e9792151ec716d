//! Reader for FHIR StructureDefinitions
//!
//! Rebuilds the nested type tree from the flat, path-ordered element list of
//! each StructureDefinition, resolves wire type codes to target-facing names
//! and classifies every node by kind.
//!
//! The flat list's path-depth ordering is the correctness invariant: elements
//! are inserted into the owned tree in ascending path depth, so a parent is
//! always present before any of its children.

use crate::error::{Result, StructureError};
use crate::ir::{Definition, Elements, PropertyType, StructureDefinitionKind};
use argon_models::{Bundle, ElementDefinition, StructureDefinition};
use std::collections::HashMap;

/// Parse a definitions bundle into one type-model root per
/// StructureDefinition resource, in bundle order.
pub fn parse_bundle(bundle: &Bundle) -> Result<Vec<Definition>> {
    bundle
        .resources_of_type("StructureDefinition")
        .map(|resource| {
            let sd = StructureDefinition::from_value(resource).map_err(StructureError::Model)?;
            read_structure_definition(&sd)
        })
        .collect()
}

/// Read a single StructureDefinition into a type-model root.
pub fn read_structure_definition(sd: &StructureDefinition) -> Result<Definition> {
    let kind = sd.parsed_kind()?;
    let elements = merge_layers(sd);

    let root_element = elements
        .iter()
        .find(|e| e.path == sd.type_name)
        .ok_or_else(|| StructureError::MissingRoot(sd.type_name.clone()))?;

    // Primitives carry their scalar representation on the synthetic "value" child.
    let root_types = match kind {
        StructureDefinitionKind::PrimitiveType => {
            let value_path = format!("{}.value", sd.type_name);
            match elements.iter().find(|e| e.path == value_path) {
                Some(value_element) => property_types(value_element)?,
                None => property_types(root_element)?,
            }
        }
        _ => property_types(root_element)?,
    };

    let docstring = match root_element.docstring() {
        "" => sd.description.clone().unwrap_or_default(),
        doc => doc.to_string(),
    };

    let mut root = Definition {
        id: sd.type_name.clone(),
        docstring,
        types: root_types,
        elements: Elements::new(),
        kind: Some(kind),
    };

    // Parents must precede children: stable sort by path depth keeps schema
    // declaration order within each level.
    let mut children: Vec<&ElementDefinition> = elements
        .iter()
        .filter(|e| e.path != sd.type_name)
        .collect();
    children.sort_by_key(|e| e.path_depth());

    for element in children {
        insert_element(&mut root, element)?;
    }

    if kind == StructureDefinitionKind::Resource {
        insert_discriminator(&mut root, &sd.type_name);
    }

    Ok(root)
}

/// Merge the canonical snapshot layer with the sparse differential overlay.
///
/// Right-biased, keyed by dotted path: overlay fields win for matching paths,
/// overlay-only paths are appended in overlay order.
fn merge_layers(sd: &StructureDefinition) -> Vec<ElementDefinition> {
    let snapshot = sd.snapshot.as_ref().map(|s| s.element.as_slice());
    let differential = sd.differential.as_ref().map(|d| d.element.as_slice());

    match (snapshot, differential) {
        (Some(snapshot), Some(differential)) => {
            let mut merged: Vec<ElementDefinition> = snapshot.to_vec();
            let mut by_path: HashMap<String, usize> = merged
                .iter()
                .enumerate()
                .map(|(i, e)| (e.path.clone(), i))
                .collect();

            for overlay in differential {
                match by_path.get(&overlay.path) {
                    Some(&i) => merged[i] = merged[i].merged_with(overlay),
                    None => {
                        by_path.insert(overlay.path.clone(), merged.len());
                        merged.push(overlay.clone());
                    }
                }
            }
            merged
        }
        (Some(snapshot), None) => snapshot.to_vec(),
        (None, Some(differential)) => differential.to_vec(),
        (None, None) => Vec::new(),
    }
}

/// Build the node for one element and attach it under its parent.
fn insert_element(root: &mut Definition, element: &ElementDefinition) -> Result<()> {
    let key = property_key(&element.path).to_string();
    let node_kind = classify(element);
    let types = property_types(element)?;

    // Nested complex nodes are declared under a path-derived name; scalar
    // leaves keep their property name.
    let id = match node_kind {
        Some(StructureDefinitionKind::ComplexType) => path_type_name(&element.path),
        _ => key.clone(),
    };

    let node = Definition {
        id,
        docstring: element.docstring().to_string(),
        types,
        elements: Elements::new(),
        kind: node_kind,
    };

    let components: Vec<&str> = element.path.split('.').collect();
    let mut in_focus = root;
    for component in &components[1..components.len() - 1] {
        let component = strip_choice_suffix(component);
        in_focus =
            in_focus
                .elements
                .get_mut(component)
                .ok_or_else(|| StructureError::MissingPathComponent {
                    path: element.path.clone(),
                    component: component.to_string(),
                })?;
    }
    in_focus.elements.insert(key, node);

    Ok(())
}

/// Synthesize the literal discriminator property that makes a resource a
/// member of the global tagged union.
fn insert_discriminator(root: &mut Definition, type_name: &str) {
    let tag = Definition {
        id: "resourceType".to_string(),
        docstring: "The type of the resource.".to_string(),
        types: vec![PropertyType::new(type_name).required(true).literal(true)],
        elements: Elements::new(),
        kind: None,
    };
    root.elements.shift_insert(0, "resourceType".to_string(), tag);
}

/// Derive the property-type list for one element.
///
/// Explicit type arrays are resolved through the wire-type table; elements
/// without one either reuse another part of the tree (content reference) or
/// refer to themselves through their declared base path.
fn property_types(element: &ElementDefinition) -> Result<Vec<PropertyType>> {
    let required = element.is_required();
    let isarray = element.is_array();

    if classify(element).is_some() {
        return Ok(vec![PropertyType::new(path_type_name(&element.path))
            .required(required)
            .isarray(isarray)]);
    }

    if let Some(types) = &element.types {
        types
            .iter()
            .map(|t| {
                let code = map_system_type(type_identifier(&t.code));
                let code = remap_any_resource(code);
                let target_profile =
                    parse_target_profiles(t.target_profile.as_deref().unwrap_or_default())?;
                Ok(PropertyType::new(code)
                    .required(required)
                    .isarray(isarray)
                    .target_profile(target_profile))
            })
            .collect()
    } else if let Some(reference) = &element.content_reference {
        let target = reference.strip_prefix('#').unwrap_or(reference);
        Ok(vec![PropertyType::new(path_type_name(target))
            .required(required)
            .isarray(isarray)])
    } else if let Some(base) = &element.base {
        Ok(vec![PropertyType::new(path_type_name(&base.path))
            .required(required)
            .isarray(isarray)])
    } else {
        Ok(Vec::new())
    }
}

/// Classify an element as a nested complex node when its wire type marker
/// says so; scalar leaves stay unset.
fn classify(element: &ElementDefinition) -> Option<StructureDefinitionKind> {
    let types = element.types.as_ref()?;
    let backbone = types
        .iter()
        .any(|t| matches!(type_identifier(&t.code), "BackboneElement" | "Element"));
    backbone.then_some(StructureDefinitionKind::ComplexType)
}

/// Last path component with any "[x]" choice suffix stripped.
///
/// Choice-of-type properties are disambiguated by their property-type list,
/// not by the suffix.
fn property_key(path: &str) -> &str {
    strip_choice_suffix(path.rsplit('.').next().unwrap_or(path))
}

fn strip_choice_suffix(component: &str) -> &str {
    component.strip_suffix("[x]").unwrap_or(component)
}

/// Declaration name for a node addressed by a dotted path:
/// "Patient.contact" -> "PatientContact".
fn path_type_name(path: &str) -> String {
    path.split('.')
        .map(strip_choice_suffix)
        .map(capitalize_first)
        .collect()
}

/// Capitalize the first letter of a string, leaving the rest untouched.
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Extract the type name from a canonical URL.
/// E.g., "http://hl7.org/fhirpath/System.String" -> "System.String"
fn type_identifier(code: &str) -> &str {
    code.rsplit('/').next().unwrap_or(code)
}

/// Map spec-defined abstract scalar types to target primitive names.
/// Codes absent from the table pass through unchanged and are treated as
/// references to other definitions.
fn map_system_type(code: &str) -> &str {
    match code {
        "System.String" | "System.Time" | "System.Date" | "System.DateTime" => "str",
        "System.Boolean" => "bool",
        "System.Decimal" | "System.Integer" => "int",
        other => other,
    }
}

/// Second rewrite pass over a resolved code: the generic "any resource"
/// reference points at the global tagged union. Applied after the general
/// table lookup, never before.
fn remap_any_resource(code: &str) -> String {
    match code {
        "Resource" => "AnyResource".to_string(),
        other => other.to_string(),
    }
}

/// Target profiles must reference structure definitions; anything else is a
/// malformed schema.
fn parse_target_profiles(profiles: &[String]) -> Result<Vec<String>> {
    profiles
        .iter()
        .map(|url| {
            let mut segments = url.rsplit('/');
            let name = segments.next().unwrap_or(url.as_str());
            match segments.next() {
                Some("StructureDefinition") => Ok(remap_any_resource(name)),
                _ => Err(StructureError::InvalidTargetProfile(url.clone())),
            }
        })
        .collect()
}
