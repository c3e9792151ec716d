//! Reader tests: flat element lists into nested type trees.

use argon_codegen::ir::{Definition, StructureDefinitionKind};
use argon_codegen::parser::parse_bundle;
use argon_codegen::StructureError;
use argon_models::Bundle;
use serde_json::{json, Value};

fn bundle(resources: Vec<Value>) -> Bundle {
    let entries: Vec<Value> = resources.into_iter().map(|r| json!({"resource": r})).collect();
    Bundle::from_value(&json!({
        "resourceType": "Bundle",
        "type": "collection",
        "entry": entries
    }))
    .unwrap()
}

fn patient_resource() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "Patient",
        "kind": "resource",
        "type": "Patient",
        "snapshot": {
            "element": [
                {"path": "Patient", "definition": "Demographics and administrative information."},
                // listed before its parent: depth ordering must still hold
                {"path": "Patient.contact.name", "definition": "A name associated with the contact person.", "min": 0, "max": "1", "type": [{"code": "HumanName"}]},
                {"path": "Patient.contact", "definition": "A contact party for the patient.", "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
                {"path": "Patient.active", "definition": "Whether this patient record is in active use.", "min": 0, "max": "1", "type": [{"code": "boolean"}]}
            ]
        }
    })
}

#[test]
fn reconstructs_nested_tree_from_flat_paths() {
    let definitions = parse_bundle(&bundle(vec![patient_resource()])).unwrap();
    assert_eq!(definitions.len(), 1);

    let patient = &definitions[0];
    assert_eq!(patient.id, "Patient");
    assert_eq!(patient.kind, Some(StructureDefinitionKind::Resource));
    assert_eq!(
        patient.docstring,
        "Demographics and administrative information."
    );

    let keys: Vec<&str> = patient.elements.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["resourceType", "contact", "active"]);

    let contact = &patient.elements["contact"];
    assert_eq!(contact.id, "PatientContact");
    assert_eq!(contact.kind, Some(StructureDefinitionKind::ComplexType));
    assert_eq!(contact.types.len(), 1);
    assert_eq!(contact.types[0].code, "PatientContact");
    assert!(contact.types[0].isarray);

    let contact_name = &contact.elements["name"];
    assert_eq!(contact_name.types[0].code, "HumanName");
    assert!(!contact_name.types[0].isarray);
}

#[test]
fn synthesizes_resource_discriminator() {
    let definitions = parse_bundle(&bundle(vec![patient_resource()])).unwrap();
    let tag = &definitions[0].elements["resourceType"];

    assert_eq!(tag.types.len(), 1);
    assert_eq!(tag.types[0].code, "Patient");
    assert!(tag.types[0].required);
    assert!(tag.types[0].literal);
}

#[test]
fn complex_kind_gets_no_discriminator() {
    let definitions = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "HumanName",
        "kind": "complex-type",
        "type": "HumanName",
        "snapshot": {
            "element": [
                {"path": "HumanName", "definition": "A human name."},
                {"path": "HumanName.family", "min": 0, "max": "1", "type": [{"code": "string"}]}
            ]
        }
    })]))
    .unwrap();

    assert!(!definitions[0].elements.contains_key("resourceType"));
    assert_eq!(definitions[0].kind, Some(StructureDefinitionKind::ComplexType));
}

#[test]
fn fails_on_missing_intermediate_path_component() {
    let result = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Patient",
        "kind": "resource",
        "type": "Patient",
        "snapshot": {
            "element": [
                {"path": "Patient", "definition": "root"},
                {"path": "Patient.contact.name", "min": 0, "max": "1", "type": [{"code": "HumanName"}]}
            ]
        }
    })]));

    assert!(matches!(
        result,
        Err(StructureError::MissingPathComponent { component, .. }) if component == "contact"
    ));
}

#[test]
fn fails_on_unknown_kind() {
    let result = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Thing",
        "kind": "logical",
        "type": "Thing",
        "snapshot": {"element": [{"path": "Thing"}]}
    })]));

    assert!(matches!(result, Err(StructureError::Model(_))));
}

#[test]
fn fails_on_missing_root_entry() {
    let result = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Patient",
        "kind": "resource",
        "type": "Patient",
        "snapshot": {
            "element": [
                {"path": "Patient.active", "min": 0, "max": "1", "type": [{"code": "boolean"}]}
            ]
        }
    })]));

    assert!(matches!(
        result,
        Err(StructureError::MissingRoot(type_name)) if type_name == "Patient"
    ));
}

#[test]
fn primitive_root_type_comes_from_value_child() {
    let definitions = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "boolean",
        "kind": "primitive-type",
        "type": "boolean",
        "snapshot": {
            "element": [
                {"path": "boolean", "definition": "Value of true or false."},
                {"path": "boolean.value", "definition": "Primitive value.", "min": 0, "max": "1",
                 "type": [{"code": "http://hl7.org/fhirpath/System.Boolean"}]}
            ]
        }
    })]))
    .unwrap();

    let boolean = &definitions[0];
    assert_eq!(boolean.kind, Some(StructureDefinitionKind::PrimitiveType));
    assert_eq!(boolean.types[0].code, "bool");
    assert_eq!(boolean.elements["value"].types[0].code, "bool");
}

#[test]
fn differential_overlay_wins_over_snapshot() {
    let definitions = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Patient",
        "kind": "resource",
        "type": "Patient",
        "snapshot": {
            "element": [
                {"path": "Patient", "definition": "root"},
                {"path": "Patient.name", "definition": "snapshot definition", "min": 0, "max": "*", "type": [{"code": "HumanName"}]}
            ]
        },
        "differential": {
            "element": [
                {"path": "Patient.name", "definition": "overlay definition", "min": 1},
                {"path": "Patient.rank", "definition": "overlay-only element", "min": 0, "max": "1", "type": [{"code": "integer"}]}
            ]
        }
    })]))
    .unwrap();

    let patient = &definitions[0];

    let name = &patient.elements["name"];
    assert_eq!(name.docstring, "overlay definition");
    assert!(name.types[0].required);
    // absent on the overlay, kept from the snapshot
    assert!(name.types[0].isarray);
    assert_eq!(name.types[0].code, "HumanName");

    let rank = &patient.elements["rank"];
    assert_eq!(rank.types[0].code, "integer");
}

#[test]
fn choice_property_key_drops_suffix_and_keeps_alternatives() {
    let definitions = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Observation",
        "kind": "resource",
        "type": "Observation",
        "snapshot": {
            "element": [
                {"path": "Observation", "definition": "Measurements."},
                {"path": "Observation.value[x]", "definition": "Actual result.", "min": 1, "max": "1",
                 "type": [{"code": "boolean"}, {"code": "Quantity"}]}
            ]
        }
    })]))
    .unwrap();

    let value = &definitions[0].elements["value"];
    assert_eq!(value.types.len(), 2);
    assert_eq!(value.types[0].code, "boolean");
    assert_eq!(value.types[1].code, "Quantity");
    assert!(value.types.iter().all(|t| t.required));
}

#[test]
fn content_reference_reuses_the_referenced_node_name() {
    let definitions = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Observation",
        "kind": "resource",
        "type": "Observation",
        "snapshot": {
            "element": [
                {"path": "Observation", "definition": "Measurements."},
                {"path": "Observation.referenceRange", "definition": "Provides guide for interpretation.", "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
                {"path": "Observation.component", "definition": "Component results.", "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
                {"path": "Observation.referenceRange.low", "min": 0, "max": "1", "type": [{"code": "Quantity"}]},
                {"path": "Observation.component.referenceRange", "definition": "Reuse of the sibling structure.", "min": 0, "max": "*",
                 "contentReference": "#Observation.referenceRange"}
            ]
        }
    })]))
    .unwrap();

    let component = &definitions[0].elements["component"];
    let reused = &component.elements["referenceRange"];
    assert_eq!(reused.types[0].code, "ObservationReferenceRange");
    assert!(reused.types[0].isarray);
    assert!(reused.elements.is_empty());
}

#[test]
fn any_resource_remap_applies_to_plain_resource_references() {
    let definitions = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Parameters",
        "kind": "resource",
        "type": "Parameters",
        "snapshot": {
            "element": [
                {"path": "Parameters", "definition": "Operation parameters."},
                {"path": "Parameters.resource", "definition": "An inlined resource.", "min": 0, "max": "1", "type": [{"code": "Resource"}]}
            ]
        }
    })]))
    .unwrap();

    assert_eq!(
        definitions[0].elements["resource"].types[0].code,
        "AnyResource"
    );
}

#[test]
fn target_profiles_keep_definition_names() {
    let definitions = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Patient",
        "kind": "resource",
        "type": "Patient",
        "snapshot": {
            "element": [
                {"path": "Patient", "definition": "root"},
                {"path": "Patient.generalPractitioner", "definition": "Nominated care provider.", "min": 0, "max": "*",
                 "type": [{"code": "Reference", "targetProfile": [
                    "http://hl7.org/fhir/StructureDefinition/Organization",
                    "http://hl7.org/fhir/StructureDefinition/Practitioner"
                 ]}]}
            ]
        }
    })]))
    .unwrap();

    let gp = &definitions[0].elements["generalPractitioner"];
    assert_eq!(gp.types[0].code, "Reference");
    assert_eq!(gp.types[0].target_profile, vec!["Organization", "Practitioner"]);
}

#[test]
fn fails_on_non_structure_definition_target_profile() {
    let result = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Patient",
        "kind": "resource",
        "type": "Patient",
        "snapshot": {
            "element": [
                {"path": "Patient", "definition": "root"},
                {"path": "Patient.generalPractitioner", "min": 0, "max": "*",
                 "type": [{"code": "Reference", "targetProfile": ["http://hl7.org/fhir/ValueSet/colors"]}]}
            ]
        }
    })]));

    assert!(matches!(
        result,
        Err(StructureError::InvalidTargetProfile(_))
    ));
}

#[test]
fn parse_is_deterministic() {
    let input = bundle(vec![patient_resource()]);
    assert_eq!(parse_bundle(&input).unwrap(), parse_bundle(&input).unwrap());
}

/// Flatten a parsed tree back into a path-qualified element list.
fn flatten(def: &Definition, path: &str, out: &mut Vec<Value>) {
    for (key, child) in &def.elements {
        if key == "resourceType" {
            continue;
        }
        let child_path = format!("{path}.{key}");
        let (min, max) = child
            .types
            .first()
            .map(|t| {
                (
                    if t.required { 1 } else { 0 },
                    if t.isarray { "*" } else { "1" },
                )
            })
            .unwrap_or((0, "1"));

        let element = if child.kind == Some(StructureDefinitionKind::ComplexType) {
            json!({
                "path": child_path,
                "definition": child.docstring,
                "min": min,
                "max": max,
                "type": [{"code": "BackboneElement"}]
            })
        } else {
            let types: Vec<Value> = child
                .types
                .iter()
                .map(|t| json!({"code": t.code}))
                .collect();
            json!({
                "path": child_path,
                "definition": child.docstring,
                "min": min,
                "max": max,
                "type": types
            })
        };
        out.push(element);
        flatten(child, &child_path, out);
    }
}

#[test]
fn tree_survives_a_flatten_and_rebuild_round_trip() {
    let original = parse_bundle(&bundle(vec![patient_resource()]))
        .unwrap()
        .remove(0);

    let mut elements = vec![json!({
        "path": "Patient",
        "definition": original.docstring
    })];
    flatten(&original, "Patient", &mut elements);

    let rebuilt = parse_bundle(&bundle(vec![json!({
        "resourceType": "StructureDefinition",
        "id": "Patient",
        "kind": "resource",
        "type": "Patient",
        "snapshot": {"element": elements}
    })]))
    .unwrap()
    .remove(0);

    assert_eq!(rebuilt, original);
}
