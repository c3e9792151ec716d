//! Lowering from the type model to target-language declarations
//!
//! Walks every definition tree depth-first (children before the node that
//! owns them) and turns each node into records, aliases and unions. Handles
//! identifier formatting, modifier stacking, the required-polymorphism
//! explosion and the global discriminated union over resource roots.

use crate::decl::{AliasDecl, Declaration, DefaultValue, Field, RecordDecl, TypeExpr, UnionDecl};
use crate::ir::{Definition, Elements, PropertyType, StructureDefinitionKind};
use heck::ToUpperCamelCase;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Name of the global discriminated union over all resource roots.
pub const ANY_RESOURCE: &str = "AnyResource";

/// Tag field synthesized on every resource record.
pub const DISCRIMINATOR: &str = "resourceType";

/// Built-in scalar names of the target language.
const TARGET_PRIMITIVES: [&str; 4] = ["str", "bool", "int", "float"];

/// Options for lowering.
#[derive(Debug, Clone)]
pub struct LowerConfig {
    /// Record construct generated records extend
    pub base_record: String,
    /// Emit optional shadow fields carrying out-of-band metadata for
    /// primitive-typed fields
    pub extension_fields: bool,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            base_record: "BaseModel".to_string(),
            extension_fields: true,
        }
    }
}

/// Lower the full definition collection into an ordered declaration sequence:
/// declarations in traversal order, then post-processing directives, then the
/// global discriminated union.
pub fn lower(definitions: &[Definition], config: &LowerConfig) -> Vec<Declaration> {
    let ctx = LowerContext::new(definitions, config);
    let mut declarations = Vec::new();

    let roots: Vec<Definition> = definitions.iter().map(ensure_discriminator).collect();

    for root in &roots {
        match root.kind {
            Some(StructureDefinitionKind::Capability) | Some(StructureDefinitionKind::Operation) => {
                warn!(id = %root.id, kind = ?root.kind, "unsupported definition kind, skipping");
            }
            _ => {
                for node in collect_nodes(root) {
                    ctx.lower_node(node, &mut declarations);
                }
            }
        }
    }

    // Forward references are resolvable only once every declaration exists.
    let directives: Vec<Declaration> = declarations
        .iter()
        .filter_map(|d| match d {
            Declaration::Record(r) => Some(Declaration::ForwardRefs {
                name: r.name.clone(),
            }),
            _ => None,
        })
        .collect();
    declarations.extend(directives);

    let members: Vec<String> = roots
        .iter()
        .filter(|d| {
            d.kind == Some(StructureDefinitionKind::Resource)
                && d.elements.contains_key(DISCRIMINATOR)
        })
        .map(|d| d.id.clone())
        .collect();
    if members.len() > 1 {
        declarations.push(Declaration::Union(UnionDecl {
            name: ANY_RESOURCE.to_string(),
            members,
            discriminant: Some(DISCRIMINATOR.to_string()),
        }));
    }

    declarations
}

/// Resource declarations must carry the discriminator tag; derive an
/// augmented copy for any resource root missing it.
fn ensure_discriminator(def: &Definition) -> Definition {
    if def.kind != Some(StructureDefinitionKind::Resource)
        || def.elements.contains_key(DISCRIMINATOR)
    {
        return def.clone();
    }

    let tag = Definition {
        id: DISCRIMINATOR.to_string(),
        docstring: "The type of the resource.".to_string(),
        types: vec![PropertyType::new(def.id.clone()).required(true).literal(true)],
        elements: Elements::new(),
        kind: None,
    };
    let mut elements = Elements::new();
    elements.insert(DISCRIMINATOR.to_string(), tag);
    elements.extend(def.elements.clone());
    def.with_elements(elements)
}

/// Stack-based depth-first post-order over a root and its nested complex
/// children: every child precedes the node that owns it, siblings keep
/// schema order.
fn collect_nodes(root: &Definition) -> Vec<&Definition> {
    let mut stack = vec![root];
    let mut ordered = Vec::new();
    while let Some(node) = stack.pop() {
        ordered.push(node);
        for child in node.elements.values() {
            if is_complex_node(child) {
                stack.push(child);
            }
        }
    }
    ordered.reverse();
    ordered
}

fn is_complex_node(node: &Definition) -> bool {
    node.kind == Some(StructureDefinitionKind::ComplexType) || !node.elements.is_empty()
}

/// Annotation context: a type alias never takes the optional wrapper, a
/// record property does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnnotationForm {
    Property,
    TypeAlias,
}

struct LowerContext<'a> {
    config: &'a LowerConfig,
    /// Primitive declarations remapped to avoid collisions, original -> emitted
    primitive_renames: HashMap<String, String>,
    /// Original names of primitive-kind roots
    primitive_ids: HashSet<String>,
}

impl<'a> LowerContext<'a> {
    fn new(definitions: &[Definition], config: &'a LowerConfig) -> LowerContext<'a> {
        let mut property_identifiers = HashSet::new();
        for def in definitions {
            collect_property_identifiers(def, &mut property_identifiers);
        }

        let mut primitive_renames = HashMap::new();
        let mut primitive_ids = HashSet::new();
        for def in definitions {
            if def.kind == Some(StructureDefinitionKind::PrimitiveType) {
                primitive_ids.insert(def.id.clone());
                if is_reserved_scalar(&def.id) || property_identifiers.contains(def.id.as_str()) {
                    primitive_renames.insert(def.id.clone(), format!("{}Type", def.id));
                }
            }
        }

        LowerContext {
            config,
            primitive_renames,
            primitive_ids,
        }
    }

    /// Emitted name for a by-name type reference.
    fn resolve_code(&self, code: &str) -> String {
        self.primitive_renames
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Whether a resolved code denotes a primitive value (and therefore takes
    /// an extension shadow field).
    fn is_primitive_code(&self, code: &str) -> bool {
        TARGET_PRIMITIVES.contains(&code) || self.primitive_ids.contains(code)
    }

    fn lower_node(&self, node: &Definition, out: &mut Vec<Declaration>) {
        match node.kind {
            Some(StructureDefinitionKind::PrimitiveType) => {
                out.push(self.lower_primitive(node));
            }
            Some(StructureDefinitionKind::ComplexType)
            | Some(StructureDefinitionKind::Resource) => {
                self.lower_records(node, out);
            }
            Some(StructureDefinitionKind::Capability)
            | Some(StructureDefinitionKind::Operation) => {
                warn!(id = %node.id, kind = ?node.kind, "unsupported definition kind, skipping");
            }
            None => {}
        }
    }

    /// Primitive kind: a type alias onto the resolved type of the "value"
    /// choice.
    fn lower_primitive(&self, def: &Definition) -> Declaration {
        let value_types = def
            .elements
            .get("value")
            .map(|value| value.types.as_slice())
            .filter(|types| !types.is_empty())
            .unwrap_or(def.types.as_slice());

        let ty = value_types
            .first()
            .map(|t| self.annotate(t, AnnotationForm::TypeAlias))
            .unwrap_or_else(|| TypeExpr::name("Any"));

        Declaration::Alias(AliasDecl {
            name: self.resolve_code(&def.id),
            docstring: def.docstring.clone(),
            ty,
        })
    }

    /// Complex and resource kinds: one record, or — when a property's choice
    /// of types is mandatory in every alternative — a base record, one
    /// variant record per alternative and a union alias over the variants.
    fn lower_records(&self, node: &Definition, out: &mut Vec<Declaration>) {
        let required_poly: Vec<String> = node
            .elements
            .iter()
            .filter(|(_, prop)| prop.is_required_polymorphic())
            .map(|(key, _)| key.clone())
            .collect();

        let Some(exploded_key) = required_poly.first() else {
            out.push(Declaration::Record(self.record(
                &node.id,
                node,
                &self.config.base_record,
            )));
            return;
        };

        if required_poly.len() > 1 {
            warn!(
                id = %node.id,
                "multiple required choice properties on one node, only '{exploded_key}' drives the union"
            );
        }

        // A single record of optional fields cannot express "exactly one of N
        // alternatives is mandatory": split into base + variants + union.
        let base_name = format!("_{}Base", node.id);
        let mut base_elements = node.elements.clone();
        base_elements.shift_remove(exploded_key);
        // Any further required choice properties degrade to independent
        // optional alternatives inside the base.
        for key in required_poly.iter().skip(1) {
            let relaxed = base_elements[key.as_str()]
                .with_types(
                    base_elements[key.as_str()]
                        .types
                        .iter()
                        .map(|t| t.clone().required(false))
                        .collect(),
                );
            base_elements[key.as_str()] = relaxed;
        }
        let base_def = node.with_elements(base_elements);
        out.push(Declaration::Record(self.record(
            &base_name,
            &base_def,
            &self.config.base_record,
        )));

        let prop = &node.elements[exploded_key.as_str()];
        let mut members = Vec::new();
        for t in &prop.types {
            let variant_name = format!("_{}{}", node.id, t.code.to_upper_camel_case());
            let fields = self.alternative_fields(exploded_key, prop, t, true);
            out.push(Declaration::Record(RecordDecl {
                name: variant_name.clone(),
                base: base_name.clone(),
                docstring: prop.docstring.clone(),
                fields,
            }));
            members.push(variant_name);
        }

        out.push(Declaration::Union(UnionDecl {
            name: node.id.clone(),
            members,
            discriminant: None,
        }));
    }

    fn record(&self, name: &str, node: &Definition, base: &str) -> RecordDecl {
        let mut fields = Vec::new();
        for (key, prop) in order_properties(&node.elements, self) {
            fields.extend(self.property_fields(key, prop));
        }

        RecordDecl {
            name: name.to_string(),
            base: base.to_string(),
            docstring: node.docstring.clone(),
            fields,
        }
    }

    /// All fields contributed by one property: one per type alternative, plus
    /// extension shadow fields for primitive-typed alternatives.
    fn property_fields(&self, key: &str, prop: &Definition) -> Vec<Field> {
        if prop.types.is_empty() {
            let (name, alias) = sanitize_identifier(key);
            return vec![Field {
                name,
                alias,
                ty: TypeExpr::name("Any"),
                default: Some(DefaultValue::Absent),
                docstring: prop.docstring.clone(),
            }];
        }

        let polymorphic = prop.is_polymorphic();
        prop.types
            .iter()
            .flat_map(|t| self.alternative_fields(key, prop, t, polymorphic))
            .collect()
    }

    /// Field(s) for a single type alternative. Polymorphic alternatives get
    /// the capitalized type code appended to the property name.
    fn alternative_fields(
        &self,
        key: &str,
        prop: &Definition,
        t: &PropertyType,
        suffixed: bool,
    ) -> Vec<Field> {
        let wire_name = if suffixed {
            format!("{}{}", key, t.code.to_upper_camel_case())
        } else {
            key.to_string()
        };
        let (name, keyword_alias) = sanitize_identifier(&wire_name);
        let alias = t.alias.clone().or(keyword_alias);

        let mut fields = vec![Field {
            name,
            alias,
            ty: self.annotate(t, AnnotationForm::Property),
            default: default_value(t),
            docstring: prop.docstring.clone(),
        }];

        if self.config.extension_fields && !t.literal && self.is_primitive_code(&t.code) {
            fields.push(Field {
                name: format!("{wire_name}_ext"),
                alias: Some(format!("_{wire_name}")),
                ty: TypeExpr::optional(TypeExpr::name("Element")),
                default: Some(DefaultValue::Absent),
                docstring: String::new(),
            });
        }

        fields
    }

    /// Modifier stacking, fixed order: literal-wrap, then array-wrap, then
    /// optional-wrap. The optional wrapper only applies to record properties.
    fn annotate(&self, t: &PropertyType, form: AnnotationForm) -> TypeExpr {
        let core = if t.literal {
            TypeExpr::Literal(t.code.clone())
        } else if !t.target_profile.is_empty() {
            TypeExpr::Parameterized {
                base: self.resolve_code(&t.code),
                args: t
                    .target_profile
                    .iter()
                    .map(|profile| TypeExpr::Name(profile.clone()))
                    .collect(),
            }
        } else {
            TypeExpr::name(self.resolve_code(&t.code))
        };

        let wrapped = if t.isarray {
            TypeExpr::list(core)
        } else {
            core
        };

        if !t.required && form == AnnotationForm::Property {
            TypeExpr::optional(wrapped)
        } else {
            wrapped
        }
    }
}

/// Deserialization defaults: arrays always start empty, optional scalars
/// start absent, required literals carry their one possible value, and
/// everything else must be supplied explicitly.
fn default_value(t: &PropertyType) -> Option<DefaultValue> {
    if t.isarray {
        Some(DefaultValue::EmptyList)
    } else if t.literal && t.required {
        Some(DefaultValue::Literal(t.code.clone()))
    } else if t.required {
        None
    } else {
        Some(DefaultValue::Absent)
    }
}

/// Schema order, except that a property shadowing another property's declared
/// type name moves after the non-shadowing properties, keeping strict targets
/// able to resolve the type name first.
fn order_properties<'a>(
    elements: &'a Elements,
    ctx: &LowerContext,
) -> Vec<(&'a str, &'a Definition)> {
    let mut ordered = Vec::with_capacity(elements.len());
    let mut shadowing = Vec::new();

    for (key, prop) in elements {
        let shadows = elements.iter().any(|(other_key, other)| {
            other_key != key
                && other
                    .types
                    .iter()
                    .any(|t| ctx.resolve_code(&t.code) == *key)
        });
        if shadows {
            shadowing.push((key.as_str(), prop));
        } else {
            ordered.push((key.as_str(), prop));
        }
    }

    ordered.extend(shadowing);
    ordered
}

fn collect_property_identifiers(def: &Definition, out: &mut HashSet<String>) {
    for (key, child) in &def.elements {
        out.insert(key.clone());
        collect_property_identifiers(child, out);
    }
}

/// Names a primitive declaration must not take: target scalar builtins and
/// the identifiers the static preamble brings into scope.
fn is_reserved_scalar(name: &str) -> bool {
    matches!(
        name,
        "str"
            | "bool"
            | "int"
            | "float"
            | "bytes"
            | "date"
            | "time"
            | "datetime"
            | "Any"
            | "Union"
            | "Field"
            | "BaseModel"
            | "List_"
            | "Optional_"
            | "Literal_"
            | "Annotated_"
    )
}

/// Reserved words of the target language force a rename; the original wire
/// name survives as the field alias.
fn sanitize_identifier(name: &str) -> (String, Option<String>) {
    if is_python_keyword(name) {
        (format!("{name}_"), Some(name.to_string()))
    } else {
        (name.to_string(), None)
    }
}

fn is_python_keyword(s: &str) -> bool {
    matches!(
        s,
        "False"
            | "None"
            | "True"
            | "and"
            | "as"
            | "assert"
            | "async"
            | "await"
            | "break"
            | "class"
            | "continue"
            | "def"
            | "del"
            | "elif"
            | "else"
            | "except"
            | "finally"
            | "for"
            | "from"
            | "global"
            | "if"
            | "import"
            | "in"
            | "is"
            | "lambda"
            | "nonlocal"
            | "not"
            | "or"
            | "pass"
            | "raise"
            | "return"
            | "try"
            | "while"
            | "with"
            | "yield"
    )
}
