//! Python code generator
//!
//! Renders a declaration sequence as Python typed data models over a
//! configurable base model class. Type references inside record annotations
//! are emitted as string forward references and resolved by the
//! `update_forward_refs()` directives trailing the declarations.

use crate::decl::{AliasDecl, Declaration, DefaultValue, Field, RecordDecl, TypeExpr, UnionDecl};
use crate::generators::{Generator, GeneratorConfig};
use anyhow::{anyhow, Result};

/// Python source generator
pub struct PythonGenerator {
    config: GeneratorConfig,
}

impl PythonGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn new_default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl Generator for PythonGenerator {
    type Output = String;

    fn generate(&self, declarations: &[Declaration]) -> Result<Self::Output> {
        let rendered: Vec<String> = declarations
            .iter()
            .map(|d| self.render_declaration(d))
            .collect();
        Ok(format!("{}\n", rendered.join("\n\n\n")))
    }
}

/// Fixed static header prepended to every generated artifact.
///
/// Parameterized only by the import path of the base model class.
pub fn preamble(base_model: &str) -> Result<String> {
    let (module, base_class) = base_model
        .rsplit_once('.')
        .ok_or_else(|| anyhow!("base model must be a dotted Python path: {base_model}"))?;

    Ok(format!(
        "from typing import Any, Annotated as Annotated_, List as List_, Literal as Literal_, \
         Optional as Optional_, Union\n\
         from datetime import date, datetime, time\n\
         from pydantic import Field\n\
         from {module} import {base_class} as BaseModel\n\n\n"
    ))
}

impl PythonGenerator {
    fn render_declaration(&self, declaration: &Declaration) -> String {
        match declaration {
            Declaration::Record(record) => self.render_record(record),
            Declaration::Alias(alias) => self.render_alias(alias),
            Declaration::Union(union) => render_union(union),
            Declaration::ForwardRefs { name } => format!("{name}.update_forward_refs()"),
        }
    }

    fn render_record(&self, record: &RecordDecl) -> String {
        let mut lines = vec![format!("class {}({}):", record.name, record.base)];

        if self.config.generate_docs && !record.docstring.is_empty() {
            lines.push(format!("    \"\"\"{}\"\"\"", escape(&record.docstring)));
        }

        for field in &record.fields {
            lines.push(format!("    {}", render_field(field)));
            if self.config.generate_docs && !field.docstring.is_empty() {
                lines.push(format!("    \"\"\"{}\"\"\"", escape(&field.docstring)));
            }
        }

        if lines.len() == 1 {
            lines.push("    pass".to_string());
        }

        lines.join("\n")
    }

    fn render_alias(&self, alias: &AliasDecl) -> String {
        // Alias targets must be real values at definition time, never
        // forward references.
        let mut out = format!("{} = {}", alias.name, render_type(&alias.ty, false));
        if self.config.generate_docs && !alias.docstring.is_empty() {
            out.push_str(&format!("\n\"\"\"{}\"\"\"", escape(&alias.docstring)));
        }
        out
    }
}

fn render_union(union: &UnionDecl) -> String {
    let members: Vec<String> = union
        .members
        .iter()
        .map(|m| format!("\"{m}\""))
        .collect();
    let inner = format!("Union[{}]", members.join(", "));

    match &union.discriminant {
        Some(tag) => format!(
            "{} = Annotated_[{}, Field(discriminator=\"{}\")]",
            union.name, inner, tag
        ),
        None => format!("{} = {}", union.name, inner),
    }
}

fn render_field(field: &Field) -> String {
    let annotation = render_type(&field.ty, true);
    let default = field.default.as_ref().map(render_default);

    match (&field.alias, default) {
        (Some(alias), default) => {
            let default = default.unwrap_or_else(|| "...".to_string());
            format!(
                "{}: {} = Field({}, alias=\"{}\")",
                field.name, annotation, default, alias
            )
        }
        (None, Some(default)) => format!("{}: {} = {}", field.name, annotation, default),
        (None, None) => format!("{}: {}", field.name, annotation),
    }
}

fn render_default(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Absent => "None".to_string(),
        DefaultValue::EmptyList => "[]".to_string(),
        DefaultValue::Literal(value) => format!("\"{}\"", escape(value)),
    }
}

/// Render a type expression. Names inside record annotations are quoted so
/// sibling declarations can reference each other regardless of order; alias
/// targets render unquoted.
fn render_type(ty: &TypeExpr, quote_names: bool) -> String {
    match ty {
        TypeExpr::Name(name) if quote_names => format!("\"{name}\""),
        TypeExpr::Name(name) => name.clone(),
        TypeExpr::Literal(value) => format!("Literal_[\"{}\"]", escape(value)),
        TypeExpr::List(inner) => format!("List_[{}]", render_type(inner, quote_names)),
        TypeExpr::Optional(inner) => format!("Optional_[{}]", render_type(inner, quote_names)),
        TypeExpr::Union(members) => {
            let members: Vec<String> = members
                .iter()
                .map(|m| render_type(m, quote_names))
                .collect();
            format!("Union[{}]", members.join(", "))
        }
        // Target-definition constraints are informational; the reference
        // type itself is what the target type system checks.
        TypeExpr::Parameterized { base, .. } if quote_names => format!("\"{base}\""),
        TypeExpr::Parameterized { base, .. } => base.clone(),
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
