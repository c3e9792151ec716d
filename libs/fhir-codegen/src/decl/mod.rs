//! Declaration syntax tree
//!
//! The printable output of lowering: named records, type aliases, tagged
//! unions and post-processing directives. Not tied to any concrete target
//! language; a generator turns a declaration sequence into source text.

/// A type annotation expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A by-name reference to a declaration or a target primitive
    Name(String),
    /// A fixed literal string value
    Literal(String),
    /// A list of the inner type
    List(Box<TypeExpr>),
    /// An optional of the inner type
    Optional(Box<TypeExpr>),
    /// A disjunction of alternatives
    Union(Vec<TypeExpr>),
    /// A named type constrained to a set of target definitions
    Parameterized {
        base: String,
        args: Vec<TypeExpr>,
    },
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> TypeExpr {
        TypeExpr::Name(name.into())
    }

    pub fn list(inner: TypeExpr) -> TypeExpr {
        TypeExpr::List(Box::new(inner))
    }

    pub fn optional(inner: TypeExpr) -> TypeExpr {
        TypeExpr::Optional(Box::new(inner))
    }
}

/// Synthesized field default, chosen so deserialization round-trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// The "no value" marker of the target language
    Absent,
    /// An empty sequence
    EmptyList,
    /// The literal value itself (literal-typed fields only)
    Literal(String),
}

/// One field of a record declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Final emitted identifier
    pub name: String,
    /// Original wire name, present when it differs from the identifier
    pub alias: Option<String>,
    pub ty: TypeExpr,
    /// None = the field must be explicitly supplied
    pub default: Option<DefaultValue>,
    pub docstring: String,
}

/// A named record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecl {
    pub name: String,
    /// The record construct this declaration extends
    pub base: String,
    pub docstring: String,
    pub fields: Vec<Field>,
}

/// A named type alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDecl {
    pub name: String,
    pub docstring: String,
    pub ty: TypeExpr,
}

/// A named union over record declarations, optionally tagged by a
/// discriminator field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDecl {
    pub name: String,
    pub members: Vec<String>,
    pub discriminant: Option<String>,
}

/// One node of the printable output sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Record(RecordDecl),
    Alias(AliasDecl),
    Union(UnionDecl),
    /// Post-processing directive: resolve forward references for a declared name
    ForwardRefs { name: String },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Record(r) => &r.name,
            Declaration::Alias(a) => &a.name,
            Declaration::Union(u) => &u.name,
            Declaration::ForwardRefs { name } => name,
        }
    }

    /// Post-processing directives sort after all true declarations.
    pub fn is_directive(&self) -> bool {
        matches!(self, Declaration::ForwardRefs { .. })
    }
}

/// Stable sort putting post-processing directives after true declarations.
pub fn sort_declarations(declarations: &mut [Declaration]) {
    declarations.sort_by_key(|d| d.is_directive());
}
