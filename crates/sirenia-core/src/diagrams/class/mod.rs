//! Class diagram syntax tree.

mod parse;

pub use parse::parse_class;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAst {
    /// Classes in order of first appearance (declaration or relationship endpoint).
    pub classes: Vec<ClassNode>,
    pub relationships: Vec<Relationship>,
}

impl ClassAst {
    pub fn class(&self, id: &str) -> Option<&ClassNode> {
        self.classes.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassNode {
    pub id: String,
    /// Display name: an explicit `["Label"]`, otherwise the id with generics as `Id<T>`.
    pub label: String,
    pub generic: Option<String>,
    /// Stereotypes such as `interface`, without the `<<` `>>` brackets.
    pub annotations: Vec<String>,
    pub attributes: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub css_classes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Package,
}

impl Visibility {
    pub fn from_marker(c: char) -> Option<Self> {
        Some(match c {
            '+' => Visibility::Public,
            '-' => Visibility::Private,
            '#' => Visibility::Protected,
            '~' => Visibility::Package,
            _ => return None,
        })
    }

    pub fn marker(self) -> char {
        match self {
            Visibility::Public => '+',
            Visibility::Private => '-',
            Visibility::Protected => '#',
            Visibility::Package => '~',
        }
    }
}

/// `$` (static, underlined) or `*` (abstract, italic) suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Classifier {
    Static,
    Abstract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKind {
    Attribute,
    Method,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMember {
    pub kind: MemberKind,
    pub visibility: Option<Visibility>,
    pub name: String,
    /// Raw parameter list of a method; empty for attributes.
    pub parameters: String,
    /// Attribute type or method return type.
    pub member_type: Option<String>,
    pub classifier: Option<Classifier>,
    /// Row text as it is drawn, generics expanded.
    pub display_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// `<|--`
    Inheritance,
    /// `*--`
    Composition,
    /// `o--`
    Aggregation,
    /// `-->`
    Association,
    /// `..>`
    Dependency,
    /// `..|>`
    Realization,
}

impl RelationKind {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "<|--" => RelationKind::Inheritance,
            "*--" => RelationKind::Composition,
            "o--" => RelationKind::Aggregation,
            "-->" => RelationKind::Association,
            "..>" => RelationKind::Dependency,
            "..|>" => RelationKind::Realization,
            _ => return None,
        })
    }

    /// Whether the marker is drawn at the `from` end (`<|--`, `*--`, `o--`) rather than `to`.
    pub fn marker_at_source(self) -> bool {
        matches!(
            self,
            RelationKind::Inheritance | RelationKind::Composition | RelationKind::Aggregation
        )
    }

    pub fn is_dashed(self) -> bool {
        matches!(self, RelationKind::Dependency | RelationKind::Realization)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
    pub label: Option<String>,
    pub from_cardinality: Option<String>,
    pub to_cardinality: Option<String>,
    pub line: usize,
}
