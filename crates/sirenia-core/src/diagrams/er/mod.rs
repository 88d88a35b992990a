//! Entity-relationship diagram syntax tree.

mod parse;

pub use parse::parse_er;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErAst {
    /// Entities in order of first appearance.
    pub entities: Vec<Entity>,
    pub relationships: Vec<ErRelationship>,
}

impl ErAst {
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub attributes: Vec<EntityAttribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyMarker {
    #[serde(rename = "PK")]
    PrimaryKey,
    #[serde(rename = "FK")]
    ForeignKey,
    #[serde(rename = "UK")]
    UniqueKey,
}

impl KeyMarker {
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token.trim() {
            "PK" => KeyMarker::PrimaryKey,
            "FK" => KeyMarker::ForeignKey,
            "UK" => KeyMarker::UniqueKey,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyMarker::PrimaryKey => "PK",
            KeyMarker::ForeignKey => "FK",
            KeyMarker::UniqueKey => "UK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAttribute {
    pub attr_type: String,
    pub name: String,
    /// Distinct markers in source order.
    pub keys: Vec<KeyMarker>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    One,
    ZeroOrOne,
    Many,
    ZeroOrMany,
}

impl Cardinality {
    /// Decodes one crow's-foot token; the table is the same for either side of the line.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "||" => Cardinality::One,
            "|o" | "o|" => Cardinality::ZeroOrOne,
            "}|" | "|{" => Cardinality::Many,
            "o{" | "{o" | "}o" | "o}" => Cardinality::ZeroOrMany,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::One => "one",
            Cardinality::ZeroOrOne => "zero-or-one",
            Cardinality::Many => "many",
            Cardinality::ZeroOrMany => "zero-or-many",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErRelationship {
    pub entity1: String,
    pub entity2: String,
    /// Cardinality at the `entity1` end.
    pub cardinality1: Cardinality,
    /// Cardinality at the `entity2` end.
    pub cardinality2: Cardinality,
    pub label: Option<String>,
    /// `--` (identifying) versus `..` (non-identifying).
    pub identifying: bool,
    pub line: usize,
}
