use crate::diagrams::er::{Cardinality, ErAst, KeyMarker};
use crate::*;

fn er(src: &str) -> (ErAst, Vec<ParseWarning>) {
    let parsed = parse(src).unwrap();
    match parsed.ast {
        DiagramAst::Er(ast) => (ast, parsed.warnings),
        other => panic!("expected er diagram, got {:?}", other.kind()),
    }
}

#[test]
fn one_to_one_relationship_decodes() {
    let (ast, warnings) = er("erDiagram\nA ||--|| B : one-to-one");
    assert!(warnings.is_empty());
    assert_eq!(ast.relationships.len(), 1);
    let r = &ast.relationships[0];
    assert_eq!(r.cardinality1.as_str(), "one");
    assert_eq!(r.cardinality2.as_str(), "one");
    assert_eq!(r.label.as_deref(), Some("one-to-one"));
    assert!(r.identifying);
    let ids: Vec<&str> = ast.entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
}

#[test]
fn cardinality_table_covers_both_sides() {
    let src = "erDiagram
A |o--o| B : a
C }|--|{ D : b
E o{..}o F : c
G }o--o{ H : \"quoted label\"";
    let (ast, warnings) = er(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    let cards: Vec<(Cardinality, Cardinality)> = ast
        .relationships
        .iter()
        .map(|r| (r.cardinality1, r.cardinality2))
        .collect();
    assert_eq!(
        cards,
        vec![
            (Cardinality::ZeroOrOne, Cardinality::ZeroOrOne),
            (Cardinality::Many, Cardinality::Many),
            (Cardinality::ZeroOrMany, Cardinality::ZeroOrMany),
            (Cardinality::ZeroOrMany, Cardinality::ZeroOrMany),
        ]
    );
    assert!(!ast.relationships[2].identifying);
    assert_eq!(ast.relationships[3].label.as_deref(), Some("quoted label"));
}

#[test]
fn entity_blocks_collect_attributes() {
    let src = r#"erDiagram
CUSTOMER["Customer"] {
  string name PK
  int address_id FK, UK "links to address"
  varchar(255) note
}
CUSTOMER ||--o{ ORDER : places"#;
    let (ast, warnings) = er(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    let c = ast.entity("CUSTOMER").unwrap();
    assert_eq!(c.label, "Customer");
    assert_eq!(c.attributes.len(), 3);
    assert_eq!(c.attributes[0].keys, vec![KeyMarker::PrimaryKey]);
    assert_eq!(
        c.attributes[1].keys,
        vec![KeyMarker::ForeignKey, KeyMarker::UniqueKey]
    );
    assert_eq!(c.attributes[1].comment.as_deref(), Some("links to address"));
    assert_eq!(c.attributes[2].attr_type, "varchar(255)");
    assert!(ast.entity("ORDER").is_some());
}

#[test]
fn standalone_entities_are_declared() {
    let (ast, _) = er("erDiagram\nISLAND\nMAINLAND {}\n");
    assert_eq!(ast.entities.len(), 2);
    assert!(ast.relationships.is_empty());
}

#[test]
fn bad_cardinality_is_a_malformed_relationship() {
    let (ast, warnings) = er("erDiagram\nA ||--xx B : nope\nA ||--|{ B : ok");
    assert_eq!(ast.relationships.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::MalformedRelationship);
    assert_eq!(warnings[0].line, 2);
}

#[test]
fn unterminated_entity_block_is_fatal() {
    let err = parse("erDiagram\nBOOK {\nstring title").unwrap_err();
    assert_eq!(
        err,
        Error::UnterminatedBlock {
            kind: "entity BOOK".to_string(),
            line: 2,
        }
    );
}

#[test]
fn cardinality_serializes_kebab_case() {
    let json = serde_json::to_value(Cardinality::ZeroOrMany).unwrap();
    assert_eq!(json, "zero-or-many");
}
