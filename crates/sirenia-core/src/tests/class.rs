use crate::diagrams::class::{ClassAst, Classifier, RelationKind, Visibility};
use crate::*;

fn class_diagram(src: &str) -> (ClassAst, Vec<ParseWarning>) {
    let parsed = parse(src).unwrap();
    match parsed.ast {
        DiagramAst::Class(ast) => (ast, parsed.warnings),
        other => panic!("expected class diagram, got {:?}", other.kind()),
    }
}

#[test]
fn class_body_splits_attributes_and_methods() {
    let src = r#"classDiagram
class BankAccount {
  <<entity>>
  +String owner
  -balance : BigDecimal
  +deposit(amount) bool
  +withdrawal(amount)$ int
}"#;
    let (ast, warnings) = class_diagram(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    let c = ast.class("BankAccount").unwrap();
    assert_eq!(c.annotations, vec!["entity"]);
    let attrs: Vec<&str> = c.attributes.iter().map(|m| m.display_text.as_str()).collect();
    assert_eq!(attrs, vec!["+String owner", "-balance : BigDecimal"]);
    assert_eq!(c.attributes[1].visibility, Some(Visibility::Private));
    assert_eq!(c.methods.len(), 2);
    assert_eq!(c.methods[0].display_text, "+deposit(amount) : bool");
    assert_eq!(c.methods[1].classifier, Some(Classifier::Static));
}

#[test]
fn all_six_relationship_tokens() {
    let src = "classDiagram\nA <|-- B\nC *-- D\nE o-- F\nG --> H\nI ..> J\nK ..|> L";
    let (ast, warnings) = class_diagram(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    let kinds: Vec<RelationKind> = ast.relationships.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RelationKind::Inheritance,
            RelationKind::Composition,
            RelationKind::Aggregation,
            RelationKind::Association,
            RelationKind::Dependency,
            RelationKind::Realization,
        ]
    );
    assert_eq!(ast.classes.len(), 12);
    assert!(ast.relationships[0].kind.marker_at_source());
    assert!(ast.relationships[5].kind.is_dashed());
}

#[test]
fn cardinality_and_label() {
    let (ast, _) = class_diagram("classDiagram\nCustomer \"1\" --> \"*\" Ticket : buys");
    let r = &ast.relationships[0];
    assert_eq!((r.from.as_str(), r.to.as_str()), ("Customer", "Ticket"));
    assert_eq!(r.from_cardinality.as_deref(), Some("1"));
    assert_eq!(r.to_cardinality.as_deref(), Some("*"));
    assert_eq!(r.label.as_deref(), Some("buys"));
}

#[test]
fn unknown_relationship_tokens_are_skipped() {
    let (ast, warnings) = class_diagram("classDiagram\nA -- B\nA --|> B\nA --> B");
    assert_eq!(ast.relationships.len(), 1);
    assert_eq!(warnings.len(), 2);
    assert!(
        warnings
            .iter()
            .all(|w| w.kind == WarningKind::MalformedRelationship)
    );
}

#[test]
fn generics_labels_and_css_suffix() {
    let src = "classDiagram\nclass Square~Shape~\nclass Named[\"Display name\"]\nclass Hot:::warm\nSquare~Shape~ <|-- Named";
    let (ast, _) = class_diagram(src);
    let square = ast.class("Square").unwrap();
    assert_eq!(square.generic.as_deref(), Some("Shape"));
    assert_eq!(square.label, "Square<Shape>");
    assert_eq!(ast.class("Named").unwrap().label, "Display name");
    assert_eq!(ast.class("Hot").unwrap().css_classes, vec!["warm"]);
    assert_eq!(ast.relationships[0].from, "Square");
    assert_eq!(ast.classes.len(), 3);
}

#[test]
fn members_and_annotations_outside_bodies() {
    let src = "classDiagram\nclass Animal\n<<interface>> Animal\nAnimal : +int age\nAnimal : +isMammal()\nAnimal : +mate()*";
    let (ast, _) = class_diagram(src);
    let animal = ast.class("Animal").unwrap();
    assert_eq!(animal.annotations, vec!["interface"]);
    assert_eq!(animal.attributes.len(), 1);
    assert_eq!(animal.methods.len(), 2);
    assert_eq!(animal.methods[1].classifier, Some(Classifier::Abstract));
}

#[test]
fn namespaces_wrap_declarations() {
    let src = "classDiagram\nnamespace Shapes {\n  class Circle\n  class Square {\n    +side int\n  }\n}\nCircle --> Square";
    let (ast, warnings) = class_diagram(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(ast.classes.len(), 2);
    assert_eq!(ast.class("Square").unwrap().attributes.len(), 1);
}

#[test]
fn duplicate_pairs_are_all_kept_in_the_ast() {
    let (ast, _) = class_diagram("classDiagram\nA --> B : first\nA ..> B : second");
    assert_eq!(ast.relationships.len(), 2);
}

#[test]
fn unterminated_class_body_is_fatal() {
    let err = parse("classDiagram\nclass Foo {\n+bar()").unwrap_err();
    assert_eq!(
        err,
        Error::UnterminatedBlock {
            kind: "class Foo".to_string(),
            line: 2,
        }
    );
}
