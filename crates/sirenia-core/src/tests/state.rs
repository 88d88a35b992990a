use crate::diagrams::state::{StateAst, StateKind};
use crate::*;

fn state(src: &str) -> (StateAst, Vec<ParseWarning>) {
    let parsed = parse(src).unwrap();
    match parsed.ast {
        DiagramAst::State(ast) => (ast, parsed.warnings),
        other => panic!("expected state diagram, got {:?}", other.kind()),
    }
}

fn ids(states: &[crate::diagrams::state::StateNode]) -> Vec<&str> {
    states.iter().map(|s| s.id.as_str()).collect()
}

#[test]
fn composite_state_holds_its_own_region() {
    let src = "stateDiagram-v2\n[*] --> Processing\nstate Processing {\n  parse --> validate\n}\nProcessing --> [*]";
    let (ast, warnings) = state(src);
    assert!(warnings.is_empty());
    assert_eq!(ids(&ast.root().states), vec!["root_start", "Processing", "root_end"]);
    assert_eq!(ast.root().transitions.len(), 2);

    let processing = ast.state("Processing").unwrap();
    assert_eq!(processing.kind, StateKind::Composite);
    let nested = ast.region(processing.region.unwrap()).unwrap();
    assert_eq!(nested.owner.as_deref(), Some("Processing"));
    assert_eq!(ids(&nested.states), vec!["parse", "validate"]);
    assert_eq!(nested.transitions.len(), 1);
    assert_eq!(ast.root().children, vec![processing.region.unwrap()]);
}

#[test]
fn single_line_composite_body() {
    let (ast, _) = state("stateDiagram-v2\nstate Processing { parse --> validate }");
    let nested = ast.nested("Processing").unwrap();
    assert_eq!(ids(&nested.states), vec!["parse", "validate"]);
    assert_eq!(nested.transitions[0].from, "parse");
}

#[test]
fn pseudo_states_are_scoped_to_their_region() {
    let src = "stateDiagram-v2\nstate Outer {\n  [*] --> Inner\n  Inner --> [*]\n}";
    let (ast, _) = state(src);
    let nested = ast.nested("Outer").unwrap();
    assert_eq!(ids(&nested.states), vec!["Outer_start", "Inner", "Outer_end"]);
    assert_eq!(nested.states[0].kind, StateKind::Start);
    assert_eq!(nested.states[2].kind, StateKind::End);
    assert_eq!(nested.states[0].label, "");
}

#[test]
fn descriptions_aliases_and_stereotypes() {
    let src = r#"stateDiagram-v2
state "Waiting for input" as Idle
Busy : Working hard
Busy : second line
state fork1 <<fork>>
state pick <<choice>>
Idle --> Busy : start"#;
    let (ast, warnings) = state(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(ast.state("Idle").unwrap().label, "Waiting for input");
    let busy = ast.state("Busy").unwrap();
    assert_eq!(busy.label, "Working hard");
    assert_eq!(busy.descriptions, vec!["second line"]);
    assert_eq!(ast.state("fork1").unwrap().kind, StateKind::Fork);
    assert_eq!(ast.state("pick").unwrap().kind, StateKind::Choice);
    assert_eq!(ast.root().transitions[0].label.as_deref(), Some("start"));
}

#[test]
fn direction_is_inherited_by_new_composites() {
    let (ast, _) = state("stateDiagram-v2\ndirection LR\nstate A {\n  x --> y\n}");
    assert_eq!(ast.root().direction, Direction::LeftRight);
    assert_eq!(ast.nested("A").unwrap().direction, Direction::LeftRight);
}

#[test]
fn notes_are_skipped() {
    let src = "stateDiagram-v2\nA --> B\nnote right of A\n  some text\nend note\nnote left of B : inline";
    let (ast, warnings) = state(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(ast.root().states.len(), 2);
}

#[test]
fn reference_across_regions_is_unresolved() {
    let err = parse("stateDiagram-v2\nA --> B\nstate C {\n  A --> D\n}").unwrap_err();
    assert_eq!(
        err,
        Error::UnresolvedReference {
            id: "A".to_string(),
            line: 4,
        }
    );
}

#[test]
fn unterminated_composite_is_fatal() {
    let err = parse("stateDiagram-v2\nstate X {\nA --> B").unwrap_err();
    assert_eq!(
        err,
        Error::UnterminatedBlock {
            kind: "state X".to_string(),
            line: 2,
        }
    );
}

#[test]
fn unterminated_note_is_fatal() {
    let err = parse("stateDiagram-v2\nnote over A\ntext").unwrap_err();
    assert!(matches!(err, Error::UnterminatedBlock { line: 2, .. }));
}

#[test]
fn concurrency_separator_is_reported() {
    let (_, warnings) = state("stateDiagram-v2\nstate A {\n  x --> y\n  --\n  p --> q\n}");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::UnsupportedDirective);
}
