//! The worked examples from the diagram syntax reference, end to end.

use sirenia::model::DiagramLayout;
use sirenia::{Direction, LayoutConfig, NodeShape, compile};
use sirenia_core::diagrams::er::Cardinality;

fn layout(source: &str) -> DiagramLayout {
    compile(source, &LayoutConfig::default())
        .expect("compiles")
        .layout
}

#[test]
fn chained_flowchart() {
    let DiagramLayout::Flowchart(flow) = layout("graph TD\nA[Start] --> B[Process] --> C[End]") else {
        panic!("expected flowchart layout");
    };
    assert_eq!(flow.direction, Direction::TopDown);
    let ids: Vec<&str> = flow.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert!(flow.nodes.iter().all(|n| n.shape == NodeShape::Rectangle));
    assert_eq!(flow.edges.len(), 2);
}

#[test]
fn one_to_one_relationship() {
    let DiagramLayout::Er(er) = layout("erDiagram\nA ||--|| B : one-to-one") else {
        panic!("expected er layout");
    };
    assert_eq!(er.relationships.len(), 1);
    let r = &er.relationships[0];
    assert_eq!(r.cardinality1, Cardinality::One);
    assert_eq!(r.cardinality2, Cardinality::One);
    assert_eq!(r.label.as_deref(), Some("one-to-one"));
}

#[test]
fn retry_self_loop() {
    let DiagramLayout::Flowchart(flow) = layout("graph TD\nA[Retry Node] --> A") else {
        panic!("expected flowchart layout");
    };
    assert_eq!(flow.edges.len(), 1);
    let e = &flow.edges[0];
    assert_eq!(e.from, e.to);
    let first = e.points[0];
    assert!(e.points.iter().any(|p| p.distance(first) > 1.0));
}

#[test]
fn processing_composite() {
    let src = "stateDiagram-v2\n[*] --> Processing\nstate Processing {\n  parse --> validate\n}\nProcessing --> [*]";
    let DiagramLayout::State(state) = layout(src) else {
        panic!("expected state layout");
    };
    let processing = state.state("Processing").expect("Processing");
    let inner = processing.nested.as_ref().expect("composite body");
    let ids: Vec<&str> = inner.states.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["parse", "validate"]);
    assert_eq!(inner.transitions.len(), 1);
    for s in &inner.states {
        assert!(s.x >= processing.x && s.x + s.width <= processing.x + processing.width);
        assert!(s.y >= processing.y && s.y + s.height <= processing.y + processing.height);
    }
}

#[test]
fn repeated_class_pair_collapses() {
    let DiagramLayout::Class(class) = layout("classDiagram\nA --> B : first\nA ..> B : second") else {
        panic!("expected class layout");
    };
    assert_eq!(class.relationships.len(), 1);
    assert_eq!(class.relationships[0].label.as_deref(), Some("second"));
}
