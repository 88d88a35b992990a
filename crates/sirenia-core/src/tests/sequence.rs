use crate::diagrams::sequence::{
    BlockKind, LineStyle, MessageHead, NotePlacement, ParticipantKind, SequenceAst, SequenceEvent,
};
use crate::*;

fn sequence(src: &str) -> (SequenceAst, Vec<ParseWarning>) {
    let parsed = parse(src).unwrap();
    match parsed.ast {
        DiagramAst::Sequence(ast) => (ast, parsed.warnings),
        other => panic!("expected sequence diagram, got {:?}", other.kind()),
    }
}

#[test]
fn participants_keep_declaration_then_first_use_order() {
    let src = "sequenceDiagram\nparticipant B as Bob\nactor A\nA->>B: hi\nC-->>A: late";
    let (ast, warnings) = sequence(src);
    assert!(warnings.is_empty());
    let ids: Vec<&str> = ast.participants.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A", "C"]);
    assert_eq!(ast.participant("B").unwrap().label, "Bob");
    assert_eq!(ast.participant("A").unwrap().kind, ParticipantKind::Actor);
    assert_eq!(ast.participant("C").unwrap().label, "C");
}

#[test]
fn arrow_tokens_map_to_message_kinds() {
    let src = "sequenceDiagram\nA->B: a\nA-->B: b\nA->>B: c\nA-->>B: d\nA-xB: e\nA--xB: f\nA-)B: g\nA--)B: h\nA<<->>B: i\nA<<-->>B: j";
    let (ast, warnings) = sequence(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    let kinds: Vec<(LineStyle, MessageHead)> =
        ast.messages().map(|m| (m.kind.line, m.kind.head)).collect();
    assert_eq!(
        kinds,
        vec![
            (LineStyle::Solid, MessageHead::None),
            (LineStyle::Dotted, MessageHead::None),
            (LineStyle::Solid, MessageHead::Arrow),
            (LineStyle::Dotted, MessageHead::Arrow),
            (LineStyle::Solid, MessageHead::Cross),
            (LineStyle::Dotted, MessageHead::Cross),
            (LineStyle::Solid, MessageHead::Async),
            (LineStyle::Dotted, MessageHead::Async),
            (LineStyle::Solid, MessageHead::Both),
            (LineStyle::Dotted, MessageHead::Both),
        ]
    );
    let texts: Vec<&str> = ast.messages().map(|m| m.text.as_str()).collect();
    assert_eq!(texts.first(), Some(&"a"));
    assert!(ast.messages().all(|m| m.from == "A" && m.to == "B"));
}

#[test]
fn plus_and_minus_markers_push_and_pop_activations() {
    let src = "sequenceDiagram\nAlice->>+John: Hello\nAlice->>+John: Again\nJohn-->>-Alice: Hi\nJohn-->>-Alice: Bye";
    let (ast, _) = sequence(src);
    assert_eq!(ast.activations.len(), 2);
    let outer = &ast.activations[0];
    assert_eq!((outer.participant.as_str(), outer.start, outer.end, outer.depth), ("John", 0, 3, 0));
    let inner = &ast.activations[1];
    assert_eq!((inner.start, inner.end, inner.depth), (1, 2, 1));
}

#[test]
fn activate_lines_span_from_the_previous_event() {
    let src = "sequenceDiagram\nAlice->>John: Hello\nactivate John\nJohn-->>Alice: Great\ndeactivate John";
    let (ast, _) = sequence(src);
    assert_eq!(ast.activations.len(), 1);
    assert_eq!((ast.activations[0].start, ast.activations[0].end), (0, 1));
}

#[test]
fn pop_without_push_is_unbalanced() {
    let err = parse("sequenceDiagram\nA->>B: hi\nB-->>-A: back").unwrap_err();
    assert_eq!(
        err,
        Error::UnbalancedActivation {
            participant: "B".to_string(),
            line: 3,
        }
    );
    let err = parse("sequenceDiagram\nA->>B: hi\ndeactivate A").unwrap_err();
    assert!(matches!(err, Error::UnbalancedActivation { line: 3, .. }));
}

#[test]
fn open_activations_close_at_the_last_event() {
    let (ast, _) = sequence("sequenceDiagram\nA->>+B: one\nB->>C: two\nC->>A: three");
    assert_eq!((ast.activations[0].start, ast.activations[0].end), (0, 2));
}

#[test]
fn blocks_nest_and_record_sections() {
    let src = "sequenceDiagram
loop Every minute
  A->>B: ping
  alt is ok
    B-->>A: pong
  else failure
    B-->>A: error
  end
end
opt extra
  A->>B: more
end";
    let (ast, warnings) = sequence(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(ast.blocks.len(), 3);

    let lp = &ast.blocks[0];
    assert_eq!(lp.kind, BlockKind::Loop);
    assert_eq!(lp.sections[0].label, "Every minute");
    assert_eq!((lp.start, lp.end), (0, 3));
    assert_eq!(lp.children, vec![1]);

    let alt = &ast.blocks[1];
    assert_eq!(alt.kind, BlockKind::Alt);
    assert_eq!(alt.parent, Some(0));
    assert_eq!(alt.depth(&ast.blocks), 1);
    assert_eq!((alt.start, alt.end), (1, 3));
    let sections: Vec<(&str, usize)> = alt
        .sections
        .iter()
        .map(|s| (s.label.as_str(), s.start))
        .collect();
    assert_eq!(sections, vec![("is ok", 1), ("failure", 2)]);

    let opt = &ast.blocks[2];
    assert_eq!(opt.parent, None);
    assert_eq!((opt.start, opt.end), (3, 4));
}

#[test]
fn par_and_critical_sections() {
    let src = "sequenceDiagram\npar first\nA->>B: x\nand second\nA->>C: y\nend\ncritical connect\nA->>B: z\noption timeout\nA->>A: retry\nend";
    let (ast, warnings) = sequence(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(ast.blocks[0].sections.len(), 2);
    assert_eq!(ast.blocks[1].kind, BlockKind::Critical);
    assert_eq!(ast.blocks[1].sections[1].label, "timeout");
}

#[test]
fn else_outside_alt_is_a_warning() {
    let (_, warnings) = sequence("sequenceDiagram\nloop x\nA->>B: y\nelse z\nend");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::UnrecognizedLine);
}

#[test]
fn unterminated_block_is_fatal() {
    let err = parse("sequenceDiagram\nloop forever\nA->>B: hi").unwrap_err();
    assert_eq!(
        err,
        Error::UnterminatedBlock {
            kind: "loop".to_string(),
            line: 2,
        }
    );
}

#[test]
fn notes_are_events() {
    let src = "sequenceDiagram\nA->>B: hi\nNote right of B: thinking\nnote over A,B: shared";
    let (ast, _) = sequence(src);
    assert_eq!(ast.events.len(), 3);
    let SequenceEvent::Note(note) = &ast.events[2] else {
        panic!("expected a note");
    };
    assert_eq!(note.placement, NotePlacement::Over);
    assert_eq!(note.participants, vec!["A", "B"]);
    assert_eq!(note.text, "shared");
}

#[test]
fn autonumber_numbers_following_messages() {
    let src = "sequenceDiagram\nA->>B: before\nautonumber 10 5\nA->>B: one\nB->>A: two\nautonumber off\nA->>B: after";
    let (ast, _) = sequence(src);
    assert!(ast.autonumber);
    let numbers: Vec<Option<usize>> = ast.messages().map(|m| m.number).collect();
    assert_eq!(numbers, vec![None, Some(10), Some(15), None]);
}

#[test]
fn self_messages_and_box_groups() {
    let src = "sequenceDiagram\nbox Aqua Group\nparticipant A\nend\nA->>A: think\ntitle ignored";
    let (ast, warnings) = sequence(src);
    assert!(warnings.is_empty(), "{warnings:?}");
    assert!(ast.blocks.is_empty());
    assert!(ast.messages().next().unwrap().is_self());
}

#[test]
fn malformed_message_is_skipped() {
    let (ast, warnings) = sequence("sequenceDiagram\nA->>: nobody\nA->>B: ok");
    assert_eq!(ast.messages().count(), 1);
    assert_eq!(warnings[0].kind, WarningKind::MalformedEdge);
}
