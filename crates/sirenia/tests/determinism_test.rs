use sirenia::{LayoutConfig, compile};

const SOURCES: &[&str] = &[
    "graph TD\nA[Start] --> B{Decide}\nB -->|yes| C((Done))\nB -->|no| D[Retry]\nD --> B\nsubgraph loop [Retry loop]\n  D\nend",
    "stateDiagram-v2\n[*] --> Idle\nIdle --> Busy : start\nstate Busy {\n  parse --> validate\n}\nBusy --> [*]",
    "sequenceDiagram\nautonumber\nAlice->>+John: Hello\nloop Every minute\n  John-->>Alice: ping\nend\nNote over Alice,John: shared\nJohn-->>-Alice: Bye",
    "classDiagram\nAnimal <|-- Dog\nAnimal <|-- Cat\nclass Animal {\n  +int age\n  +isMammal() bool\n}\nDog --> Bone : chews",
    "erDiagram\nCUSTOMER ||--o{ ORDER : places\nORDER ||--|{ LINE-ITEM : contains\nCUSTOMER {\n  string name PK\n}",
];

fn json(source: &str) -> String {
    let diagram = compile(source, &LayoutConfig::default()).expect("compiles");
    serde_json::to_string(&diagram).expect("serializes")
}

#[test]
fn same_input_gives_byte_identical_output() {
    for source in SOURCES {
        assert_eq!(json(source), json(source), "non-deterministic for {source:?}");
    }
}

#[test]
fn threads_agree_with_each_other() {
    let expected: Vec<String> = SOURCES.iter().map(|s| json(s)).collect();
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| SOURCES.iter().map(|s| json(s)).collect::<Vec<_>>()))
        .collect();
    for h in handles {
        assert_eq!(h.join().expect("thread finished"), expected);
    }
}

#[test]
fn output_is_tagged_by_diagram_type() {
    let kinds: Vec<String> = SOURCES
        .iter()
        .map(|s| {
            let value: serde_json::Value = serde_json::from_str(&json(s)).expect("json");
            value["layout"]["type"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(kinds, vec!["flowchart", "state", "sequence", "class", "er"]);
}
