use sirenia_core::diagrams::er::Cardinality;
use sirenia_core::{Direction, parse};
use sirenia_layout::model::{DiagramLayout, ErLayout, Point, PositionedEntity};
use sirenia_layout::{BoxMetrics, LayoutConfig, layout};

fn er_layout_with(src: &str, config: &LayoutConfig) -> ErLayout {
    let parsed = parse(src).expect("parse ok");
    match layout(&parsed, config).expect("layout ok").layout {
        DiagramLayout::Er(l) => l,
        other => panic!("expected er layout, got {other:?}"),
    }
}

fn er_layout(src: &str) -> ErLayout {
    er_layout_with(src, &LayoutConfig::default())
}

fn entity<'a>(layout: &'a ErLayout, id: &str) -> &'a PositionedEntity {
    layout
        .entities
        .iter()
        .find(|e| e.id == id)
        .unwrap_or_else(|| panic!("entity {id} missing"))
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + dx * t, a.y + dy * t))
}

#[test]
fn entities_flow_left_to_right_even_when_configured_otherwise() {
    let config = LayoutConfig {
        direction: Some(Direction::TopDown),
        ..Default::default()
    };
    let layout = er_layout_with("erDiagram\nCUSTOMER ||--o{ ORDER : places", &config);
    let customer = entity(&layout, "CUSTOMER");
    let order = entity(&layout, "ORDER");
    assert!(order.x > customer.x + customer.width);
}

#[test]
fn rank_gap_never_drops_below_the_er_minimum() {
    let config = LayoutConfig {
        rank_spacing: 10.0,
        ..Default::default()
    };
    let layout = er_layout_with("erDiagram\nA ||--|| B : link", &config);
    let a = entity(&layout, "A");
    let b = entity(&layout, "B");
    assert!(b.x - (a.x + a.width) >= 80.0 - 1e-6);
}

#[test]
fn cardinalities_and_identification_are_carried() {
    let layout = er_layout("erDiagram\nCUSTOMER ||--o{ ORDER : places\nORDER }|..|{ LINE : contains");
    let places = layout
        .relationships
        .iter()
        .find(|r| r.label.as_deref() == Some("places"))
        .expect("places");
    assert_eq!((places.entity1.as_str(), places.entity2.as_str()), ("CUSTOMER", "ORDER"));
    assert_eq!(places.cardinality1, Cardinality::One);
    assert_eq!(places.cardinality2, Cardinality::ZeroOrMany);
    assert!(places.identifying);

    let contains = layout
        .relationships
        .iter()
        .find(|r| r.label.as_deref() == Some("contains"))
        .expect("contains");
    assert_eq!(contains.cardinality1, Cardinality::Many);
    assert!(!contains.identifying);
}

#[test]
fn labels_sit_on_the_middle_of_the_route() {
    let layout = er_layout("erDiagram\nCUSTOMER ||--o{ ORDER : places\nCUSTOMER ||--o{ INVOICE : receives");
    for r in &layout.relationships {
        let anchor = r.label_anchor.expect("labelled relationship has an anchor");
        let on_path = r
            .points
            .windows(2)
            .map(|w| distance_to_segment(anchor, w[0], w[1]))
            .fold(f64::INFINITY, f64::min);
        assert!(on_path < 1e-6, "anchor {anchor:?} is off {:?}", r.points);
    }
}

#[test]
fn attribute_columns_fill_the_entity_width() {
    let src = r#"erDiagram
CUSTOMER["Customer"] {
  string name PK
  int address_id FK, UK "links to address"
  varchar(255) note
}
CUSTOMER ||--o{ ORDER : places"#;
    let layout = er_layout(src);
    let c = entity(&layout, "CUSTOMER");
    assert_eq!(c.label, "Customer");
    assert_eq!(c.attributes.len(), 3);
    assert!(c.columns.iter().all(|w| *w > 0.0), "{:?}", c.columns);
    let total: f64 = c.columns.iter().sum();
    assert!((total - c.width).abs() < 1e-6, "{total} vs {}", c.width);
    assert!(c.header_height > 0.0 && c.row_height > 0.0);
    assert!(c.height >= c.header_height + 3.0 * c.row_height - 1e-9);
}

#[test]
fn bare_entities_get_the_minimum_box() {
    let layout = er_layout("erDiagram\nISLAND\nMAINLAND {}\n");
    let m = BoxMetrics::STANDARD;
    for e in &layout.entities {
        assert!(e.width >= m.min_entity_width);
        assert!(e.height >= m.min_entity_height);
        assert_eq!(e.columns, [0.0; 4]);
    }
}

#[test]
fn repeated_pair_keeps_the_last_relationship() {
    let layout = er_layout("erDiagram\nA ||--o{ B : first\nA }|--|{ B : second");
    assert_eq!(layout.relationships.len(), 1);
    let r = &layout.relationships[0];
    assert_eq!(r.label.as_deref(), Some("second"));
    assert_eq!(r.cardinality1, Cardinality::Many);
}

#[test]
fn self_relationship_is_routed() {
    let layout = er_layout("erDiagram\nEMPLOYEE ||--o{ EMPLOYEE : manages");
    let e = entity(&layout, "EMPLOYEE");
    let r = &layout.relationships[0];
    assert!(r.points.len() >= 3);
    assert!(r.points.iter().any(|p| p.x > e.x + e.width || p.y > e.y + e.height));
    assert!(r.label_anchor.is_some());
}
