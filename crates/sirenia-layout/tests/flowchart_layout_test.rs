use sirenia_core::diagrams::flowchart::EdgeStroke;
use sirenia_core::{Direction, ShapeBoundary, parse};
use sirenia_layout::model::{DiagramLayout, FlowchartLayout, Point, PositionedNode};
use sirenia_layout::postprocess::{AXIS_TOLERANCE, ShapeBox};
use sirenia_layout::{Error, LayoutConfig, layout};

fn flowchart_with(src: &str, config: &LayoutConfig) -> (FlowchartLayout, f64, f64) {
    let parsed = parse(src).expect("parse ok");
    let out = layout(&parsed, config).expect("layout ok");
    match out.layout {
        DiagramLayout::Flowchart(l) => (l, out.width, out.height),
        other => panic!("expected flowchart layout, got {other:?}"),
    }
}

fn flowchart(src: &str) -> (FlowchartLayout, f64, f64) {
    flowchart_with(src, &LayoutConfig::default())
}

fn node<'a>(layout: &'a FlowchartLayout, id: &str) -> &'a PositionedNode {
    layout
        .nodes
        .iter()
        .find(|n| n.id == id)
        .unwrap_or_else(|| panic!("node {id} missing"))
}

fn shape(n: &PositionedNode) -> ShapeBox {
    ShapeBox::new(n.center(), n.width, n.height, n.shape.boundary())
}

fn axis_aligned(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= AXIS_TOLERANCE || (a.y - b.y).abs() <= AXIS_TOLERANCE
}

/// Every edge starts and ends on the outline of its nodes; segments between bends are straight.
fn assert_routes_are_clean(layout: &FlowchartLayout) {
    for e in &layout.edges {
        assert!(e.points.len() >= 2, "{} -> {} has no segments", e.from, e.to);
        for p in &e.points {
            assert!(p.x.is_finite() && p.y.is_finite());
        }
        let from = node(layout, &e.from);
        let to = node(layout, &e.to);
        let first = e.points[0];
        let last = e.points[e.points.len() - 1];
        let d0 = shape(from).boundary_distance(first);
        let d1 = shape(to).boundary_distance(last);
        assert!(d0 <= 1.0, "{} -> {} starts {d0} off the outline", e.from, e.to);
        assert!(d1 <= 1.0, "{} -> {} ends {d1} off the outline", e.from, e.to);

        let n = e.points.len();
        let rectangular = from.shape.boundary() == ShapeBoundary::Rectangle
            && to.shape.boundary() == ShapeBoundary::Rectangle;
        let range = if rectangular { 0..n - 1 } else { 1..n.saturating_sub(2) };
        for i in range {
            assert!(
                axis_aligned(e.points[i], e.points[i + 1]),
                "{} -> {} segment {i} is diagonal: {:?}",
                e.from,
                e.to,
                e.points
            );
        }
    }
}

#[test]
fn top_down_chain_stacks_ranks() {
    let (layout, _, _) = flowchart("graph TD\nA[Start] --> B[Process] --> C[End]");
    assert_eq!(layout.direction, Direction::TopDown);
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.edges.len(), 2);

    let (a, b, c) = (node(&layout, "A"), node(&layout, "B"), node(&layout, "C"));
    assert!(b.center().y > a.center().y, "B should be below A");
    assert!(c.center().y > b.center().y, "C should be below B");
    assert!(b.y >= a.y + a.height, "ranks should not overlap");
    assert_routes_are_clean(&layout);
}

#[test]
fn left_right_chain_runs_horizontally() {
    let (layout, _, _) = flowchart("flowchart LR\nA --> B --> C");
    let (a, b, c) = (node(&layout, "A"), node(&layout, "B"), node(&layout, "C"));
    assert!(b.center().x > a.center().x);
    assert!(c.center().x > b.center().x);
    assert_routes_are_clean(&layout);
}

#[test]
fn configured_direction_overrides_the_header() {
    let config = LayoutConfig {
        direction: Some(Direction::LeftRight),
        ..Default::default()
    };
    let (layout, _, _) = flowchart_with("graph TD\nA --> B", &config);
    assert_eq!(layout.direction, Direction::LeftRight);
    assert!(node(&layout, "B").center().x > node(&layout, "A").center().x);
}

#[test]
fn diamond_and_circle_ends_sit_on_their_outlines() {
    let (layout, _, _) =
        flowchart("graph TD\nA{Decide} -->|yes| B((Done))\nA -->|no| C[Retry]\nC --> A");
    assert_routes_are_clean(&layout);
    let a = node(&layout, "A");
    let b = node(&layout, "B");
    let ab = layout.edges.iter().find(|e| e.to == "B").expect("A -> B");
    let start = ab.points[0];
    let end = ab.points[ab.points.len() - 1];
    let (hw, hh) = (a.width / 2.0, a.height / 2.0);
    let c = a.center();
    let level = (start.x - c.x).abs() / hw + (start.y - c.y).abs() / hh;
    assert!((level - 1.0).abs() < 1e-6, "start not on the diamond: {level}");
    let r = b.width.min(b.height) / 2.0;
    assert!((end.distance(b.center()) - r).abs() < 1e-6);
}

#[test]
fn every_shape_gets_a_box_that_fits_its_label() {
    let (layout, _, _) = flowchart(
        "flowchart LR\na[rect] --> b(round) --> c([stadium]) --> d((circle))\nd --> e{diamond} --> f{{hex}} --> g[(db)] --> h[[sub]]",
    );
    for n in &layout.nodes {
        assert!(n.width > 0.0 && n.height > 0.0, "{} is empty", n.id);
    }
    let d = node(&layout, "d");
    assert!((d.width - d.height).abs() < 1e-9, "circles are square");
    let a = node(&layout, "a");
    let e = node(&layout, "e");
    assert!(e.width > a.width, "diamonds need more room than rectangles");
    assert_routes_are_clean(&layout);
}

#[test]
fn repeated_pair_keeps_one_edge_with_the_last_payload() {
    let (layout, _, _) = flowchart("graph TD\nA -->|first| B\nA -.->|second| B");
    assert_eq!(layout.edges.len(), 1);
    let e = &layout.edges[0];
    assert_eq!(e.label.as_deref(), Some("second"));
    assert_eq!(e.stroke, EdgeStroke::Dotted);
}

#[test]
fn labelled_edges_get_anchors_and_plain_edges_do_not() {
    let (layout, _, _) = flowchart("graph TD\nA -->|go| B\nB --> C");
    let ab = layout.edges.iter().find(|e| e.from == "A").expect("A -> B");
    let bc = layout.edges.iter().find(|e| e.from == "B").expect("B -> C");
    let anchor = ab.label_anchor.expect("labelled edge has an anchor");
    let a = node(&layout, "A");
    let b = node(&layout, "B");
    assert!(anchor.y > a.y && anchor.y < b.y + b.height);
    assert_eq!(bc.label_anchor, None);
}

#[test]
fn self_loop_leaves_and_returns_to_the_same_node() {
    let (layout, _, _) = flowchart("graph TD\nA --> A");
    assert_eq!(layout.edges.len(), 1);
    let e = &layout.edges[0];
    assert!(e.points.len() >= 3, "{:?}", e.points);
    assert_routes_are_clean(&layout);
    let a = node(&layout, "A");
    assert!(e.points.iter().any(|p| p.x > a.x + a.width));
}

#[test]
fn clusters_enclose_their_members() {
    let src = "graph TD\nX --> A\nsubgraph outer [Outer box]\n  A --> B\n  subgraph inner\n    C\n  end\nend\nB --> C\nsubgraph empty\nend";
    let (layout, width, height) = flowchart(src);
    let outer = layout.clusters.iter().find(|c| c.id == "outer").expect("outer");
    let inner = layout.clusters.iter().find(|c| c.id == "inner").expect("inner");
    assert_eq!(outer.title.as_deref(), Some("Outer box"));
    assert_eq!(inner.parent.as_deref(), Some("outer"));
    assert_eq!((outer.depth, inner.depth), (0, 1));
    assert!(
        layout.clusters.iter().all(|c| c.id != "empty"),
        "empty subgraphs are not drawn"
    );

    let contains = |c: &sirenia_layout::model::PositionedCluster, x: f64, y: f64, w: f64, h: f64| {
        c.x <= x && c.y <= y && x + w <= c.x + c.width && y + h <= c.y + c.height
    };
    for id in ["A", "B", "C"] {
        let n = node(&layout, id);
        assert!(contains(outer, n.x, n.y, n.width, n.height), "{id} outside outer");
    }
    let c = node(&layout, "C");
    assert!(contains(inner, c.x, c.y, c.width, c.height));
    assert!(contains(outer, inner.x, inner.y, inner.width, inner.height));
    let x = node(&layout, "X");
    assert!(!contains(outer, x.x, x.y, x.width, x.height));

    for cl in &layout.clusters {
        assert!(cl.x >= 0.0 && cl.y >= 0.0);
        assert!(cl.x + cl.width <= width + 1e-9 && cl.y + cl.height <= height + 1e-9);
    }
}

#[test]
fn edges_to_a_subgraph_anchor_on_its_first_node() {
    let (layout, _, _) = flowchart("graph LR\nsubgraph one\n  a1 --> a2\nend\nsubgraph two\n  b1\nend\none --> two");
    let e = layout
        .edges
        .iter()
        .find(|e| e.from_cluster.is_some())
        .expect("cluster edge");
    assert_eq!(e.from_cluster.as_deref(), Some("one"));
    assert_eq!(e.to_cluster.as_deref(), Some("two"));
    assert_eq!((e.from.as_str(), e.to.as_str()), ("a1", "b1"));
}

#[test]
fn everything_fits_inside_the_padded_canvas() {
    let config = LayoutConfig::default();
    let (layout, width, height) = flowchart("graph TD\nA --> B\nA --> C\nB --> D\nC --> D");
    for n in &layout.nodes {
        assert!(n.x >= config.diagram_padding - 1e-9);
        assert!(n.y >= config.diagram_padding - 1e-9);
        assert!(n.x + n.width <= width + 1e-9);
        assert!(n.y + n.height <= height + 1e-9);
    }
    for e in &layout.edges {
        for p in &e.points {
            assert!(p.x >= 0.0 && p.x <= width && p.y >= 0.0 && p.y <= height);
        }
    }
}

#[test]
fn invalid_spacing_is_rejected_before_layout() {
    let parsed = parse("graph TD\nA --> B").expect("parse ok");
    let config = LayoutConfig {
        node_spacing: -5.0,
        ..Default::default()
    };
    let err = layout(&parsed, &config).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidConfig {
            field: "nodeSpacing",
            ..
        }
    ));
}

#[test]
fn empty_flowchart_is_just_padding() {
    let config = LayoutConfig::default();
    let (layout, width, height) = flowchart("graph TD");
    assert!(layout.nodes.is_empty() && layout.edges.is_empty());
    assert_eq!(width, 2.0 * config.diagram_padding);
    assert_eq!(height, 2.0 * config.diagram_padding);
}
