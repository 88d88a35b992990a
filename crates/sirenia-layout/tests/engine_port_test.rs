//! The post-processor must cope with whatever a layout engine hands back.

use sirenia_core::parse;
use sirenia_layout::engine::{EngineEdge, EngineOutput, LayoutGraph};
use sirenia_layout::model::{DiagramLayout, FlowchartLayout, Point};
use sirenia_layout::postprocess::ShapeBox;
use sirenia_layout::text::{TextMeasurer, TextMetrics, TextStyle};
use sirenia_layout::{
    BoxMetrics, Error, LayoutConfig, LayoutEngine, LayoutEngineError, LayoutOptions, layout_with,
};
use std::sync::Arc;

/// Puts node `i` at `(100 + 150i, 100 + 120i)` and draws every edge as one diagonal line
/// between centers.
struct DiagonalEngine;

impl LayoutEngine for DiagonalEngine {
    fn run(&self, graph: &LayoutGraph) -> Result<EngineOutput, LayoutEngineError> {
        let mut out = EngineOutput::default();
        for (i, id) in graph.nodes().enumerate() {
            let i = i as f64;
            out.nodes
                .insert(id.to_string(), Point::new(100.0 + 150.0 * i, 100.0 + 120.0 * i));
        }
        for (key, _) in graph.edge_entries() {
            let v = out.nodes[key.v.as_str()];
            let w = out.nodes[key.w.as_str()];
            out.edges.push(EngineEdge {
                v: key.v.clone(),
                w: key.w.clone(),
                points: vec![v, w],
                label: None,
            });
        }
        out.width = 150.0 * out.nodes.len() as f64 + 100.0;
        out.height = 120.0 * out.nodes.len() as f64 + 100.0;
        Ok(out)
    }
}

struct FailingEngine;

impl LayoutEngine for FailingEngine {
    fn run(&self, _graph: &LayoutGraph) -> Result<EngineOutput, LayoutEngineError> {
        Err(LayoutEngineError {
            message: "cycle in minimum lengths".to_string(),
        })
    }
}

/// Returns a route with a single point for every edge.
struct DegenerateEngine;

impl LayoutEngine for DegenerateEngine {
    fn run(&self, graph: &LayoutGraph) -> Result<EngineOutput, LayoutEngineError> {
        let mut out = DiagonalEngine.run(graph)?;
        for e in &mut out.edges {
            e.points.truncate(1);
        }
        Ok(out)
    }
}

/// Packs nodes side by side with no gap and routes each edge from the shared side to the
/// target center.
struct TouchingEngine;

impl LayoutEngine for TouchingEngine {
    fn run(&self, graph: &LayoutGraph) -> Result<EngineOutput, LayoutEngineError> {
        let mut out = EngineOutput::default();
        let mut cursor = 0.0;
        for id in graph.nodes() {
            let size = graph.node(id).copied().unwrap_or_default();
            out.nodes
                .insert(id.to_string(), Point::new(cursor + size.width / 2.0, 100.0));
            cursor += size.width;
        }
        for (key, _) in graph.edge_entries() {
            let v = out.nodes[key.v.as_str()];
            let w = out.nodes[key.w.as_str()];
            let half = graph.node(&key.v).map(|n| n.width / 2.0).unwrap_or(0.0);
            out.edges.push(EngineEdge {
                v: key.v.clone(),
                w: key.w.clone(),
                points: vec![Point::new(v.x + half, v.y), w],
                label: None,
            });
        }
        out.width = cursor;
        out.height = 200.0;
        Ok(out)
    }
}

/// Ten units per character, one line per `\n`.
struct FixedMeasurer;

impl TextMeasurer for FixedMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let lines: Vec<&str> = text.split('\n').collect();
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        TextMetrics {
            width: widest as f64 * 10.0,
            height: lines.len() as f64 * style.font_size,
            line_count: lines.len(),
        }
    }
}

fn options(engine: Arc<dyn LayoutEngine + Send + Sync>) -> LayoutOptions {
    LayoutOptions {
        engine,
        ..Default::default()
    }
}

fn flowchart(src: &str, opts: &LayoutOptions) -> FlowchartLayout {
    let parsed = parse(src).expect("parse ok");
    match layout_with(&parsed, &LayoutConfig::default(), opts)
        .expect("layout ok")
        .layout
    {
        DiagramLayout::Flowchart(l) => l,
        other => panic!("expected flowchart layout, got {other:?}"),
    }
}

#[test]
fn diagonal_routes_become_orthogonal_and_touch_the_outlines() {
    let opts = options(Arc::new(DiagonalEngine));
    let layout = flowchart("graph TD\nA --> B\nB --> C\nA --> C", &opts);
    assert_eq!(layout.edges.len(), 3);
    for e in &layout.edges {
        assert!(e.points.len() >= 3, "a diagonal needs a bend: {:?}", e.points);
        for w in e.points.windows(2) {
            assert!(
                (w[0].x - w[1].x).abs() <= 1e-9 || (w[0].y - w[1].y).abs() <= 1e-9,
                "diagonal segment left in {:?}",
                e.points
            );
        }
        let from = layout.nodes.iter().find(|n| n.id == e.from).expect("from");
        let to = layout.nodes.iter().find(|n| n.id == e.to).expect("to");
        let shape = |n: &sirenia_layout::model::PositionedNode| {
            ShapeBox::new(n.center(), n.width, n.height, n.shape.boundary())
        };
        assert!(shape(from).boundary_distance(e.points[0]) < 1e-6);
        assert!(shape(to).boundary_distance(e.points[e.points.len() - 1]) < 1e-6);
    }
}

#[test]
fn diagonal_routes_into_circles_end_on_the_circle() {
    let opts = options(Arc::new(DiagonalEngine));
    let layout = flowchart("graph LR\nA((start)) --> B{check}", &opts);
    let e = &layout.edges[0];
    let a = &layout.nodes[0];
    let b = &layout.nodes[1];
    let r = a.width.min(a.height) / 2.0;
    assert!((e.points[0].distance(a.center()) - r).abs() < 1e-6);
    let end = e.points[e.points.len() - 1];
    let c = b.center();
    let level = (end.x - c.x).abs() / (b.width / 2.0) + (end.y - c.y).abs() / (b.height / 2.0);
    assert!((level - 1.0).abs() < 1e-6);
}

#[test]
fn engine_failures_propagate_unchanged() {
    let parsed = parse("graph TD\nA --> B").expect("parse ok");
    let err = layout_with(
        &parsed,
        &LayoutConfig::default(),
        &options(Arc::new(FailingEngine)),
    )
    .unwrap_err();
    match err {
        Error::Engine(e) => assert_eq!(e.message, "cycle in minimum lengths"),
        other => panic!("expected an engine error, got {other:?}"),
    }
}

#[test]
fn routes_without_segments_are_rejected() {
    let parsed = parse("graph TD\nA --> B").expect("parse ok");
    let err = layout_with(
        &parsed,
        &LayoutConfig::default(),
        &options(Arc::new(DegenerateEngine)),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidModel { .. }), "{err:?}");
}

#[test]
fn routes_that_collapse_to_a_point_are_rejected() {
    let parsed = parse("graph TD\nA --> B").expect("parse ok");
    let err = layout_with(
        &parsed,
        &LayoutConfig::default(),
        &options(Arc::new(TouchingEngine)),
    )
    .unwrap_err();
    match err {
        Error::InvalidModel { message } => assert!(message.contains("collapses"), "{message}"),
        other => panic!("expected an invalid model error, got {other:?}"),
    }
}

#[test]
fn custom_measurer_and_metrics_drive_box_sizes() {
    let opts = LayoutOptions {
        text_measurer: Arc::new(FixedMeasurer),
        metrics: BoxMetrics {
            min_class_width: 300.0,
            ..BoxMetrics::STANDARD
        },
        ..Default::default()
    };
    let parsed = parse("graph TD\nA[abcde] --> B").expect("parse ok");
    let config = LayoutConfig::default();
    let out = layout_with(&parsed, &config, &opts).expect("layout ok");
    let DiagramLayout::Flowchart(flow) = out.layout else {
        panic!("expected flowchart layout");
    };
    let a = flow.nodes.iter().find(|n| n.id == "A").expect("A");
    assert_eq!(a.width, 50.0 + 2.0 * config.node_padding_x);
    assert_eq!(a.height, config.font_size + 2.0 * config.node_padding_y);

    let parsed = parse("classDiagram\nclass Tiny").expect("parse ok");
    let out = layout_with(&parsed, &config, &opts).expect("layout ok");
    let DiagramLayout::Class(class) = out.layout else {
        panic!("expected class layout");
    };
    assert_eq!(class.classes[0].width, 300.0);
}
