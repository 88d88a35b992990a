//! The port to the layered layout engine, and its default `rhytina` adapter.
//!
//! Diagram modules only ever see [`LayoutGraph`] and [`EngineOutput`], so the ranking and
//! positioning algorithm can be replaced without touching parsing or post-processing.

use crate::model::Point;
use indexmap::IndexMap;
use rhytina::{EdgeLabel, GraphLabel, NodeLabel, RankDir};
use rhytina_graphlib::Graph;
use sirenia_core::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeSpec {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub minlen: usize,
    /// Zero when the engine should not reserve room for a label.
    pub label_width: f64,
    pub label_height: f64,
    /// Index of the syntax-tree edge this entry was built from.
    pub source: usize,
}

impl Default for EdgeSpec {
    fn default() -> Self {
        Self {
            minlen: 1,
            label_width: 0.0,
            label_height: 0.0,
            source: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphSpec {
    pub direction: Direction,
    pub node_spacing: f64,
    pub edge_spacing: f64,
    pub rank_spacing: f64,
    pub margin: f64,
}

/// A simple directed graph: setting an edge for an ordered pair that already has one replaces
/// its payload in place.
pub type LayoutGraph = Graph<NodeSpec, EdgeSpec, GraphSpec>;

pub fn new_layout_graph(spec: GraphSpec) -> LayoutGraph {
    let mut g = LayoutGraph::new();
    g.set_graph(spec);
    g
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineEdge {
    pub v: String,
    pub w: String,
    /// Raw route; the ends sit on the node rectangles.
    pub points: Vec<Point>,
    pub label: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineOutput {
    /// Node centers.
    pub nodes: IndexMap<String, Point>,
    /// One entry per graph edge, in graph edge order.
    pub edges: Vec<EngineEdge>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("layout engine failure: {message}")]
pub struct LayoutEngineError {
    pub message: String,
}

impl From<rhytina::Error> for LayoutEngineError {
    fn from(err: rhytina::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

pub trait LayoutEngine {
    fn run(&self, graph: &LayoutGraph) -> Result<EngineOutput, LayoutEngineError>;
}

/// Runs graphs through [`rhytina::layout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RhytinaEngine;

fn rank_dir(direction: Direction) -> RankDir {
    match direction {
        Direction::TopDown => RankDir::TB,
        Direction::BottomUp => RankDir::BT,
        Direction::LeftRight => RankDir::LR,
        Direction::RightLeft => RankDir::RL,
    }
}

fn point(p: rhytina::Point) -> Point {
    Point::new(p.x, p.y)
}

impl LayoutEngine for RhytinaEngine {
    fn run(&self, graph: &LayoutGraph) -> Result<EngineOutput, LayoutEngineError> {
        let spec = graph.graph();
        if graph.node_count() == 0 {
            return Ok(EngineOutput {
                width: 2.0 * spec.margin,
                height: 2.0 * spec.margin,
                ..Default::default()
            });
        }

        let mut g: Graph<NodeLabel, EdgeLabel, GraphLabel> = Graph::new();
        g.set_graph(GraphLabel {
            rankdir: rank_dir(spec.direction),
            nodesep: spec.node_spacing,
            ranksep: spec.rank_spacing,
            edgesep: spec.edge_spacing,
            marginx: spec.margin,
            marginy: spec.margin,
            ..Default::default()
        });
        for id in graph.nodes() {
            let n = graph.node(id).copied().unwrap_or_default();
            g.set_node(id, NodeLabel::sized(n.width, n.height));
        }
        for (key, e) in graph.edge_entries() {
            g.set_edge_with_label(
                key.v.as_str(),
                key.w.as_str(),
                EdgeLabel {
                    width: e.label_width,
                    height: e.label_height,
                    minlen: e.minlen,
                    ..Default::default()
                },
            );
        }

        rhytina::layout(&mut g)?;

        let mut out = EngineOutput {
            width: g.graph().width.unwrap_or(0.0),
            height: g.graph().height.unwrap_or(0.0),
            ..Default::default()
        };
        for id in g.nodes() {
            if let Some(n) = g.node(id) {
                let center = Point::new(n.x.unwrap_or(0.0), n.y.unwrap_or(0.0));
                out.nodes.insert(id.to_string(), center);
            }
        }
        for (key, e) in g.edge_entries() {
            let label = match (e.x, e.y) {
                (Some(x), Some(y)) => Some(Point::new(x, y)),
                _ => None,
            };
            out.edges.push(EngineEdge {
                v: key.v.clone(),
                w: key.w.clone(),
                points: e.points.iter().copied().map(point).collect(),
                label,
            });
        }
        tracing::debug!(
            nodes = out.nodes.len(),
            edges = out.edges.len(),
            width = out.width,
            height = out.height,
            "engine ran"
        );
        Ok(out)
    }
}
