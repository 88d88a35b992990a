//! Flowchart syntax tree.

mod parse;

pub use parse::parse_flowchart;

use crate::Direction;
use crate::shape::NodeShape;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowchartAst {
    pub direction: Direction,
    /// Nodes in declaration order.
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    /// Subgraph arena; `FlowNode::subgraph` and `SubgraphChild::Subgraph` index into it.
    pub subgraphs: Vec<Subgraph>,
    /// Top-level subgraphs in declaration order.
    pub root_subgraphs: Vec<usize>,
    pub class_defs: IndexMap<String, Vec<String>>,
}

impl FlowchartAst {
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn subgraph(&self, id: &str) -> Option<(usize, &Subgraph)> {
        self.subgraphs.iter().enumerate().find(|(_, s)| s.id == id)
    }

    /// Node ids contained in subgraph `idx`: its own members first, then nested subgraphs
    /// depth-first.
    pub fn descendant_nodes(&self, idx: usize) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            let Some(sub) = self.subgraphs.get(current) else {
                continue;
            };
            for child in sub.children.iter().rev() {
                if let SubgraphChild::Subgraph(nested) = child {
                    stack.push(*nested);
                }
            }
            for child in &sub.children {
                if let SubgraphChild::Node(id) = child {
                    out.push(id.as_str());
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    pub classes: Vec<String>,
    /// Innermost subgraph the node belongs to.
    pub subgraph: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeStroke {
    Solid,
    Dotted,
    Thick,
    Invisible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowHead {
    None,
    Normal,
    Circle,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub stroke: EdgeStroke,
    /// Marker drawn at `from`.
    pub start: ArrowHead,
    /// Marker drawn at `to`.
    pub end: ArrowHead,
    pub label: Option<String>,
    pub line: usize,
}

impl FlowEdge {
    pub fn is_bidirectional(&self) -> bool {
        self.start != ArrowHead::None && self.end != ArrowHead::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubgraphChild {
    Node(String),
    Subgraph(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subgraph {
    pub id: String,
    pub title: Option<String>,
    pub direction: Option<Direction>,
    pub parent: Option<usize>,
    pub children: Vec<SubgraphChild>,
    pub line: usize,
}
