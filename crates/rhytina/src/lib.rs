//! Compact layered graph layout.
//!
//! The engine lays a graph out top-to-bottom internally and rotates the result for the other
//! rank directions. Node and edge iteration follows graph insertion order everywhere, so equal
//! inputs always produce equal coordinates.

pub use rhytina_graphlib as graphlib;

use serde::{Deserialize, Serialize};

mod acyclic;
mod order;
mod pipeline;
mod position;
mod rank;
pub mod util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("node `{id}` has an invalid size ({width} x {height})")]
    InvalidNodeSize { id: String, width: f64, height: f64 },
    #[error("edge `{v}` -> `{w}` has an invalid label size ({width} x {height})")]
    InvalidEdgeLabelSize {
        v: String,
        w: String,
        width: f64,
        height: f64,
    },
    #[error("edge `{v}` -> `{w}` has an invalid weight: {weight}")]
    InvalidEdgeWeight { v: String, w: String, weight: f64 },
    #[error("self-loop on `{id}` requires a minimum length of at least 1")]
    ZeroLengthSelfLoop { id: String },
    #[error("graph parameter `{name}` must be finite and non-negative, got {value}")]
    InvalidGraphParameter { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

impl RankDir {
    pub fn is_horizontal(self) -> bool {
        matches!(self, RankDir::LR | RankDir::RL)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphLabel {
    pub rankdir: RankDir,
    pub nodesep: f64,
    pub ranksep: f64,
    pub edgesep: f64,
    pub marginx: f64,
    pub marginy: f64,
    /// Written by [`layout`].
    pub width: Option<f64>,
    /// Written by [`layout`].
    pub height: Option<f64>,
}

impl Default for GraphLabel {
    fn default() -> Self {
        Self {
            rankdir: RankDir::TB,
            nodesep: 50.0,
            ranksep: 50.0,
            edgesep: 10.0,
            marginx: 0.0,
            marginy: 0.0,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLabel {
    pub width: f64,
    pub height: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rank: Option<i32>,
    pub order: Option<usize>,
}

impl NodeLabel {
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelPos {
    #[default]
    C,
    L,
    R,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub width: f64,
    pub height: f64,
    pub labelpos: LabelPos,
    pub labeloffset: f64,
    pub minlen: usize,
    pub weight: f64,

    pub x: Option<f64>,
    pub y: Option<f64>,
    pub points: Vec<Point>,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            labelpos: LabelPos::C,
            labeloffset: 10.0,
            minlen: 1,
            weight: 1.0,
            x: None,
            y: None,
            points: Vec::new(),
        }
    }
}

impl EdgeLabel {
    pub fn has_label(&self) -> bool {
        self.width > 0.0 || self.height > 0.0
    }
}

/// Lays out `g` in place.
///
/// On success every node has `x`/`y` (its center), `rank` and `order`; every edge has a polyline
/// whose endpoints sit on the rectangles of its end nodes; labeled edges have `x`/`y`; and the
/// graph label carries the overall `width`/`height` including margins.
pub fn layout(g: &mut graphlib::Graph<NodeLabel, EdgeLabel, GraphLabel>) -> Result<()> {
    pipeline::run(g)
}
