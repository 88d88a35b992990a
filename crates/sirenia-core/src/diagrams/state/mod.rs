//! State diagram syntax tree.
//!
//! Composite states own a region in [`StateAst::regions`]; region `0` is the diagram itself.

mod parse;

pub use parse::parse_state;

use crate::Direction;
use serde::Serialize;

pub const ROOT_REGION: usize = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAst {
    pub regions: Vec<StateRegion>,
}

impl StateAst {
    pub fn root(&self) -> &StateRegion {
        &self.regions[ROOT_REGION]
    }

    pub fn region(&self, idx: usize) -> Option<&StateRegion> {
        self.regions.get(idx)
    }

    /// Region nested in the composite state `id`.
    pub fn nested(&self, id: &str) -> Option<&StateRegion> {
        self.regions
            .iter()
            .find(|r| r.owner.as_deref() == Some(id))
    }

    /// Finds a state anywhere in the tree.
    pub fn state(&self, id: &str) -> Option<&StateNode> {
        self.regions
            .iter()
            .flat_map(|r| r.states.iter())
            .find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateRegion {
    /// Composite state owning this region; `None` for the root.
    pub owner: Option<String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub direction: Direction,
    pub states: Vec<StateNode>,
    pub transitions: Vec<Transition>,
}

impl StateRegion {
    pub fn state(&self, id: &str) -> Option<&StateNode> {
        self.states.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StateKind {
    Simple,
    Composite,
    Start,
    End,
    Fork,
    Join,
    Choice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateNode {
    pub id: String,
    pub label: String,
    /// Extra `Id : text` description lines.
    pub descriptions: Vec<String>,
    pub kind: StateKind,
    /// Region holding the nested diagram of a composite state.
    pub region: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub line: usize,
}
