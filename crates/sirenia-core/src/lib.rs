#![forbid(unsafe_code)]

//! Diagram text to typed syntax trees (headless).
//!
//! [`parse`] normalizes the source, detects the diagram type from its header and runs the
//! matching line-driven parser. Every call is independent; nothing is cached between calls.

pub mod common;
pub mod diagrams;
pub mod error;
pub mod preprocess;
pub mod shape;

pub use common::Direction;
pub use error::{Error, ParseWarning, Result, WarningKind};
pub use preprocess::{DiagramKind, NormalizedSource, SourceLine, normalize};
pub use shape::{NodeShape, ShapeBoundary};

use diagrams::class::ClassAst;
use diagrams::er::ErAst;
use diagrams::flowchart::FlowchartAst;
use diagrams::sequence::SequenceAst;
use diagrams::state::StateAst;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "ast", rename_all = "camelCase")]
pub enum DiagramAst {
    Flowchart(FlowchartAst),
    State(StateAst),
    Sequence(SequenceAst),
    Class(ClassAst),
    Er(ErAst),
}

impl DiagramAst {
    pub fn kind(&self) -> DiagramKind {
        match self {
            DiagramAst::Flowchart(_) => DiagramKind::Flowchart,
            DiagramAst::State(_) => DiagramKind::State,
            DiagramAst::Sequence(_) => DiagramKind::Sequence,
            DiagramAst::Class(_) => DiagramKind::Class,
            DiagramAst::Er(_) => DiagramKind::Er,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDiagram {
    pub kind: DiagramKind,
    pub title: Option<String>,
    pub ast: DiagramAst,
    /// Lines that were skipped; never fatal.
    pub warnings: Vec<ParseWarning>,
}

/// Parses diagram text into its syntax tree.
pub fn parse(source: &str) -> Result<ParsedDiagram> {
    let normalized = normalize(source)?;
    parse_normalized(&normalized)
}

pub fn parse_normalized(source: &NormalizedSource) -> Result<ParsedDiagram> {
    let (ast, warnings) = match source.kind {
        DiagramKind::Flowchart => {
            let (ast, w) = diagrams::flowchart::parse_flowchart(source)?;
            (DiagramAst::Flowchart(ast), w)
        }
        DiagramKind::State => {
            let (ast, w) = diagrams::state::parse_state(source)?;
            (DiagramAst::State(ast), w)
        }
        DiagramKind::Sequence => {
            let (ast, w) = diagrams::sequence::parse_sequence(source)?;
            (DiagramAst::Sequence(ast), w)
        }
        DiagramKind::Class => {
            let (ast, w) = diagrams::class::parse_class(source)?;
            (DiagramAst::Class(ast), w)
        }
        DiagramKind::Er => {
            let (ast, w) = diagrams::er::parse_er(source)?;
            (DiagramAst::Er(ast), w)
        }
    };
    Ok(ParsedDiagram {
        kind: source.kind,
        title: source.title.clone(),
        ast,
        warnings,
    })
}

#[cfg(test)]
mod tests;
