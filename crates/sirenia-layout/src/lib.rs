#![forbid(unsafe_code)]

//! Parsed diagrams to positioned geometry (headless).
//!
//! Graph-shaped diagrams (flowchart, state, class, ER) are sized, handed to a [`LayoutEngine`]
//! as a simple graph of rectangles, and their raw routes repaired by [`postprocess`]. Sequence
//! diagrams are positioned directly.

pub mod class;
pub mod config;
pub mod engine;
pub mod er;
pub mod flowchart;
pub mod model;
pub mod postprocess;
pub mod render;
pub mod sequence;
pub mod size;
pub mod state;
pub mod text;
pub mod theme;

pub use config::{BoxMetrics, DiagramDefaults, LayoutConfig, SequenceMetrics};
pub use engine::{LayoutEngine, LayoutEngineError, RhytinaEngine};
pub use model::{DiagramLayout, Point, PositionedDiagram};
pub use theme::{Color, ResolvedTheme, Theme, ThemeError};

use crate::engine::{EngineOutput, LayoutGraph};
use crate::size::Sizer;
use crate::text::{HeuristicTextMeasurer, TextMeasurer};
use sirenia_core::{DiagramAst, DiagramKind, ParsedDiagram};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] LayoutEngineError),
    #[error("invalid semantic model: {message}")]
    InvalidModel { message: String },
    #[error("layout config field `{field}` must be finite and non-negative, got {value}")]
    InvalidConfig { field: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Pluggable collaborators.
#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    pub engine: Arc<dyn LayoutEngine + Send + Sync>,
    pub metrics: BoxMetrics,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(HeuristicTextMeasurer::default()),
            engine: Arc::new(RhytinaEngine),
            metrics: BoxMetrics::STANDARD,
        }
    }
}

/// Everything a diagram module needs for one call.
pub(crate) struct LayoutContext<'a> {
    pub config: &'a LayoutConfig,
    pub defaults: DiagramDefaults,
    pub sizer: Sizer<'a>,
    engine: &'a dyn LayoutEngine,
}

impl<'a> LayoutContext<'a> {
    fn new(kind: DiagramKind, config: &'a LayoutConfig, options: &'a LayoutOptions) -> Self {
        Self {
            config,
            defaults: DiagramDefaults::for_kind(kind),
            sizer: Sizer {
                config,
                metrics: &options.metrics,
                measurer: options.text_measurer.as_ref(),
            },
            engine: options.engine.as_ref(),
        }
    }

    pub(crate) fn metrics(&self) -> &BoxMetrics {
        self.sizer.metrics
    }

    pub(crate) fn run_engine(&self, graph: &LayoutGraph) -> Result<EngineOutput> {
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "layout graph built"
        );
        Ok(self.engine.run(graph)?)
    }
}

/// Lays out `parsed` with the default measurer and engine.
pub fn layout(parsed: &ParsedDiagram, config: &LayoutConfig) -> Result<PositionedDiagram> {
    layout_with(parsed, config, &LayoutOptions::default())
}

pub fn layout_with(
    parsed: &ParsedDiagram,
    config: &LayoutConfig,
    options: &LayoutOptions,
) -> Result<PositionedDiagram> {
    config.validate()?;
    let ctx = LayoutContext::new(parsed.kind, config, options);
    let (layout, width, height) = match &parsed.ast {
        DiagramAst::Flowchart(ast) => {
            let (l, w, h) = flowchart::layout_flowchart(ast, &ctx)?;
            (DiagramLayout::Flowchart(l), w, h)
        }
        DiagramAst::State(ast) => {
            let l = state::layout_state(ast, &ctx)?;
            let (w, h) = (l.width, l.height);
            (DiagramLayout::State(l), w, h)
        }
        DiagramAst::Sequence(ast) => {
            let (l, w, h) = sequence::layout_sequence(ast, &ctx)?;
            (DiagramLayout::Sequence(l), w, h)
        }
        DiagramAst::Class(ast) => {
            let (l, w, h) = class::layout_class(ast, &ctx)?;
            (DiagramLayout::Class(l), w, h)
        }
        DiagramAst::Er(ast) => {
            let (l, w, h) = er::layout_er(ast, &ctx)?;
            (DiagramLayout::Er(l), w, h)
        }
    };
    tracing::debug!(kind = %parsed.kind, width, height, "diagram positioned");
    Ok(PositionedDiagram {
        kind: parsed.kind,
        title: parsed.title.clone(),
        width,
        height,
        layout,
    })
}
