#![forbid(unsafe_code)]

//! `sirenia` compiles diagram text into a [`PositionedDiagram`].
//!
//! [`compile`] runs the whole pipeline: the source is normalized and parsed by `sirenia-core`,
//! then sized, laid out and post-processed by `sirenia-layout`. Both stages are pure; calls
//! share no state and may run on any thread.

pub use sirenia_core::{DiagramAst, DiagramKind, Direction, NodeShape, ParsedDiagram, parse};
pub use sirenia_layout::model;
pub use sirenia_layout::render;
pub use sirenia_layout::{
    LayoutConfig, LayoutEngine, LayoutOptions, PositionedDiagram, ResolvedTheme, RhytinaEngine,
    Theme,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] sirenia_core::Error),
    #[error(transparent)]
    Layout(#[from] sirenia_layout::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Parses and lays out `source` with the default text measurer and layout engine.
pub fn compile(source: &str, config: &LayoutConfig) -> Result<PositionedDiagram> {
    compile_with(source, config, &LayoutOptions::default())
}

pub fn compile_with(
    source: &str,
    config: &LayoutConfig,
    options: &LayoutOptions,
) -> Result<PositionedDiagram> {
    let parsed = parse(source)?;
    if !parsed.warnings.is_empty() {
        tracing::debug!(
            kind = %parsed.kind,
            warnings = parsed.warnings.len(),
            "compiling despite skipped lines"
        );
    }
    Ok(sirenia_layout::layout_with(&parsed, config, options)?)
}
