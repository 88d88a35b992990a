//! Port for pixel renderers.
//!
//! Nothing in this workspace paints. A renderer receives the positioned geometry, a complete
//! palette and a scale factor, and owns everything else (stroke widths, arrowheads, fonts).

use crate::model::PositionedDiagram;
use crate::theme::ResolvedTheme;

#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub diagram: &'a PositionedDiagram,
    pub theme: &'a ResolvedTheme,
    /// Device pixels per layout unit.
    pub scale: f64,
}

impl<'a> RenderRequest<'a> {
    pub fn new(diagram: &'a PositionedDiagram, theme: &'a ResolvedTheme, scale: f64) -> Self {
        Self {
            diagram,
            theme,
            scale,
        }
    }

    /// Output size in whole pixels, never smaller than 1x1.
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |v: f64| {
            let scaled = (v * self.scale).ceil();
            if scaled.is_finite() {
                scaled.clamp(1.0, u32::MAX as f64) as u32
            } else {
                1
            }
        };
        (px(self.diagram.width), px(self.diagram.height))
    }
}

pub trait DiagramRenderer {
    type Output;
    type Error: std::error::Error;

    fn render(&self, request: &RenderRequest<'_>) -> Result<Self::Output, Self::Error>;
}
