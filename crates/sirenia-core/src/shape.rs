use serde::Serialize;

/// Every node shape a diagram can produce.
///
/// Consumers match on it exhaustively; adding a variant is meant to fail compilation wherever
/// sizing, clipping or drawing has not been taught about it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeShape {
    /// `[x]`
    Rectangle,
    /// `(x)`
    Rounded,
    /// `([x])`
    Stadium,
    /// `[[x]]`
    Subroutine,
    /// `[(x)]`
    Database,
    /// `((x))`
    Circle,
    /// `(((x)))`
    DoubleCircle,
    /// `{x}`
    Diamond,
    /// `{{x}}`
    Hexagon,
    /// `>x]`
    Flag,
    /// `[/x\]`
    Trapezoid,
    /// `[\x/]`
    InverseTrapezoid,
    /// `[/x/]`
    LeanRight,
    /// `[\x\]`
    LeanLeft,
    /// State-diagram `<<fork>>` / `<<join>>` bar.
    ForkJoin,
    /// State-diagram `[*]` as a source.
    StateStart,
    /// State-diagram `[*]` as a target.
    StateEnd,
}

/// Outline family used when clipping edge endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeBoundary {
    Rectangle,
    Diamond,
    Circle,
}

impl NodeShape {
    pub fn boundary(self) -> ShapeBoundary {
        match self {
            NodeShape::Diamond => ShapeBoundary::Diamond,
            NodeShape::Circle
            | NodeShape::DoubleCircle
            | NodeShape::StateStart
            | NodeShape::StateEnd => ShapeBoundary::Circle,
            NodeShape::Rectangle
            | NodeShape::Rounded
            | NodeShape::Stadium
            | NodeShape::Subroutine
            | NodeShape::Database
            | NodeShape::Hexagon
            | NodeShape::Flag
            | NodeShape::Trapezoid
            | NodeShape::InverseTrapezoid
            | NodeShape::LeanRight
            | NodeShape::LeanLeft
            | NodeShape::ForkJoin => ShapeBoundary::Rectangle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeShape::Rectangle => "rectangle",
            NodeShape::Rounded => "rounded",
            NodeShape::Stadium => "stadium",
            NodeShape::Subroutine => "subroutine",
            NodeShape::Database => "database",
            NodeShape::Circle => "circle",
            NodeShape::DoubleCircle => "doubleCircle",
            NodeShape::Diamond => "diamond",
            NodeShape::Hexagon => "hexagon",
            NodeShape::Flag => "flag",
            NodeShape::Trapezoid => "trapezoid",
            NodeShape::InverseTrapezoid => "inverseTrapezoid",
            NodeShape::LeanRight => "leanRight",
            NodeShape::LeanLeft => "leanLeft",
            NodeShape::ForkJoin => "forkJoin",
            NodeShape::StateStart => "stateStart",
            NodeShape::StateEnd => "stateEnd",
        }
    }
}
