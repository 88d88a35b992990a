//! Geometry repair for raw engine routes.
//!
//! The engine only knows rectangles and may return diagonal segments. Routes are rebuilt here:
//! diagonals get one bend, redundant corners are dropped, ends are re-clipped against the side
//! the path actually approaches from, and diamond or circular outlines pull the ends inwards.
//! Every step returns a fresh point list.

use crate::engine::{EngineOutput, LayoutGraph};
use crate::model::Point;
use rustc_hash::FxHashMap;
use sirenia_core::{Direction, ShapeBoundary};

/// Offsets at or below this are treated as axis-aligned.
pub const AXIS_TOLERANCE: f64 = 1.0;
/// Ends closer than this to the shape center are left alone.
pub const CENTER_EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeBox {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub boundary: ShapeBoundary,
}

impl ShapeBox {
    pub fn new(center: Point, width: f64, height: f64, boundary: ShapeBoundary) -> Self {
        Self {
            center,
            width,
            height,
            boundary,
        }
    }

    fn half(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Distance from `p` to the true outline of the shape.
    pub fn boundary_distance(&self, p: Point) -> f64 {
        let (hw, hh) = self.half();
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        match self.boundary {
            ShapeBoundary::Rectangle => {
                let ox = dx.abs() - hw;
                let oy = dy.abs() - hh;
                if ox <= 0.0 && oy <= 0.0 {
                    ox.max(oy).abs()
                } else {
                    ox.max(0.0).hypot(oy.max(0.0))
                }
            }
            ShapeBoundary::Circle => (dx.hypot(dy) - circle_radius(self)).abs(),
            ShapeBoundary::Diamond => {
                if hw <= 0.0 || hh <= 0.0 {
                    return dx.hypot(dy);
                }
                // Distance to the nearest diamond edge line, scaled by the edge normal.
                let level = dx.abs() / hw + dy.abs() / hh - 1.0;
                let norm = (1.0 / (hw * hw) + 1.0 / (hh * hh)).sqrt();
                level.abs() / norm
            }
        }
    }
}

fn circle_radius(shape: &ShapeBox) -> f64 {
    shape.width.min(shape.height) / 2.0
}

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() <= AXIS_TOLERANCE
}

/// Inserts one bend into every diagonal segment.
///
/// Vertically ranked diagrams bend vertical-then-horizontal, horizontal ones the other way round.
pub fn orthogonalize(points: &[Point], vertical_ranks: bool) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len() * 2);
    for &p in points {
        if let Some(&prev) = out.last() {
            if !near(prev.x, p.x) && !near(prev.y, p.y) {
                let bend = if vertical_ranks {
                    Point::new(prev.x, p.y)
                } else {
                    Point::new(p.x, prev.y)
                };
                out.push(bend);
            }
        }
        out.push(p);
    }
    out
}

fn collinear(a: Point, b: Point, c: Point) -> bool {
    (near(a.x, b.x) && near(b.x, c.x)) || (near(a.y, b.y) && near(b.y, c.y))
}

/// Drops middle points of straight runs. The first and last points always survive.
pub fn remove_collinear(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        while out.len() >= 2 && collinear(out[out.len() - 2], out[out.len() - 1], p) {
            out.pop();
        }
        out.push(p);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Approach {
    Horizontal,
    Vertical,
}

fn sign_or(value: f64, fallback: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        fallback
    }
}

/// Puts `end` on the side of `shape` that faces `adjacent`.
///
/// Returns the new end and, when the cross coordinate had to be clamped into the side, the
/// replacement for `adjacent` that keeps the final segment axis-aligned.
fn clip_end(shape: &ShapeBox, end: Point, adjacent: Point) -> (Point, Option<Point>) {
    let c = shape.center;
    let (hw, hh) = shape.half();
    let seg_dx = (adjacent.x - end.x).abs();
    let seg_dy = (adjacent.y - end.y).abs();
    let mut approach = if seg_dx >= seg_dy {
        Approach::Horizontal
    } else {
        Approach::Vertical
    };
    // A run that starts inside the shape's own span really enters through the other axis.
    let inside_x = (adjacent.x - c.x).abs() < hw;
    let inside_y = (adjacent.y - c.y).abs() < hh;
    match approach {
        Approach::Horizontal if inside_x && !inside_y => approach = Approach::Vertical,
        Approach::Vertical if inside_y && !inside_x => approach = Approach::Horizontal,
        _ => {}
    }

    match approach {
        Approach::Horizontal => {
            let side = c.x + sign_or(adjacent.x - c.x, sign_or(end.x - c.x, 1.0)) * hw;
            let y = adjacent.y.clamp(c.y - hh, c.y + hh);
            let moved = (y != adjacent.y).then(|| Point::new(adjacent.x, y));
            (Point::new(side, y), moved)
        }
        Approach::Vertical => {
            let side = c.y + sign_or(adjacent.y - c.y, sign_or(end.y - c.y, 1.0)) * hh;
            let x = adjacent.x.clamp(c.x - hw, c.x + hw);
            let moved = (x != adjacent.x).then(|| Point::new(x, adjacent.y));
            (Point::new(x, side), moved)
        }
    }
}

/// Re-derives the end points from the direction of the segments next to them.
///
/// A two-point route only has its target end re-clipped; longer routes have both ends clipped
/// independently. Interior points may shift along one axis to keep their segments straight.
pub fn reclip_endpoints(points: &[Point], source: &ShapeBox, target: &ShapeBox) -> Vec<Point> {
    let mut out = points.to_vec();
    let n = out.len();
    if n < 2 {
        return out;
    }
    if n == 2 {
        let (end, _) = clip_end(target, out[1], out[0]);
        out[1] = end;
        return drop_duplicate_neighbours(out);
    }

    let (start, moved) = clip_end(source, out[0], out[1]);
    out[0] = start;
    if let Some(m) = moved {
        out[1] = m;
    }
    let (end, moved) = clip_end(target, out[n - 1], out[n - 2]);
    out[n - 1] = end;
    if let Some(m) = moved {
        out[n - 2] = m;
    }
    drop_duplicate_neighbours(out)
}

/// Collapses points that coincide with the end they lead into.
///
/// A route whose ends land on the same point comes back with a single point.
fn drop_duplicate_neighbours(points: Vec<Point>) -> Vec<Point> {
    let n = points.len();
    let mut out: Vec<Point> = Vec::with_capacity(n);
    for (i, p) in points.into_iter().enumerate() {
        let is_end = i == 0 || i + 1 == n;
        if let Some(last) = out.last_mut() {
            if last.distance(p) < 1e-9 {
                if is_end {
                    *last = p;
                }
                continue;
            }
        }
        out.push(p);
    }
    out
}

/// Moves `p` along the ray from the shape center onto a diamond or circular outline.
pub fn correct_boundary(shape: &ShapeBox, p: Point) -> Point {
    let c = shape.center;
    let dx = p.x - c.x;
    let dy = p.y - c.y;
    if dx.hypot(dy) < CENTER_EPSILON {
        return p;
    }
    let (hw, hh) = shape.half();
    let scale = match shape.boundary {
        ShapeBoundary::Rectangle => return p,
        ShapeBoundary::Diamond => {
            if hw <= 0.0 || hh <= 0.0 {
                return p;
            }
            1.0 / (dx.abs() / hw + dy.abs() / hh)
        }
        ShapeBoundary::Circle => circle_radius(shape) / dx.hypot(dy),
    };
    tracing::trace!(from_x = p.x, from_y = p.y, scale, "endpoint pulled onto outline");
    Point::new(c.x + dx * scale, c.y + dy * scale)
}

/// Point halfway along the path, measured by length.
pub fn arc_length_midpoint(points: &[Point]) -> Option<Point> {
    let first = *points.first()?;
    let total: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    if total <= 0.0 {
        return Some(first);
    }
    let mut remaining = total / 2.0;
    for w in points.windows(2) {
        let len = w[0].distance(w[1]);
        if len >= remaining && len > 0.0 {
            let t = remaining / len;
            return Some(Point::new(
                w[0].x + (w[1].x - w[0].x) * t,
                w[0].y + (w[1].y - w[0].y) * t,
            ));
        }
        remaining -= len;
    }
    points.last().copied()
}

/// The whole repair pipeline for one edge.
///
/// Boxes that touch can leave nothing to draw; the result then holds a single point.
pub fn route(
    raw: &[Point],
    source: &ShapeBox,
    target: &ShapeBox,
    direction: Direction,
) -> Vec<Point> {
    let vertical = !direction.is_horizontal();
    let bent = orthogonalize(raw, vertical);
    let simplified = remove_collinear(&bent);
    let clipped = reclip_endpoints(&simplified, source, target);
    let mut path = remove_collinear(&clipped);
    if let Some(first) = path.first_mut() {
        *first = correct_boundary(source, *first);
    }
    if let Some(last) = path.last_mut() {
        *last = correct_boundary(target, *last);
    }
    path
}

/// Engine anchor when it reported a usable one, otherwise the path midpoint if requested.
pub fn label_anchor(engine: Option<Point>, path: &[Point], midpoint: bool) -> Option<Point> {
    match engine {
        Some(p) if p.x != 0.0 || p.y != 0.0 => Some(p),
        _ if midpoint => arc_length_midpoint(path),
        _ => None,
    }
}

/// A repaired engine edge, tied back to the syntax-tree edge it was built from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RoutedEdge {
    pub source: usize,
    pub points: Vec<Point>,
    pub label_anchor: Option<Point>,
}

/// Repairs every edge the engine returned.
///
/// `labeled` tells whether the syntax-tree edge with the given index carries a label.
pub(crate) fn route_engine_edges(
    output: &EngineOutput,
    graph: &LayoutGraph,
    boxes: &FxHashMap<&str, ShapeBox>,
    direction: Direction,
    midpoint_labels: bool,
    labeled: impl Fn(usize) -> bool,
) -> crate::Result<Vec<RoutedEdge>> {
    let mut routed = Vec::with_capacity(output.edges.len());
    for e in &output.edges {
        let unknown = || crate::Error::InvalidModel {
            message: format!("engine returned an unknown edge `{}` -> `{}`", e.v, e.w),
        };
        let spec = graph.edge(&e.v, &e.w).ok_or_else(unknown)?;
        let (Some(source), Some(target)) = (boxes.get(e.v.as_str()), boxes.get(e.w.as_str()))
        else {
            return Err(unknown());
        };
        if e.points.len() < 2 {
            return Err(crate::Error::InvalidModel {
                message: format!("engine route for `{}` -> `{}` has no segments", e.v, e.w),
            });
        }
        let points = route(&e.points, source, target, direction);
        if points.len() < 2 {
            return Err(crate::Error::InvalidModel {
                message: format!("route for `{}` -> `{}` collapses to a point", e.v, e.w),
            });
        }
        let label_anchor = if labeled(spec.source) {
            label_anchor(e.label, &points, midpoint_labels)
        } else {
            None
        };
        routed.push(RoutedEdge {
            source: spec.source,
            points,
            label_anchor,
        });
    }
    tracing::debug!(edges = routed.len(), "edges post-processed");
    Ok(routed)
}
