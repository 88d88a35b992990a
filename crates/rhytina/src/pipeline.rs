//! The layout pipeline.
//!
//! Works on an index-based copy of the input graph laid out top-to-bottom, then writes the
//! rotated and translated coordinates back into the graph labels.

use crate::graphlib::{EdgeKey, Graph};
use crate::order::Adjacency;
use crate::position::{NodeExtent, SepParams};
use crate::rank::RankEdge;
use crate::util::{Rect, intersect_rect};
use crate::{
    EdgeLabel, Error, GraphLabel, LabelPos, NodeLabel, Point, RankDir, Result, acyclic, order,
    position, rank,
};

type LayoutGraph = Graph<NodeLabel, EdgeLabel, GraphLabel>;

/// Horizontal reach of a self-loop past the right side of its node, before label room.
const SELF_LOOP_MIN_REACH: f64 = 10.0;

#[derive(Debug, Clone)]
struct InputEdge {
    key: EdgeKey,
    v: usize,
    w: usize,
    minlen: usize,
    weight: f64,
    /// Label size in internal (top-to-bottom) orientation.
    label_width: f64,
    label_height: f64,
    labelpos: LabelPos,
    labeloffset: f64,
}

impl InputEdge {
    fn is_self_loop(&self) -> bool {
        self.v == self.w
    }

    fn has_label(&self) -> bool {
        self.label_width > 0.0 || self.label_height > 0.0
    }
}

#[derive(Debug, Clone, Default)]
struct Chain {
    dummies: Vec<usize>,
    label: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct WorkNode {
    width: f64,
    height: f64,
    rank: i32,
    dummy: bool,
    right_pad: f64,
}

#[derive(Debug, Clone, Default)]
struct EdgeGeometry {
    points: Vec<Point>,
    label: Option<Point>,
}

fn check_param(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidGraphParameter { name, value })
    }
}

fn validate_graph(graph: &GraphLabel) -> Result<()> {
    check_param("nodesep", graph.nodesep)?;
    check_param("ranksep", graph.ranksep)?;
    check_param("edgesep", graph.edgesep)?;
    check_param("marginx", graph.marginx)?;
    check_param("marginy", graph.marginy)?;
    Ok(())
}

fn valid_size(width: f64, height: f64) -> bool {
    width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0
}

fn collect_edges(g: &LayoutGraph, horizontal: bool) -> Result<Vec<InputEdge>> {
    let mut edges: Vec<InputEdge> = Vec::with_capacity(g.edge_count());
    for (key, label) in g.edge_entries() {
        let (Some(v), Some(w)) = (g.node_position(&key.v), g.node_position(&key.w)) else {
            continue;
        };
        if !label.weight.is_finite() || label.weight < 0.0 {
            return Err(Error::InvalidEdgeWeight {
                v: key.v.clone(),
                w: key.w.clone(),
                weight: label.weight,
            });
        }
        if !valid_size(label.width, label.height) {
            return Err(Error::InvalidEdgeLabelSize {
                v: key.v.clone(),
                w: key.w.clone(),
                width: label.width,
                height: label.height,
            });
        }
        if v == w && label.minlen == 0 {
            return Err(Error::ZeroLengthSelfLoop { id: key.v.clone() });
        }
        let (label_width, label_height) = if horizontal {
            (label.height, label.width)
        } else {
            (label.width, label.height)
        };
        edges.push(InputEdge {
            key: key.clone(),
            v,
            w,
            minlen: label.minlen,
            weight: label.weight,
            label_width,
            label_height,
            labelpos: label.labelpos,
            labeloffset: label.labeloffset,
        });
    }
    Ok(edges)
}

fn self_loop_reach(graph: &GraphLabel) -> f64 {
    (graph.edgesep * 2.0).max(SELF_LOOP_MIN_REACH)
}

pub(crate) fn run(g: &mut LayoutGraph) -> Result<()> {
    let graph = g.graph().clone();
    validate_graph(&graph)?;
    let horizontal = graph.rankdir.is_horizontal();

    let node_ids = g.node_ids();
    let mut work: Vec<WorkNode> = Vec::with_capacity(node_ids.len());
    for id in &node_ids {
        let (width, height) = g.node(id).map(|n| (n.width, n.height)).unwrap_or_default();
        if !valid_size(width, height) {
            return Err(Error::InvalidNodeSize {
                id: id.clone(),
                width,
                height,
            });
        }
        let (width, height) = if horizontal {
            (height, width)
        } else {
            (width, height)
        };
        work.push(WorkNode {
            width,
            height,
            rank: 0,
            dummy: false,
            right_pad: 0.0,
        });
    }
    let real_count = work.len();

    let edges = collect_edges(g, horizontal)?;

    let pairs: Vec<(usize, usize)> = edges.iter().map(|e| (e.v, e.w)).collect();
    let reversed = acyclic::feedback_arcs(real_count, &pairs);
    let oriented = |i: usize| -> (usize, usize) {
        let e = &edges[i];
        if reversed[i] { (e.w, e.v) } else { (e.v, e.w) }
    };

    // Ranks are doubled so every edge has a middle rank for its label.
    let rank_edges: Vec<RankEdge> = (0..edges.len())
        .filter(|&i| !edges[i].is_self_loop())
        .map(|i| {
            let (v, w) = oriented(i);
            RankEdge {
                v,
                w,
                minlen: i32::try_from(edges[i].minlen.saturating_mul(2)).unwrap_or(i32::MAX / 4),
            }
        })
        .collect();
    let ranks = rank::longest_path(real_count, &rank_edges);
    for (node, r) in work.iter_mut().zip(&ranks) {
        node.rank = *r;
    }

    let reach = self_loop_reach(&graph);
    let mut chains: Vec<Chain> = vec![Chain::default(); edges.len()];
    let mut unit_edges: Vec<(usize, usize, f64)> = Vec::new();
    for (i, e) in edges.iter().enumerate() {
        if e.is_self_loop() {
            let pad = reach + e.label_width;
            work[e.v].right_pad = work[e.v].right_pad.max(pad);
            continue;
        }
        let (v, w) = oriented(i);
        let (rv, rw) = (work[v].rank, work[w].rank);
        if rw <= rv {
            continue;
        }
        let label_rank = rv + (rw - rv) / 2;
        let mut prev = v;
        for r in rv + 1..rw {
            let is_label = r == label_rank && e.has_label();
            let idx = work.len();
            work.push(WorkNode {
                width: if is_label { e.label_width } else { 0.0 },
                height: if is_label { e.label_height } else { 0.0 },
                rank: r,
                dummy: true,
                right_pad: 0.0,
            });
            if is_label {
                chains[i].label = Some(idx);
            }
            chains[i].dummies.push(idx);
            unit_edges.push((prev, idx, e.weight));
            prev = idx;
        }
        unit_edges.push((prev, w, e.weight));
    }

    let all_ranks: Vec<i32> = work.iter().map(|n| n.rank).collect();
    let max_rank = usize::try_from(all_ranks.iter().copied().max().unwrap_or(0)).unwrap_or(0);
    let adj = Adjacency::new(work.len(), &unit_edges);
    let mut layers = order::init_order(&all_ranks, &adj, max_rank);
    let crossings = order::order(&mut layers, &adj);

    let extents: Vec<NodeExtent> = work
        .iter()
        .map(|n| NodeExtent {
            width: n.width,
            dummy: n.dummy,
            right_pad: n.right_pad,
        })
        .collect();
    let xs = position::assign_x(
        &layers,
        &adj,
        &extents,
        SepParams {
            nodesep: graph.nodesep,
            edgesep: graph.edgesep,
        },
    );

    let mut ys = vec![0.0; work.len()];
    let mut cursor = 0.0;
    for (idx, layer) in layers.iter().enumerate() {
        let h = layer
            .iter()
            .map(|&v| work[v].height)
            .fold(0.0_f64, f64::max);
        for &v in layer {
            ys[v] = cursor + h / 2.0;
        }
        cursor += h;
        if idx + 1 < layers.len() {
            cursor += graph.ranksep / 2.0;
        }
    }

    let center = |v: usize| Point { x: xs[v], y: ys[v] };
    let rect = |v: usize| Rect {
        x: xs[v],
        y: ys[v],
        width: work[v].width,
        height: work[v].height,
    };

    let mut geometry: Vec<EdgeGeometry> = Vec::with_capacity(edges.len());
    for (i, e) in edges.iter().enumerate() {
        if e.is_self_loop() {
            geometry.push(self_loop_geometry(rect(e.v), e, reach));
            continue;
        }
        let (v, w) = oriented(i);
        let inner: Vec<Point> = chains[i].dummies.iter().map(|&d| center(d)).collect();
        let toward_v = inner.first().copied().unwrap_or_else(|| center(w));
        let toward_w = inner.last().copied().unwrap_or_else(|| center(v));

        let mut points = Vec::with_capacity(inner.len() + 2);
        points.push(intersect_rect(rect(v), toward_v));
        points.extend(inner);
        points.push(intersect_rect(rect(w), toward_w));
        if reversed[i] {
            points.reverse();
        }

        let label = if let Some(d) = chains[i].label {
            let mut p = center(d);
            match e.labelpos {
                LabelPos::C => {}
                LabelPos::L => p.x -= e.labeloffset + e.label_width / 2.0,
                LabelPos::R => p.x += e.labeloffset + e.label_width / 2.0,
            }
            Some(p)
        } else if e.has_label() {
            let (a, b) = (points[0], points[points.len() - 1]);
            Some(Point {
                x: (a.x + b.x) / 2.0,
                y: (a.y + b.y) / 2.0,
            })
        } else {
            None
        };
        geometry.push(EdgeGeometry { points, label });
    }

    let transform = |p: Point| -> Point {
        match graph.rankdir {
            RankDir::TB => p,
            RankDir::BT => Point { x: p.x, y: -p.y },
            RankDir::LR => Point { x: p.y, y: p.x },
            RankDir::RL => Point { x: -p.y, y: p.x },
        }
    };

    let mut node_centers: Vec<Point> = (0..real_count).map(|v| transform(center(v))).collect();
    for geo in &mut geometry {
        for p in &mut geo.points {
            *p = transform(*p);
        }
        geo.label = geo.label.map(transform);
    }

    // Bounds use the caller's (unrotated) sizes.
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut include = |x: f64, y: f64, w: f64, h: f64| {
        min_x = min_x.min(x - w / 2.0);
        min_y = min_y.min(y - h / 2.0);
        max_x = max_x.max(x + w / 2.0);
        max_y = max_y.max(y + h / 2.0);
    };
    for (v, c) in node_centers.iter().enumerate() {
        let (w, h) = if horizontal {
            (work[v].height, work[v].width)
        } else {
            (work[v].width, work[v].height)
        };
        include(c.x, c.y, w, h);
    }
    for (e, geo) in edges.iter().zip(&geometry) {
        for p in &geo.points {
            include(p.x, p.y, 0.0, 0.0);
        }
        if let Some(l) = geo.label {
            let (w, h) = if horizontal {
                (e.label_height, e.label_width)
            } else {
                (e.label_width, e.label_height)
            };
            include(l.x, l.y, w, h);
        }
    }
    if !min_x.is_finite() {
        (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
    }

    let dx = graph.marginx - min_x;
    let dy = graph.marginy - min_y;
    let shift = |p: Point| Point {
        x: p.x + dx,
        y: p.y + dy,
    };
    for c in &mut node_centers {
        *c = shift(*c);
    }
    for geo in &mut geometry {
        for p in &mut geo.points {
            *p = shift(*p);
        }
        geo.label = geo.label.map(shift);
    }

    let mut order_of = vec![0usize; work.len()];
    for layer in &layers {
        for (i, &v) in layer.iter().enumerate() {
            order_of[v] = i;
        }
    }
    for (v, id) in node_ids.iter().enumerate() {
        if let Some(n) = g.node_mut(id) {
            n.x = Some(node_centers[v].x);
            n.y = Some(node_centers[v].y);
            n.rank = Some(work[v].rank);
            n.order = Some(order_of[v]);
        }
    }
    for (e, geo) in edges.iter().zip(geometry) {
        if let Some(lbl) = g.edge_mut(&e.key.v, &e.key.w) {
            lbl.points = geo.points;
            lbl.x = geo.label.map(|p| p.x);
            lbl.y = geo.label.map(|p| p.y);
        }
    }

    let label = g.graph_mut();
    label.width = Some(max_x - min_x + 2.0 * graph.marginx);
    label.height = Some(max_y - min_y + 2.0 * graph.marginy);

    tracing::debug!(
        nodes = real_count,
        edges = edges.len(),
        dummies = work.len() - real_count,
        ranks = max_rank + 1,
        crossings,
        "rhytina layout finished"
    );
    Ok(())
}

/// A rectangular loop leaving and re-entering the right side of the node.
fn self_loop_geometry(node: Rect, e: &InputEdge, reach: f64) -> EdgeGeometry {
    let right = node.x + node.width / 2.0;
    let out = right + reach;
    let dy = node.height / 4.0;
    let points = vec![
        Point::new(right, node.y - dy),
        Point::new(out, node.y - dy),
        Point::new(out, node.y + dy),
        Point::new(right, node.y + dy),
    ];
    let label = e
        .has_label()
        .then(|| Point::new(out + e.label_width / 2.0, node.y));
    EdgeGeometry { points, label }
}
