//! State diagrams, laid out bottom-up.
//!
//! Each composite state's region is positioned on its own first; the result (plus a title band)
//! becomes the size of the composite node in the enclosing region, and is then moved into the
//! composite's box.

use crate::engine::{EdgeSpec, GraphSpec, NodeSpec, new_layout_graph};
use crate::model::{Extent, PositionedState, PositionedTransition, Rect, StateLayout, Translate};
use crate::postprocess::{ShapeBox, route_engine_edges};
use crate::size::Size;
use crate::{Error, LayoutContext, Result};
use rustc_hash::FxHashMap;
use sirenia_core::diagrams::state::{ROOT_REGION, StateAst, StateKind};
use sirenia_core::{Direction, NodeShape};

fn shape_of(kind: StateKind) -> NodeShape {
    match kind {
        StateKind::Simple | StateKind::Composite => NodeShape::Rounded,
        StateKind::Start => NodeShape::StateStart,
        StateKind::End => NodeShape::StateEnd,
        StateKind::Fork | StateKind::Join => NodeShape::ForkJoin,
        StateKind::Choice => NodeShape::Diamond,
    }
}

pub(crate) fn layout_state(ast: &StateAst, ctx: &LayoutContext<'_>) -> Result<StateLayout> {
    let direction = ctx.config.direction.unwrap_or(ast.root().direction);
    layout_region(ast, ROOT_REGION, direction, ctx, 0)
}

struct SizedState {
    size: Size,
    header_height: f64,
    nested: Option<StateLayout>,
}

fn layout_region(
    ast: &StateAst,
    region_idx: usize,
    direction: Direction,
    ctx: &LayoutContext<'_>,
    depth: usize,
) -> Result<StateLayout> {
    let invalid = |message: String| Error::InvalidModel { message };
    if depth > ast.regions.len() {
        return Err(invalid(format!("region {region_idx} is nested inside itself")));
    }
    let region = ast
        .region(region_idx)
        .ok_or_else(|| invalid(format!("missing state region {region_idx}")))?;
    let config = ctx.config;
    let horizontal = direction.is_horizontal();

    let mut sized = Vec::with_capacity(region.states.len());
    for state in &region.states {
        let entry = match (state.kind, state.region) {
            (StateKind::Composite, Some(inner_idx)) => {
                let inner_dir = ast
                    .region(inner_idx)
                    .map(|r| r.direction)
                    .unwrap_or_default();
                let inner = layout_region(ast, inner_idx, inner_dir, ctx, depth + 1)?;
                let header = ctx.sizer.composite_header(&state.label);
                SizedState {
                    size: Size::new(
                        inner.width.max(header.width),
                        header.height + inner.height,
                    ),
                    header_height: header.height,
                    nested: Some(inner),
                }
            }
            _ => SizedState {
                size: ctx.sizer.state(state, horizontal),
                header_height: 0.0,
                nested: None,
            },
        };
        sized.push(entry);
    }

    let mut graph = new_layout_graph(GraphSpec {
        direction,
        node_spacing: config.node_spacing,
        edge_spacing: config.edge_spacing,
        rank_spacing: ctx.defaults.rank_spacing(config),
        margin: config.diagram_padding,
    });
    for (state, s) in region.states.iter().zip(&sized) {
        graph.set_node(
            state.id.as_str(),
            NodeSpec {
                width: s.size.width,
                height: s.size.height,
            },
        );
    }
    let mut label_sizes = Vec::with_capacity(region.transitions.len());
    for (idx, t) in region.transitions.iter().enumerate() {
        for id in [&t.from, &t.to] {
            if region.state(id).is_none() {
                return Err(invalid(format!(
                    "transition on line {} names `{id}` outside its region",
                    t.line
                )));
            }
        }
        let label = ctx.sizer.edge_label(t.label.as_deref());
        graph.set_edge_with_label(
            t.from.as_str(),
            t.to.as_str(),
            EdgeSpec {
                label_width: label.width,
                label_height: label.height,
                source: idx,
                ..Default::default()
            },
        );
        label_sizes.push(label);
    }

    let output = ctx.run_engine(&graph)?;

    let mut extent = Extent::default();
    let mut boxes: FxHashMap<&str, ShapeBox> = FxHashMap::default();
    let mut states = Vec::with_capacity(region.states.len());
    for (state, s) in region.states.iter().zip(sized) {
        let center = output.nodes.get(&state.id).copied().unwrap_or_default();
        let shape = shape_of(state.kind);
        let rect = Rect::centered(center, s.size.width, s.size.height);
        boxes.insert(
            state.id.as_str(),
            ShapeBox::new(center, s.size.width, s.size.height, shape.boundary()),
        );
        extent.rect(rect.x, rect.y, rect.width, rect.height);
        let nested = s.nested.map(|mut inner| {
            inner.translate(
                rect.x + (rect.width - inner.width) / 2.0,
                rect.y + s.header_height,
            );
            Box::new(inner)
        });
        states.push(PositionedState {
            id: state.id.clone(),
            label: state.label.clone(),
            descriptions: state.descriptions.clone(),
            kind: state.kind,
            shape,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            header_height: s.header_height,
            nested,
        });
    }

    let routed = route_engine_edges(
        &output,
        &graph,
        &boxes,
        direction,
        ctx.defaults.midpoint_labels,
        |idx| region.transitions.get(idx).is_some_and(|t| t.label.is_some()),
    )?;
    let mut transitions = Vec::with_capacity(routed.len());
    for r in routed {
        let t = &region.transitions[r.source];
        let label = label_sizes[r.source];
        extent.points(&r.points);
        extent.label(r.label_anchor, (label.width, label.height));
        transitions.push(PositionedTransition {
            from: t.from.clone(),
            to: t.to.clone(),
            label: t.label.clone(),
            label_anchor: r.label_anchor,
            points: r.points,
        });
    }

    let frame = extent.frame(config.diagram_padding);
    let mut layout = StateLayout {
        direction,
        width: frame.width.max(output.width),
        height: frame.height.max(output.height),
        states,
        transitions,
    };
    layout.translate(frame.dx, frame.dy);
    tracing::debug!(
        region = region_idx,
        states = layout.states.len(),
        transitions = layout.transitions.len(),
        "state region positioned"
    );
    Ok(layout)
}
