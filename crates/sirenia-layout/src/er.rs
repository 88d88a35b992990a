use crate::engine::{EdgeSpec, GraphSpec, NodeSpec, new_layout_graph};
use crate::model::{ErLayout, Extent, PositionedEntity, PositionedErRelationship, Rect, Translate};
use crate::postprocess::{ShapeBox, route_engine_edges};
use crate::size::Size;
use crate::{LayoutContext, Result};
use rustc_hash::FxHashMap;
use sirenia_core::ShapeBoundary;
use sirenia_core::diagrams::er::ErAst;

/// ER diagrams rank left-to-right. Relationship labels are not reserved in the engine; they sit
/// at the midpoint of the final path, so the rank gap is kept wide enough for them.
pub(crate) fn layout_er(ast: &ErAst, ctx: &LayoutContext<'_>) -> Result<(ErLayout, f64, f64)> {
    let config = ctx.config;
    let direction = ctx
        .defaults
        .forced_direction
        .or(config.direction)
        .unwrap_or_default();
    let mut graph = new_layout_graph(GraphSpec {
        direction,
        node_spacing: config.node_spacing,
        edge_spacing: config.edge_spacing,
        rank_spacing: ctx.defaults.rank_spacing(config),
        margin: config.diagram_padding,
    });

    let entity_boxes: Vec<_> = ast
        .entities
        .iter()
        .map(|e| ctx.sizer.entity_box(e))
        .collect();
    for (entity, b) in ast.entities.iter().zip(&entity_boxes) {
        graph.set_node(
            entity.id.as_str(),
            NodeSpec {
                width: b.size.width,
                height: b.size.height,
            },
        );
    }

    let mut label_sizes = Vec::with_capacity(ast.relationships.len());
    for (idx, rel) in ast.relationships.iter().enumerate() {
        let label = ctx.sizer.edge_label(rel.label.as_deref());
        let reserved = if ctx.defaults.reserve_edge_labels {
            label
        } else {
            Size::default()
        };
        graph.set_edge_with_label(
            rel.entity1.as_str(),
            rel.entity2.as_str(),
            EdgeSpec {
                label_width: reserved.width,
                label_height: reserved.height,
                source: idx,
                ..Default::default()
            },
        );
        label_sizes.push(label);
    }

    let output = ctx.run_engine(&graph)?;

    let mut extent = Extent::default();
    let mut shapes: FxHashMap<&str, ShapeBox> = FxHashMap::default();
    let mut entities = Vec::with_capacity(ast.entities.len());
    for (entity, b) in ast.entities.iter().zip(&entity_boxes) {
        let center = output.nodes.get(&entity.id).copied().unwrap_or_default();
        let rect = Rect::centered(center, b.size.width, b.size.height);
        shapes.insert(
            entity.id.as_str(),
            ShapeBox::new(
                center,
                b.size.width,
                b.size.height,
                ShapeBoundary::Rectangle,
            ),
        );
        extent.rect(rect.x, rect.y, rect.width, rect.height);
        entities.push(PositionedEntity {
            id: entity.id.clone(),
            label: entity.label.clone(),
            attributes: entity.attributes.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            header_height: b.header_height,
            row_height: b.row_height,
            columns: b.columns,
        });
    }

    let routed = route_engine_edges(
        &output,
        &graph,
        &shapes,
        direction,
        ctx.defaults.midpoint_labels,
        |idx| ast.relationships.get(idx).is_some_and(|r| r.label.is_some()),
    )?;
    let mut relationships = Vec::with_capacity(routed.len());
    for r in routed {
        let rel = &ast.relationships[r.source];
        let label = label_sizes[r.source];
        extent.points(&r.points);
        extent.label(r.label_anchor, (label.width, label.height));
        relationships.push(PositionedErRelationship {
            entity1: rel.entity1.clone(),
            entity2: rel.entity2.clone(),
            cardinality1: rel.cardinality1,
            cardinality2: rel.cardinality2,
            label: rel.label.clone(),
            identifying: rel.identifying,
            label_anchor: r.label_anchor,
            points: r.points,
        });
    }

    let frame = extent.frame(config.diagram_padding);
    let mut layout = ErLayout {
        entities,
        relationships,
    };
    layout.translate(frame.dx, frame.dy);
    Ok((
        layout,
        frame.width.max(output.width),
        frame.height.max(output.height),
    ))
}
