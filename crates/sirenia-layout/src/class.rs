use crate::engine::{EdgeSpec, GraphSpec, NodeSpec, new_layout_graph};
use crate::model::{ClassLayout, Extent, PositionedClass, PositionedRelationship, Rect, Translate};
use crate::postprocess::{ShapeBox, route_engine_edges};
use crate::size::Size;
use crate::{LayoutContext, Result};
use rustc_hash::FxHashMap;
use sirenia_core::ShapeBoundary;
use sirenia_core::diagrams::class::ClassAst;

/// Class diagrams always rank top-down, so parents of `<|--` sit above their children.
pub(crate) fn layout_class(
    ast: &ClassAst,
    ctx: &LayoutContext<'_>,
) -> Result<(ClassLayout, f64, f64)> {
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

    let boxes_by_class: Vec<_> = ast.classes.iter().map(|c| ctx.sizer.class_box(c)).collect();
    for (class, b) in ast.classes.iter().zip(&boxes_by_class) {
        graph.set_node(
            class.id.as_str(),
            NodeSpec {
                width: b.size.width,
                height: b.size.height,
            },
        );
    }

    // A later relationship between the same ordered pair replaces the earlier one.
    let mut label_sizes = Vec::with_capacity(ast.relationships.len());
    for (idx, rel) in ast.relationships.iter().enumerate() {
        let label = ctx.sizer.edge_label(rel.label.as_deref());
        let reserved = if ctx.defaults.reserve_edge_labels {
            label
        } else {
            Size::default()
        };
        graph.set_edge_with_label(
            rel.from.as_str(),
            rel.to.as_str(),
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
    let mut classes = Vec::with_capacity(ast.classes.len());
    for (class, b) in ast.classes.iter().zip(&boxes_by_class) {
        let center = output.nodes.get(&class.id).copied().unwrap_or_default();
        let rect = Rect::centered(center, b.size.width, b.size.height);
        shapes.insert(
            class.id.as_str(),
            ShapeBox::new(
                center,
                b.size.width,
                b.size.height,
                ShapeBoundary::Rectangle,
            ),
        );
        extent.rect(rect.x, rect.y, rect.width, rect.height);
        classes.push(PositionedClass {
            id: class.id.clone(),
            label: class.label.clone(),
            annotations: class.annotations.clone(),
            attributes: class.attributes.clone(),
            methods: class.methods.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            header_height: b.header_height,
            row_height: b.row_height,
            attributes_offset: b.attributes_offset,
            methods_offset: b.methods_offset,
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
        relationships.push(PositionedRelationship {
            from: rel.from.clone(),
            to: rel.to.clone(),
            kind: rel.kind,
            label: rel.label.clone(),
            from_cardinality: rel.from_cardinality.clone(),
            to_cardinality: rel.to_cardinality.clone(),
            label_anchor: r.label_anchor,
            points: r.points,
        });
    }

    let frame = extent.frame(config.diagram_padding);
    let mut layout = ClassLayout {
        classes,
        relationships,
    };
    layout.translate(frame.dx, frame.dy);
    Ok((
        layout,
        frame.width.max(output.width),
        frame.height.max(output.height),
    ))
}
