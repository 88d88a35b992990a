use crate::engine::{EdgeSpec, GraphSpec, NodeSpec, new_layout_graph};
use crate::model::{
    Extent, FlowchartLayout, PositionedCluster, PositionedEdge, PositionedNode, Rect, Translate,
};
use crate::postprocess::{ShapeBox, route_engine_edges};
use crate::size::Size;
use crate::{Error, LayoutContext, Result};
use rustc_hash::FxHashMap;
use sirenia_core::diagrams::flowchart::{FlowchartAst, SubgraphChild};

/// Node an edge endpoint is routed to, plus the subgraph it was written against.
fn resolve_endpoint<'a>(ast: &'a FlowchartAst, id: &'a str) -> Result<(&'a str, Option<String>)> {
    if ast.node(id).is_some() {
        return Ok((id, None));
    }
    let anchor = ast
        .subgraph(id)
        .and_then(|(idx, _)| ast.descendant_nodes(idx).first().copied());
    match anchor {
        Some(node) => Ok((node, Some(id.to_string()))),
        None => Err(Error::InvalidModel {
            message: format!("edge endpoint `{id}` is neither a node nor a non-empty subgraph"),
        }),
    }
}

pub(crate) fn layout_flowchart(
    ast: &FlowchartAst,
    ctx: &LayoutContext<'_>,
) -> Result<(FlowchartLayout, f64, f64)> {
    let config = ctx.config;
    let direction = config.direction.unwrap_or(ast.direction);
    let mut graph = new_layout_graph(GraphSpec {
        direction,
        node_spacing: config.node_spacing,
        edge_spacing: config.edge_spacing,
        rank_spacing: ctx.defaults.rank_spacing(config),
        margin: config.diagram_padding,
    });

    let mut sizes: FxHashMap<&str, Size> = FxHashMap::default();
    for node in &ast.nodes {
        let size = ctx.sizer.node(node.shape, &node.label);
        graph.set_node(
            node.id.as_str(),
            NodeSpec {
                width: size.width,
                height: size.height,
            },
        );
        sizes.insert(node.id.as_str(), size);
    }

    let mut endpoints = Vec::with_capacity(ast.edges.len());
    let mut label_sizes = Vec::with_capacity(ast.edges.len());
    for (idx, edge) in ast.edges.iter().enumerate() {
        let (from, from_cluster) = resolve_endpoint(ast, &edge.from)?;
        let (to, to_cluster) = resolve_endpoint(ast, &edge.to)?;
        let label = ctx.sizer.edge_label(edge.label.as_deref());
        let reserved = if ctx.defaults.reserve_edge_labels {
            label
        } else {
            Size::default()
        };
        graph.set_edge_with_label(
            from,
            to,
            EdgeSpec {
                label_width: reserved.width,
                label_height: reserved.height,
                source: idx,
                ..Default::default()
            },
        );
        endpoints.push((from, to, from_cluster, to_cluster));
        label_sizes.push(label);
    }

    let output = ctx.run_engine(&graph)?;

    let mut nodes = Vec::with_capacity(ast.nodes.len());
    let mut boxes: FxHashMap<&str, ShapeBox> = FxHashMap::default();
    for node in &ast.nodes {
        let size = sizes.get(node.id.as_str()).copied().unwrap_or_default();
        let center = output.nodes.get(&node.id).copied().unwrap_or_default();
        let rect = Rect::centered(center, size.width, size.height);
        boxes.insert(
            node.id.as_str(),
            ShapeBox::new(center, size.width, size.height, node.shape.boundary()),
        );
        nodes.push(PositionedNode {
            id: node.id.clone(),
            label: node.label.clone(),
            shape: node.shape,
            classes: node.classes.clone(),
            x: rect.x,
            y: rect.y,
            width: size.width,
            height: size.height,
        });
    }

    let routed = route_engine_edges(
        &output,
        &graph,
        &boxes,
        direction,
        ctx.defaults.midpoint_labels,
        |idx| ast.edges.get(idx).is_some_and(|e| e.label.is_some()),
    )?;
    let mut edges = Vec::with_capacity(routed.len());
    let mut extent = Extent::default();
    for r in routed {
        let edge = &ast.edges[r.source];
        let (from, to, from_cluster, to_cluster) = &endpoints[r.source];
        extent.points(&r.points);
        let label = label_sizes[r.source];
        extent.label(r.label_anchor, (label.width, label.height));
        edges.push(PositionedEdge {
            from: from.to_string(),
            to: to.to_string(),
            from_cluster: from_cluster.clone(),
            to_cluster: to_cluster.clone(),
            stroke: edge.stroke,
            start: edge.start,
            end: edge.end,
            label: edge.label.clone(),
            label_anchor: r.label_anchor,
            points: r.points,
        });
    }

    let clusters = place_clusters(ast, &nodes, ctx);
    for n in &nodes {
        extent.rect(n.x, n.y, n.width, n.height);
    }
    for c in &clusters {
        extent.rect(c.x, c.y, c.width, c.height);
    }

    let mut layout = FlowchartLayout {
        direction,
        nodes,
        edges,
        clusters,
    };
    let frame = extent.frame(config.diagram_padding);
    layout.translate(frame.dx, frame.dy);
    Ok((
        layout,
        frame.width.max(output.width),
        frame.height.max(output.height),
    ))
}

/// Boxes around each subgraph's members, computed innermost first.
fn place_clusters(
    ast: &FlowchartAst,
    nodes: &[PositionedNode],
    ctx: &LayoutContext<'_>,
) -> Vec<PositionedCluster> {
    let m = ctx.metrics();
    let by_id: FxHashMap<&str, &PositionedNode> =
        nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    // Nested subgraphs are always created after their parent.
    let mut rects: Vec<Option<Rect>> = vec![None; ast.subgraphs.len()];
    for idx in (0..ast.subgraphs.len()).rev() {
        let mut inner = Extent::default();
        for child in &ast.subgraphs[idx].children {
            match child {
                SubgraphChild::Node(id) => {
                    if let Some(n) = by_id.get(id.as_str()) {
                        inner.rect(n.x, n.y, n.width, n.height);
                    }
                }
                SubgraphChild::Subgraph(nested) => {
                    if let Some(Some(r)) = rects.get(*nested) {
                        inner.rect(r.x, r.y, r.width, r.height);
                    }
                }
            }
        }
        rects[idx] = inner.bounds().map(|b| Rect {
            x: b.min_x - m.cluster_padding,
            y: b.min_y - m.cluster_padding - m.cluster_title_height,
            width: b.width() + 2.0 * m.cluster_padding,
            height: b.height() + 2.0 * m.cluster_padding + m.cluster_title_height,
        });
    }

    let mut clusters = Vec::new();
    for (idx, sub) in ast.subgraphs.iter().enumerate() {
        let Some(rect) = rects[idx] else {
            tracing::debug!(subgraph = %sub.id, "empty subgraph has no box");
            continue;
        };
        let mut depth = 0;
        let mut parent = sub.parent;
        while let Some(p) = parent {
            depth += 1;
            parent = ast.subgraphs.get(p).and_then(|s| s.parent);
        }
        clusters.push(PositionedCluster {
            id: sub.id.clone(),
            title: sub.title.clone(),
            parent: sub
                .parent
                .and_then(|p| ast.subgraphs.get(p))
                .map(|s| s.id.clone()),
            depth,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
    }
    clusters
}
