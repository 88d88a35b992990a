//! Coordinate assignment.
//!
//! `y` follows from rank heights. `x` starts from a left-packed placement and is refined by
//! alternating median sweeps; each layer update is an isotonic regression that keeps the layer
//! order and the minimum separation between neighbors.

use crate::order::Adjacency;

#[derive(Debug, Clone, Copy)]
pub(crate) struct SepParams {
    pub nodesep: f64,
    pub edgesep: f64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeExtent {
    pub width: f64,
    pub dummy: bool,
    /// Extra room reserved to the right of the node (self-loops).
    pub right_pad: f64,
}

const SWEEPS: usize = 8;

fn separation(a: &NodeExtent, b: &NodeExtent, params: SepParams) -> f64 {
    let half = |n: &NodeExtent| {
        if n.dummy {
            params.edgesep / 2.0
        } else {
            params.nodesep / 2.0
        }
    };
    a.width / 2.0 + a.right_pad + half(a) + half(b) + b.width / 2.0
}

pub(crate) fn assign_x(
    layers: &[Vec<usize>],
    adj: &Adjacency,
    extents: &[NodeExtent],
    params: SepParams,
) -> Vec<f64> {
    let mut xs = vec![0.0; extents.len()];
    for layer in layers {
        let mut x = 0.0;
        for (i, &v) in layer.iter().enumerate() {
            if i > 0 {
                x += separation(&extents[layer[i - 1]], &extents[v], params);
            }
            xs[v] = x;
        }
    }

    let count = layers.len();
    for sweep in 0..SWEEPS + 2 {
        let down = sweep % 2 == 0;
        let both = sweep >= SWEEPS;
        let indices: Vec<usize> = if down {
            (0..count).collect()
        } else {
            (0..count).rev().collect()
        };
        for idx in indices {
            let layer = &layers[idx];
            let desired: Vec<f64> = layer
                .iter()
                .map(|&v| {
                    let mut neighbors: Vec<f64> = Vec::new();
                    if down || both {
                        neighbors.extend(adj.preds[v].iter().map(|&(u, _)| xs[u]));
                    }
                    if !down || both {
                        neighbors.extend(adj.succs[v].iter().map(|&(u, _)| xs[u]));
                    }
                    median(&mut neighbors).unwrap_or(xs[v])
                })
                .collect();
            let gaps: Vec<f64> = (0..layer.len())
                .map(|i| {
                    if i == 0 {
                        0.0
                    } else {
                        separation(&extents[layer[i - 1]], &extents[layer[i]], params)
                    }
                })
                .collect();
            let weights: Vec<f64> = layer
                .iter()
                .map(|&v| if extents[v].dummy { 2.0 } else { 1.0 })
                .collect();
            let placed = isotonic_with_gaps(&desired, &gaps, &weights);
            for (&v, x) in layer.iter().zip(placed) {
                xs[v] = x;
            }
        }
    }

    let min_left = layers
        .iter()
        .flatten()
        .map(|&v| xs[v] - extents[v].width / 2.0)
        .fold(f64::INFINITY, f64::min);
    if min_left.is_finite() {
        for x in &mut xs {
            *x -= min_left;
        }
    }
    xs
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Weighted least-squares fit of `desired` subject to `x[i] - x[i - 1] >= gaps[i]`.
///
/// Shifting by the cumulative gaps turns the constraint into plain monotonicity, which the
/// pool-adjacent-violators algorithm solves exactly.
fn isotonic_with_gaps(desired: &[f64], gaps: &[f64], weights: &[f64]) -> Vec<f64> {
    let mut offsets: Vec<f64> = Vec::with_capacity(desired.len());
    let mut acc = 0.0;
    for gap in gaps {
        acc += gap;
        offsets.push(acc);
    }

    // (weighted sum, total weight, element count)
    let mut blocks: Vec<(f64, f64, usize)> = Vec::new();
    for i in 0..desired.len() {
        let target = desired[i] - offsets[i];
        blocks.push((target * weights[i], weights[i], 1));
        while blocks.len() >= 2 {
            let last = blocks[blocks.len() - 1];
            let prev = blocks[blocks.len() - 2];
            if prev.0 / prev.1 <= last.0 / last.1 {
                break;
            }
            blocks.pop();
            let merged = blocks.len() - 1;
            blocks[merged] = (prev.0 + last.0, prev.1 + last.1, prev.2 + last.2);
        }
    }

    let mut out: Vec<f64> = Vec::with_capacity(desired.len());
    for (sum, weight, n) in blocks {
        let value = sum / weight;
        for _ in 0..n {
            let i = out.len();
            out.push(value + offsets[i]);
        }
    }
    out
}
