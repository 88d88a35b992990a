//! Crossing reduction.
//!
//! Layers are seeded by a DFS in rank order, then refined with alternating barycenter sweeps.
//! The ordering with the fewest weighted crossings seen so far is kept.

#[derive(Debug, Clone, Default)]
pub(crate) struct Adjacency {
    /// Neighbors one rank above, with edge weights.
    pub preds: Vec<Vec<(usize, f64)>>,
    /// Neighbors one rank below, with edge weights.
    pub succs: Vec<Vec<(usize, f64)>>,
}

impl Adjacency {
    pub(crate) fn new(node_count: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut adj = Self {
            preds: vec![Vec::new(); node_count],
            succs: vec![Vec::new(); node_count],
        };
        for &(v, w, weight) in edges {
            adj.succs[v].push((w, weight));
            adj.preds[w].push((v, weight));
        }
        adj
    }
}

const MAX_SWEEPS: usize = 24;
const MAX_STALE_SWEEPS: usize = 4;

pub(crate) fn init_order(ranks: &[i32], adj: &Adjacency, max_rank: usize) -> Vec<Vec<usize>> {
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
    let mut visited = vec![false; ranks.len()];

    let mut starts: Vec<usize> = (0..ranks.len()).collect();
    starts.sort_by_key(|&v| (ranks[v], v));

    for start in starts {
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            if visited[v] {
                continue;
            }
            visited[v] = true;
            if let Some(layer) = usize::try_from(ranks[v]).ok().and_then(|r| layers.get_mut(r)) {
                layer.push(v);
            }
            for &(w, _) in adj.succs[v].iter().rev() {
                if !visited[w] {
                    stack.push(w);
                }
            }
        }
    }
    layers
}

pub(crate) fn order(layers: &mut [Vec<usize>], adj: &Adjacency) -> f64 {
    let mut best = layers.to_vec();
    let mut best_cc = crossing_count(layers, adj);
    let mut stale = 0;

    for i in 0..MAX_SWEEPS {
        if best_cc == 0.0 || stale >= MAX_STALE_SWEEPS {
            break;
        }
        sweep(layers, adj, i % 2 == 0);
        let cc = crossing_count(layers, adj);
        if cc < best_cc {
            best_cc = cc;
            best = layers.to_vec();
            stale = 0;
        } else {
            stale += 1;
        }
    }

    for (layer, kept) in layers.iter_mut().zip(best) {
        *layer = kept;
    }
    best_cc
}

fn positions(layers: &[Vec<usize>], node_count: usize) -> Vec<usize> {
    let mut pos = vec![0; node_count];
    for layer in layers {
        for (i, &v) in layer.iter().enumerate() {
            pos[v] = i;
        }
    }
    pos
}

fn node_count(adj: &Adjacency) -> usize {
    adj.preds.len()
}

fn sweep(layers: &mut [Vec<usize>], adj: &Adjacency, down: bool) {
    let count = layers.len();
    if count < 2 {
        return;
    }
    let indices: Vec<usize> = if down {
        (1..count).collect()
    } else {
        (0..count - 1).rev().collect()
    };
    for idx in indices {
        let pos = positions(layers, node_count(adj));
        let neighbors = if down { &adj.preds } else { &adj.succs };
        let sorted = sort_by_barycenter(&layers[idx], |v| barycenter(&neighbors[v], &pos));
        layers[idx] = sorted;
    }
}

fn barycenter(neighbors: &[(usize, f64)], pos: &[usize]) -> Option<f64> {
    let mut sum = 0.0;
    let mut weight = 0.0;
    for &(u, w) in neighbors {
        sum += w * pos[u] as f64;
        weight += w;
    }
    (weight > 0.0).then(|| sum / weight)
}

/// Sorts nodes with a barycenter; nodes without one keep their slot.
fn sort_by_barycenter(layer: &[usize], bc: impl Fn(usize) -> Option<f64>) -> Vec<usize> {
    let mut sortable: Vec<(f64, usize, usize)> = Vec::new();
    let mut fixed: Vec<Option<usize>> = vec![None; layer.len()];
    for (i, &v) in layer.iter().enumerate() {
        match bc(v) {
            Some(b) => sortable.push((b, i, v)),
            None => fixed[i] = Some(v),
        }
    }
    sortable.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut sorted = sortable.into_iter().map(|(_, _, v)| v);
    fixed
        .into_iter()
        .filter_map(|slot| slot.or_else(|| sorted.next()))
        .collect()
}

pub(crate) fn crossing_count(layers: &[Vec<usize>], adj: &Adjacency) -> f64 {
    let pos = positions(layers, node_count(adj));
    let mut total = 0.0;
    for layer in layers {
        let mut segs: Vec<(usize, usize, f64)> = Vec::new();
        for &v in layer {
            for &(w, weight) in &adj.succs[v] {
                segs.push((pos[v], pos[w], weight));
            }
        }
        for (i, a) in segs.iter().enumerate() {
            for b in &segs[i + 1..] {
                let crosses = (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1);
                if crosses {
                    total += a.2 * b.2;
                }
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_order_follows_dfs_from_first_rank() {
        // 0 -> 2, 1 -> 3
        let adj = Adjacency::new(4, &[(0, 2, 1.0), (1, 3, 1.0)]);
        let layers = init_order(&[0, 0, 1, 1], &adj, 1);
        assert_eq!(layers, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn sweeps_remove_a_simple_crossing() {
        // 0 -> 3, 1 -> 2 with layer 1 seeded as [2, 3] crosses once.
        let adj = Adjacency::new(4, &[(0, 3, 1.0), (1, 2, 1.0)]);
        let mut layers = vec![vec![0, 1], vec![2, 3]];
        assert_eq!(crossing_count(&layers, &adj), 1.0);
        let cc = order(&mut layers, &adj);
        assert_eq!(cc, 0.0);
        assert_eq!(crossing_count(&layers, &adj), 0.0);
    }

    #[test]
    fn nodes_without_neighbors_keep_their_slot() {
        let sorted = sort_by_barycenter(&[10, 11, 12], |v| match v {
            10 => Some(2.0),
            12 => Some(1.0),
            _ => None,
        });
        assert_eq!(sorted, vec![12, 11, 10]);
    }
}
