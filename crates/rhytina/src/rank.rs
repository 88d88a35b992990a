//! Rank assignment.
//!
//! Longest-path ranking pulled toward the sinks, followed by a tightening pass that lifts sinks
//! up against their predecessors. Ranks are normalized so the smallest is zero.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RankEdge {
    pub v: usize,
    pub w: usize,
    pub minlen: i32,
}

/// `edges` must be acyclic and free of self-loops.
pub(crate) fn longest_path(node_count: usize, edges: &[RankEdge]) -> Vec<i32> {
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut inn: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut indegree: Vec<usize> = vec![0; node_count];
    for (idx, e) in edges.iter().enumerate() {
        out[e.v].push(idx);
        inn[e.w].push(idx);
        indegree[e.w] += 1;
    }

    // Deterministic Kahn order: initial nodes in insertion order.
    let mut queue: VecDeque<usize> = (0..node_count).filter(|&v| indegree[v] == 0).collect();
    let mut topo: Vec<usize> = Vec::with_capacity(node_count);
    while let Some(v) = queue.pop_front() {
        topo.push(v);
        for &idx in &out[v] {
            let w = edges[idx].w;
            indegree[w] -= 1;
            if indegree[w] == 0 {
                queue.push_back(w);
            }
        }
    }
    // A cyclic input is a caller bug; ranking what was reached keeps the result usable.
    if topo.len() < node_count {
        let mut placed = vec![false; node_count];
        for &v in &topo {
            placed[v] = true;
        }
        topo.extend((0..node_count).filter(|&v| !placed[v]));
    }

    let mut rank: Vec<i32> = vec![0; node_count];
    for &v in topo.iter().rev() {
        rank[v] = out[v]
            .iter()
            .map(|&idx| rank[edges[idx].w] - edges[idx].minlen)
            .min()
            .unwrap_or(0);
    }

    for &v in &topo {
        if !out[v].is_empty() || inn[v].is_empty() {
            continue;
        }
        rank[v] = inn[v]
            .iter()
            .map(|&idx| rank[edges[idx].v] + edges[idx].minlen)
            .max()
            .unwrap_or(rank[v]);
    }

    let min = rank.iter().copied().min().unwrap_or(0);
    for r in &mut rank {
        *r -= min;
    }
    rank
}
