//! Break cycles by reversing a DFS feedback arc set.
//!
//! Nodes are visited in insertion order and out-edges in edge insertion order, so the set of
//! reversed edges is stable for a given input. Self-loops never take part.

/// Returns, per edge, whether it must be reversed to make the graph acyclic.
pub(crate) fn feedback_arcs(node_count: usize, edges: &[(usize, usize)]) -> Vec<bool> {
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (idx, &(v, w)) in edges.iter().enumerate() {
        if v != w {
            out[v].push(idx);
        }
    }

    let mut visited = vec![false; node_count];
    let mut on_stack = vec![false; node_count];
    let mut reversed = vec![false; edges.len()];
    // (node, index of the next out-edge to look at)
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for root in 0..node_count {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        on_stack[root] = true;
        stack.push((root, 0));
        while let Some(top) = stack.last_mut() {
            let (v, next) = *top;
            let Some(&idx) = out[v].get(next) else {
                on_stack[v] = false;
                stack.pop();
                continue;
            };
            top.1 += 1;
            let w = edges[idx].1;
            if on_stack[w] {
                reversed[idx] = true;
            } else if !visited[w] {
                visited[w] = true;
                on_stack[w] = true;
                stack.push((w, 0));
            }
        }
    }
    reversed
}
