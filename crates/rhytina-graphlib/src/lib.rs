//! Directed graph container used by `rhytina`.
//!
//! Nodes and edges are stored in insertion order. Lookups go through Fx-hashed indices so the
//! iteration order never depends on hashing.
//!
//! The graph is simple: there is at most one edge per ordered `(v, w)` pair. Setting an edge for
//! a pair that already has one replaces its label and keeps its position.

#![forbid(unsafe_code)]

use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Endpoints of an edge, by node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub v: String,
    pub w: String,
}

#[derive(Debug, Clone)]
struct NodeEntry<N> {
    id: String,
    label: N,
}

#[derive(Debug, Clone)]
struct EdgeEntry<E> {
    key: EdgeKey,
    label: E,
}

#[derive(Debug, Clone)]
pub struct Graph<N, E, G> {
    graph_label: G,
    nodes: Vec<NodeEntry<N>>,
    node_index: HashMap<String, usize>,
    edges: Vec<EdgeEntry<E>>,
    /// Keyed by the insertion positions of the two endpoints.
    edge_index: HashMap<(usize, usize), usize>,
}

impl<N, E, G> Default for Graph<N, E, G>
where
    N: Default,
    E: Default,
    G: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E, G> Graph<N, E, G>
where
    N: Default,
    E: Default,
    G: Default,
{
    pub fn new() -> Self {
        Self {
            graph_label: G::default(),
            nodes: Vec::new(),
            node_index: HashMap::default(),
            edges: Vec::new(),
            edge_index: HashMap::default(),
        }
    }

    pub fn set_graph(&mut self, label: G) -> &mut Self {
        self.graph_label = label;
        self
    }

    pub fn graph(&self) -> &G {
        &self.graph_label
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph_label
    }

    /// Inserts a node, or replaces the label of an existing one without moving it.
    pub fn set_node(&mut self, id: impl Into<String>, label: N) -> &mut Self {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(&id) {
            self.nodes[idx].label = label;
            return self;
        }
        self.push_node(id, label);
        self
    }

    fn push_node(&mut self, id: String, label: N) -> usize {
        let idx = self.nodes.len();
        self.node_index.insert(id.clone(), idx);
        self.nodes.push(NodeEntry { id, label });
        idx
    }

    fn ensure_node(&mut self, id: &str) -> usize {
        match self.node_index.get(id) {
            Some(&idx) => idx,
            None => self.push_node(id.to_string(), N::default()),
        }
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx].label)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        let idx = self.node_index.get(id).copied()?;
        Some(&mut self.nodes[idx].label)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Position of `id` in insertion order.
    pub fn node_position(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeKey> {
        self.edges.iter().map(|e| &e.key)
    }

    pub fn edge_entries(&self) -> impl Iterator<Item = (&EdgeKey, &E)> {
        self.edges.iter().map(|e| (&e.key, &e.label))
    }

    /// Adds `v -> w` with a default label unless the pair already has an edge.
    pub fn set_edge(&mut self, v: &str, w: &str) -> &mut Self {
        let pair = (self.ensure_node(v), self.ensure_node(w));
        if !self.edge_index.contains_key(&pair) {
            self.push_edge(pair, v, w, E::default());
        }
        self
    }

    /// Adds `v -> w`, or overwrites the label of the pair's existing edge in place.
    /// Missing endpoints are created with default labels.
    pub fn set_edge_with_label(&mut self, v: &str, w: &str, label: E) -> &mut Self {
        let pair = (self.ensure_node(v), self.ensure_node(w));
        match self.edge_index.get(&pair) {
            Some(&idx) => self.edges[idx].label = label,
            None => self.push_edge(pair, v, w, label),
        }
        self
    }

    fn push_edge(&mut self, pair: (usize, usize), v: &str, w: &str, label: E) {
        self.edge_index.insert(pair, self.edges.len());
        self.edges.push(EdgeEntry {
            key: EdgeKey {
                v: v.to_string(),
                w: w.to_string(),
            },
            label,
        });
    }

    fn edge_slot(&self, v: &str, w: &str) -> Option<usize> {
        let pair = (self.node_position(v)?, self.node_position(w)?);
        self.edge_index.get(&pair).copied()
    }

    pub fn edge(&self, v: &str, w: &str) -> Option<&E> {
        self.edge_slot(v, w).map(|idx| &self.edges[idx].label)
    }

    pub fn edge_mut(&mut self, v: &str, w: &str) -> Option<&mut E> {
        let idx = self.edge_slot(v, w)?;
        Some(&mut self.edges[idx].label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_edge_for_a_pair_overwrites_in_place() {
        let mut g: Graph<(), &'static str, ()> = Graph::default();
        g.set_edge_with_label("a", "b", "first");
        g.set_edge_with_label("b", "c", "other");
        g.set_edge_with_label("a", "b", "second");

        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edge("a", "b"), Some(&"second"));
        let keys: Vec<(&str, &str)> = g.edges().map(|k| (k.v.as_str(), k.w.as_str())).collect();
        assert_eq!(keys, vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn unlabelled_set_keeps_an_existing_label() {
        let mut g: Graph<(), u8, ()> = Graph::default();
        g.set_edge_with_label("a", "b", 9);
        g.set_edge("a", "b");
        assert_eq!(g.edge("a", "b"), Some(&9));
        assert_eq!(g.edge("b", "a"), None);
    }

    #[test]
    fn edges_create_missing_nodes_in_order() {
        let mut g: Graph<u8, (), ()> = Graph::default();
        g.set_node("z", 7);
        g.set_edge("a", "z");
        assert_eq!(g.node_ids(), vec!["z".to_string(), "a".to_string()]);
        assert_eq!(g.node("z"), Some(&7));
        assert_eq!(g.node("a"), Some(&0));
        assert_eq!(g.node_position("a"), Some(1));
    }

    #[test]
    fn labels_are_mutable_through_lookups() {
        let mut g: Graph<u8, u8, u8> = Graph::default();
        g.set_edge_with_label("a", "a", 1);
        if let Some(e) = g.edge_mut("a", "a") {
            *e = 5;
        }
        if let Some(n) = g.node_mut("a") {
            *n = 3;
        }
        *g.graph_mut() = 2;
        assert_eq!((g.edge("a", "a"), g.node("a"), g.graph()), (Some(&5), Some(&3), &2));
        assert_eq!(g.node_count(), 1);
    }
}
