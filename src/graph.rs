//! A minimal general-purpose graph.
//!
//! Vertices are hashable keys of type `V` carrying opaque payload `T`.  The
//! graph can be directed or undirected; for an undirected graph, adding an
//! edge installs both directions transparently.  Both the control-flow graph
//! (`Graph<usize, BasicBlock>`) and the interference graph
//! (`Graph<Ident, ()>`) are instances of this type.
//!
//! Vertex iteration follows insertion order and neighbour sets are ordered,
//! so every traversal is deterministic.  The register allocator relies on
//! this for reproducible results.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Directed,
    Undirected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("vertex {0} already added to graph")]
    DuplicateVertex(String),
    #[error("unknown vertex: {0}")]
    UnknownVertex(String),
}

pub struct Graph<V, T> {
    kind: GraphKind,
    data: HashMap<V, T>,
    /// Vertices in insertion order.
    order: Vec<V>,
    edges: HashMap<V, BTreeSet<V>>,
}

impl<V, T> Graph<V, T>
where
    V: Eq + Ord + Hash + Clone + fmt::Debug,
{
    pub fn new(kind: GraphKind) -> Self {
        Graph {
            kind,
            data: HashMap::new(),
            order: Vec::new(),
            edges: HashMap::new(),
        }
    }

    /// Adds a new vertex `v` with associated data `x`.
    pub fn add_vertex(&mut self, v: V, x: T) -> Result<(), GraphError> {
        if self.data.contains_key(&v) {
            return Err(GraphError::DuplicateVertex(format!("{v:?}")));
        }
        self.order.push(v.clone());
        self.data.insert(v, x);
        Ok(())
    }

    pub fn has_vertex(&self, v: &V) -> bool {
        self.data.contains_key(v)
    }

    fn assert_vertex(&self, v: &V) -> Result<(), GraphError> {
        if self.data.contains_key(v) {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex(format!("{v:?}")))
        }
    }

    /// Adds an edge from `src` to `tgt`.  Both endpoints must already be
    /// vertices.  For an undirected graph, the reverse edge is added as well.
    pub fn add_edge(&mut self, src: V, tgt: V) -> Result<(), GraphError> {
        self.assert_vertex(&src)?;
        self.assert_vertex(&tgt)?;
        if self.kind == GraphKind::Undirected {
            self.edges.entry(tgt.clone()).or_default().insert(src.clone());
        }
        self.edges.entry(src).or_default().insert(tgt);
        Ok(())
    }

    /// Returns the data associated with vertex `v`.
    pub fn get_data(&self, v: &V) -> Result<&T, GraphError> {
        self.data.get(v).ok_or_else(|| GraphError::UnknownVertex(format!("{v:?}")))
    }

    /// All vertices, in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.order.iter()
    }

    /// All vertex payloads, in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.order.iter().map(|v| &self.data[v])
    }

    pub fn vertex_count(&self) -> usize {
        self.order.len()
    }

    /// All vertices `w` with an edge from `v` to `w`.  Empty for vertices
    /// with no outgoing edges; never an error.
    pub fn succs(&self, v: &V) -> Vec<&V> {
        match self.edges.get(v) {
            Some(set) => set.iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn has_edge(&self, src: &V, tgt: &V) -> bool {
        self.edges.get(src).is_some_and(|s| s.contains(tgt))
    }

    /// All edges of the graph.  An undirected edge appears in both
    /// orientations.
    pub fn edges(&self) -> Vec<(&V, &V)> {
        let mut res = Vec::new();
        for src in &self.order {
            if let Some(tgts) = self.edges.get(src) {
                for tgt in tgts {
                    res.push((src, tgt));
                }
            }
        }
        res
    }
}

impl<V, T> fmt::Debug for Graph<V, T>
where
    V: Eq + Ord + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Graph(vertices={:?}, edges={:?})", self.order, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_vertex_rejected() {
        let mut g: Graph<u32, ()> = Graph::new(GraphKind::Directed);
        g.add_vertex(1, ()).unwrap();
        assert!(matches!(g.add_vertex(1, ()), Err(GraphError::DuplicateVertex(_))));
    }

    #[test]
    fn edge_requires_both_endpoints() {
        let mut g: Graph<u32, ()> = Graph::new(GraphKind::Directed);
        g.add_vertex(1, ()).unwrap();
        assert!(matches!(g.add_edge(1, 2), Err(GraphError::UnknownVertex(_))));
        assert!(matches!(g.add_edge(2, 1), Err(GraphError::UnknownVertex(_))));
    }

    #[test]
    fn undirected_edge_goes_both_ways() {
        let mut g: Graph<u32, ()> = Graph::new(GraphKind::Undirected);
        g.add_vertex(1, ()).unwrap();
        g.add_vertex(2, ()).unwrap();
        g.add_edge(1, 2).unwrap();
        assert!(g.has_edge(&1, &2));
        assert!(g.has_edge(&2, &1));
    }

    #[test]
    fn succs_of_isolated_vertex_is_empty() {
        let mut g: Graph<u32, ()> = Graph::new(GraphKind::Directed);
        g.add_vertex(7, ()).unwrap();
        assert!(g.succs(&7).is_empty());
        assert!(g.succs(&99).is_empty());
    }

    #[test]
    fn vertices_iterate_in_insertion_order() {
        let mut g: Graph<u32, &str> = Graph::new(GraphKind::Directed);
        for (i, name) in [(3, "c"), (1, "a"), (2, "b")] {
            g.add_vertex(i, name).unwrap();
        }
        let order: Vec<u32> = g.vertices().copied().collect();
        assert_eq!(order, vec![3, 1, 2]);
    }
}
