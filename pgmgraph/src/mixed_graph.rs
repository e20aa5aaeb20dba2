use serde::{Deserialize, Serialize};

use crate::{DiGraph, GraphError, NodeId, NodeSet, Result, UndiGraph};

/// Graph holding both undirected edges and arcs over a single node set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedGraph {
    undirected: UndiGraph,
    directed: DiGraph,
}

impl MixedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = self.undirected.add_node();
        self.directed
            .add_node_with_id(id)
            .expect("both parts share the same ids");
        id
    }

    pub fn erase_node(&mut self, id: NodeId) -> Result<()> {
        self.undirected.erase_node(id)?;
        self.directed.erase_node(id)
    }

    pub fn exists_node(&self, id: NodeId) -> bool {
        self.undirected.exists_node(id)
    }

    /// Insert edge `a - b`. Fails if an arc already links the two nodes.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        if self.directed.exists_arc(a, b) || self.directed.exists_arc(b, a) {
            return Err(GraphError::NoEdge(a, b));
        }
        self.undirected.add_edge(a, b)
    }

    /// Insert arc `tail -> head`. Fails if an edge already links the two nodes.
    pub fn add_arc(&mut self, tail: NodeId, head: NodeId) -> Result<bool> {
        if self.undirected.exists_edge(tail, head) {
            return Err(GraphError::NoArc(tail, head));
        }
        self.directed.add_arc(tail, head)
    }

    pub fn erase_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        self.undirected.erase_edge(a, b)
    }

    pub fn erase_arc(&mut self, tail: NodeId, head: NodeId) -> bool {
        self.directed.erase_arc(tail, head)
    }

    pub fn exists_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.undirected.exists_edge(a, b)
    }

    pub fn exists_arc(&self, tail: NodeId, head: NodeId) -> bool {
        self.directed.exists_arc(tail, head)
    }

    pub fn neighbours(&self, id: NodeId) -> Result<&NodeSet> {
        self.undirected.neighbours(id)
    }

    pub fn parents(&self, id: NodeId) -> Result<&NodeSet> {
        self.directed.parents(id)
    }

    pub fn children(&self, id: NodeId) -> Result<&NodeSet> {
        self.directed.children(id)
    }

    /// Neighbours, parents and children of `id`.
    pub fn mixed_neighbours(&self, id: NodeId) -> Result<NodeSet> {
        let mut all = self.neighbours(id)?.clone();
        all.extend(self.parents(id)?.iter().copied());
        all.extend(self.children(id)?.iter().copied());
        Ok(all)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.undirected.nodes()
    }

    pub fn size(&self) -> usize {
        self.undirected.size()
    }

    /// Undirected graph where every arc is replaced by an edge.
    pub fn skeleton(&self) -> UndiGraph {
        let mut skeleton = self.undirected.clone();
        for arc in self.directed.arcs() {
            skeleton
                .add_edge(arc.tail(), arc.head())
                .expect("arc endpoints are nodes");
        }
        skeleton
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_and_arcs_do_not_overlap() {
        let mut g = MixedGraph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        g.add_edge(a, b).unwrap();
        g.add_arc(b, c).unwrap();
        assert!(g.add_arc(a, b).is_err());
        assert!(g.add_edge(c, b).is_err());
        assert_eq!(g.mixed_neighbours(b).unwrap(), NodeSet::from([a, c]));
        assert_eq!(g.skeleton().size_edges(), 2);
        g.erase_node(b).unwrap();
        assert!(!g.exists_arc(b, c));
        assert_eq!(g.skeleton().size_edges(), 0);
    }
}
