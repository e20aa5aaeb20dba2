use std::collections::VecDeque;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Edge, EdgeSet, GraphError, NodeId, NodeProperty, NodeSet, Result};

/// Undirected graph stored as adjacency sets.
///
/// Ids handed out by [`UndiGraph::add_node`] are never reused, even after the node is erased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndiGraph {
    adjacency: NodeProperty<NodeSet>,
    next_id: NodeId,
    nb_edges: usize,
}

impl UndiGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph with nodes `0..n` and no edge.
    pub fn with_nodes(n: usize) -> Self {
        Self {
            adjacency: (0..n).map(|i| (i, NodeSet::new())).collect(),
            next_id: n,
            nb_edges: 0,
        }
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.adjacency.insert(id, NodeSet::new());
        id
    }

    pub fn add_node_with_id(&mut self, id: NodeId) -> Result<()> {
        if self.adjacency.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.adjacency.insert(id, NodeSet::new());
        self.next_id = self.next_id.max(id + 1);
        Ok(())
    }

    /// Erase a node together with all its incident edges.
    pub fn erase_node(&mut self, id: NodeId) -> Result<()> {
        let neighbours = self.adjacency.remove(&id).ok_or(GraphError::NoNode(id))?;
        for n in neighbours.iter() {
            if let Some(adj) = self.adjacency.get_mut(n) {
                adj.remove(&id);
            }
        }
        self.nb_edges -= neighbours.len();
        Ok(())
    }

    pub fn exists_node(&self, id: NodeId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Insert edge `a - b`. Returns `false` if the edge was already present.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        if !self.adjacency.contains_key(&b) {
            return Err(GraphError::NoNode(b));
        }
        let inserted = self
            .adjacency
            .get_mut(&a)
            .ok_or(GraphError::NoNode(a))?
            .insert(b);
        if inserted {
            if let Some(adj) = self.adjacency.get_mut(&b) {
                adj.insert(a);
            }
            self.nb_edges += 1;
        }
        Ok(inserted)
    }

    /// Remove edge `a - b`. Returns `false` if there was no such edge.
    pub fn erase_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        let removed = self
            .adjacency
            .get_mut(&a)
            .map(|adj| adj.remove(&b))
            .unwrap_or(false);
        if removed {
            if let Some(adj) = self.adjacency.get_mut(&b) {
                adj.remove(&a);
            }
            self.nb_edges -= 1;
        }
        removed
    }

    pub fn exists_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(&a)
            .map(|adj| adj.contains(&b))
            .unwrap_or(false)
    }

    pub fn neighbours(&self, id: NodeId) -> Result<&NodeSet> {
        self.adjacency.get(&id).ok_or(GraphError::NoNode(id))
    }

    pub fn degree(&self, id: NodeId) -> Result<usize> {
        self.neighbours(id).map(|n| n.len())
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn node_set(&self) -> NodeSet {
        self.adjacency.keys().copied().collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().flat_map(|(a, adj)| {
            adj.range((a + 1)..).map(move |b| Edge::new(*a, *b))
        })
    }

    pub fn edge_set(&self) -> EdgeSet {
        self.edges().collect()
    }

    pub fn size(&self) -> usize {
        self.adjacency.len()
    }

    pub fn size_edges(&self) -> usize {
        self.nb_edges
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Whether the nodes of `set` are pairwise adjacent.
    pub fn is_complete_set(&self, set: &NodeSet) -> bool {
        set.iter()
            .tuple_combinations()
            .all(|(a, b)| self.exists_edge(*a, *b))
    }

    /// Connect every pair of nodes of `set`. Returns the edges that were added.
    pub fn make_complete(&mut self, set: &NodeSet) -> Result<EdgeSet> {
        let mut added = EdgeSet::new();
        for (a, b) in set.iter().tuple_combinations() {
            if self.add_edge(*a, *b)? {
                added.insert(Edge::new(*a, *b));
            }
        }
        Ok(added)
    }

    pub fn connected_components(&self) -> Vec<NodeSet> {
        let mut seen = NodeSet::new();
        let mut components = Vec::new();
        for start in self.nodes() {
            if seen.contains(&start) {
                continue;
            }
            let mut component = NodeSet::new();
            let mut queue = VecDeque::from([start]);
            seen.insert(start);
            while let Some(n) = queue.pop_front() {
                component.insert(n);
                for m in self.adjacency[&n].iter() {
                    if seen.insert(*m) {
                        queue.push_back(*m);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    /// Shortest path (in number of edges) from `from` to `to`, both included.
    pub fn path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        if !self.exists_node(from) || !self.exists_node(to) {
            return None;
        }
        let mut pred = NodeProperty::new();
        pred.insert(from, from);
        let mut queue = VecDeque::from([from]);
        while let Some(n) = queue.pop_front() {
            if n == to {
                let mut path = vec![to];
                let mut cur = to;
                while cur != from {
                    cur = pred[&cur];
                    path.push(cur);
                }
                path.reverse();
                return Some(path);
            }
            for m in self.adjacency[&n].iter() {
                if !pred.contains_key(m) {
                    pred.insert(*m, n);
                    queue.push_back(*m);
                }
            }
        }
        None
    }

    pub fn induced_subgraph(&self, nodes: &NodeSet) -> UndiGraph {
        let adjacency: NodeProperty<NodeSet> = self
            .adjacency
            .iter()
            .filter(|(id, _)| nodes.contains(id))
            .map(|(id, adj)| (*id, adj.intersection(nodes).copied().collect()))
            .collect();
        let nb_edges = adjacency.values().map(|a| a.len()).sum::<usize>() / 2;
        UndiGraph {
            adjacency,
            next_id: self.next_id,
            nb_edges,
        }
    }

    /// Maximum cardinality search: visit order where each node is the unvisited node with
    /// the most visited neighbours (lowest id on ties).
    pub fn max_cardinality_search(&self) -> Vec<NodeId> {
        let mut weights: NodeProperty<usize> = self.nodes().map(|n| (n, 0)).collect();
        let mut order = Vec::with_capacity(self.size());
        while !weights.is_empty() {
            let (&best, _) = weights
                .iter()
                .rev()
                .max_by_key(|(_, w)| **w)
                .expect("weights is not empty");
            weights.remove(&best);
            for n in self.adjacency[&best].iter() {
                if let Some(w) = weights.get_mut(n) {
                    *w += 1;
                }
            }
            order.push(best);
        }
        order
    }

    /// Reverse of the maximum cardinality search order. This is a perfect elimination
    /// ordering whenever the graph is chordal.
    pub fn perfect_elimination_order(&self) -> Vec<NodeId> {
        let mut order = self.max_cardinality_search();
        order.reverse();
        order
    }

    /// Whether every cycle of length at least four has a chord.
    pub fn is_chordal(&self) -> bool {
        let order = self.perfect_elimination_order();
        let position: NodeProperty<usize> =
            order.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        order.iter().all(|n| {
            let later: Vec<NodeId> = self.adjacency[n]
                .iter()
                .filter(|m| position[m] > position[n])
                .copied()
                .collect();
            match later.iter().min_by_key(|m| position[m]) {
                None => true,
                Some(first) => later
                    .iter()
                    .all(|m| m == first || self.exists_edge(*first, *m)),
            }
        })
    }
}
