use std::sync::OnceLock;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Arc, ArcSet, GraphError, NodeId, NodeProperty, NodeSet, Result, UndiGraph};

/// Directed graph.
///
/// The topological order and the moral graph are computed lazily and cached until the next
/// mutation. Ids handed out by [`DiGraph::add_node`] are never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiGraph {
    parents: NodeProperty<NodeSet>,
    children: NodeProperty<NodeSet>,
    next_id: NodeId,
    nb_arcs: usize,
    #[serde(skip)]
    topological_order: OnceLock<std::result::Result<Vec<NodeId>, GraphError>>,
    #[serde(skip)]
    moral_graph: OnceLock<UndiGraph>,
}

impl PartialEq for DiGraph {
    fn eq(&self, other: &Self) -> bool {
        self.parents == other.parents && self.children == other.children
    }
}
impl Eq for DiGraph {}

impl DiGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn invalidate(&mut self) {
        self.topological_order.take();
        self.moral_graph.take();
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.parents.insert(id, NodeSet::new());
        self.children.insert(id, NodeSet::new());
        self.invalidate();
        id
    }

    pub fn add_node_with_id(&mut self, id: NodeId) -> Result<()> {
        if self.parents.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.parents.insert(id, NodeSet::new());
        self.children.insert(id, NodeSet::new());
        self.next_id = self.next_id.max(id + 1);
        self.invalidate();
        Ok(())
    }

    pub fn erase_node(&mut self, id: NodeId) -> Result<()> {
        let parents = self.parents.remove(&id).ok_or(GraphError::NoNode(id))?;
        let children = self.children.remove(&id).unwrap_or_default();
        for p in parents.iter() {
            if let Some(c) = self.children.get_mut(p) {
                c.remove(&id);
            }
        }
        for c in children.iter() {
            if let Some(p) = self.parents.get_mut(c) {
                p.remove(&id);
            }
        }
        self.nb_arcs -= parents.len() + children.len();
        self.invalidate();
        Ok(())
    }

    pub fn exists_node(&self, id: NodeId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Insert arc `tail -> head`. Cycles are not checked here, see
    /// [`DiGraph::add_arc_acyclic`].
    pub fn add_arc(&mut self, tail: NodeId, head: NodeId) -> Result<bool> {
        if tail == head {
            return Err(GraphError::SelfLoop(tail));
        }
        if !self.exists_node(tail) {
            return Err(GraphError::NoNode(tail));
        }
        let inserted = self
            .parents
            .get_mut(&head)
            .ok_or(GraphError::NoNode(head))?
            .insert(tail);
        if inserted {
            if let Some(c) = self.children.get_mut(&tail) {
                c.insert(head);
            }
            self.nb_arcs += 1;
            self.invalidate();
        }
        Ok(inserted)
    }

    /// Insert arc `tail -> head`, failing if it would close a directed cycle.
    pub fn add_arc_acyclic(&mut self, tail: NodeId, head: NodeId) -> Result<bool> {
        if self.exists_node(tail) && self.exists_node(head) && self.has_directed_path(head, tail)
        {
            return Err(GraphError::Cycle { tail, head });
        }
        self.add_arc(tail, head)
    }

    pub fn erase_arc(&mut self, tail: NodeId, head: NodeId) -> bool {
        let removed = self
            .parents
            .get_mut(&head)
            .map(|p| p.remove(&tail))
            .unwrap_or(false);
        if removed {
            if let Some(c) = self.children.get_mut(&tail) {
                c.remove(&head);
            }
            self.nb_arcs -= 1;
            self.invalidate();
        }
        removed
    }

    pub fn exists_arc(&self, tail: NodeId, head: NodeId) -> bool {
        self.parents
            .get(&head)
            .map(|p| p.contains(&tail))
            .unwrap_or(false)
    }

    pub fn parents(&self, id: NodeId) -> Result<&NodeSet> {
        self.parents.get(&id).ok_or(GraphError::NoNode(id))
    }

    pub fn children(&self, id: NodeId) -> Result<&NodeSet> {
        self.children.get(&id).ok_or(GraphError::NoNode(id))
    }

    /// The node and its parents.
    pub fn family(&self, id: NodeId) -> Result<NodeSet> {
        let mut family = self.parents(id)?.clone();
        family.insert(id);
        Ok(family)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.parents.keys().copied()
    }

    pub fn node_set(&self) -> NodeSet {
        self.parents.keys().copied().collect()
    }

    pub fn arcs(&self) -> impl Iterator<Item = Arc> + '_ {
        self.children
            .iter()
            .flat_map(|(t, c)| c.iter().map(move |h| Arc::new(*t, *h)))
    }

    pub fn arc_set(&self) -> ArcSet {
        self.arcs().collect()
    }

    pub fn size(&self) -> usize {
        self.parents.len()
    }

    pub fn size_arcs(&self) -> usize {
        self.nb_arcs
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn has_directed_path(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = NodeSet::new();
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            if n == to {
                return true;
            }
            if seen.insert(n) {
                if let Some(c) = self.children.get(&n) {
                    stack.extend(c.iter().copied());
                }
            }
        }
        false
    }

    /// Nodes from which there is a directed path to a node of `targets`, `targets` included.
    pub fn ancestors(&self, targets: &NodeSet) -> NodeSet {
        let mut seen = NodeSet::new();
        let mut stack: Vec<NodeId> = targets.iter().copied().collect();
        while let Some(n) = stack.pop() {
            if seen.insert(n) {
                if let Some(p) = self.parents.get(&n) {
                    stack.extend(p.iter().copied());
                }
            }
        }
        seen
    }

    /// Topological order, lowest id first among ready nodes. Cached until the next mutation.
    pub fn topological_order(&self) -> Result<&[NodeId]> {
        self.topological_order
            .get_or_init(|| self.compute_topological_order())
            .as_ref()
            .map(|v| v.as_slice())
            .map_err(|e| e.clone())
    }

    fn compute_topological_order(&self) -> Result<Vec<NodeId>> {
        let mut in_degree: NodeProperty<usize> =
            self.parents.iter().map(|(n, p)| (*n, p.len())).collect();
        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut order = Vec::with_capacity(self.size());
        while let Some(n) = ready.pop_first() {
            order.push(n);
            for c in self.children[&n].iter() {
                let d = in_degree.get_mut(c).expect("child is a node");
                *d -= 1;
                if *d == 0 {
                    ready.insert(*c);
                }
            }
        }
        if order.len() == self.size() {
            Ok(order)
        } else {
            Err(GraphError::Cyclic)
        }
    }

    /// Undirected graph linking each node to its parents and the parents of a common child
    /// together. Cached until the next mutation.
    pub fn moral_graph(&self) -> &UndiGraph {
        self.moral_graph.get_or_init(|| {
            let mut moral = UndiGraph::new();
            for n in self.nodes() {
                moral
                    .add_node_with_id(n)
                    .expect("node ids of a graph are unique");
            }
            for (child, parents) in self.parents.iter() {
                for p in parents.iter() {
                    moral.add_edge(*p, *child).expect("endpoints are nodes");
                }
                moral.make_complete(parents).expect("parents are nodes");
            }
            moral
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moral_graph_marries_parents() {
        let mut g = DiGraph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        g.add_arc(a, c).unwrap();
        g.add_arc(b, c).unwrap();
        assert!(g.moral_graph().exists_edge(a, b));
        assert_eq!(g.moral_graph().size_edges(), 3);
        g.erase_arc(b, c);
        assert!(!g.moral_graph().exists_edge(a, b));
    }

    #[test]
    fn topological_order_is_invalidated() {
        let mut g = DiGraph::new();
        let a = g.add_node();
        let b = g.add_node();
        assert_eq!(g.topological_order().unwrap(), &[a, b]);
        g.add_arc(b, a).unwrap();
        assert_eq!(g.topological_order().unwrap(), &[b, a]);
        g.add_arc(a, b).unwrap();
        assert_eq!(g.topological_order(), Err(GraphError::Cyclic));
    }

    #[test]
    fn acyclic_insertion() {
        let mut g = DiGraph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        g.add_arc_acyclic(a, b).unwrap();
        g.add_arc_acyclic(b, c).unwrap();
        assert_eq!(
            g.add_arc_acyclic(c, a),
            Err(GraphError::Cycle { tail: c, head: a })
        );
        assert_eq!(g.size_arcs(), 2);
    }
}
