use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{Edge, GraphError, NodeId, NodeProperty, NodeSet, Result, UndiGraph};

/// Undirected graph whose nodes carry a set of variables (a clique) and whose edges carry the
/// intersection of the cliques of their endpoints (a separator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliqueGraph {
    graph: UndiGraph,
    cliques: NodeProperty<NodeSet>,
    separators: BTreeMap<Edge, NodeSet>,
}

impl CliqueGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_clique(&mut self, clique: NodeSet) -> NodeId {
        let id = self.graph.add_node();
        self.cliques.insert(id, clique);
        id
    }

    pub fn add_clique_with_id(&mut self, id: NodeId, clique: NodeSet) -> Result<()> {
        self.graph.add_node_with_id(id)?;
        self.cliques.insert(id, clique);
        Ok(())
    }

    pub fn erase_clique(&mut self, id: NodeId) -> Result<()> {
        let neighbours = self.graph.neighbours(id)?.clone();
        for n in neighbours {
            self.separators.remove(&Edge::new(id, n));
        }
        self.graph.erase_node(id)?;
        self.cliques.remove(&id);
        Ok(())
    }

    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        let inserted = self.graph.add_edge(a, b)?;
        if inserted {
            let sep = self.cliques[&a]
                .intersection(&self.cliques[&b])
                .copied()
                .collect();
            self.separators.insert(Edge::new(a, b), sep);
        }
        Ok(inserted)
    }

    pub fn erase_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        self.separators.remove(&Edge::new(a, b));
        self.graph.erase_edge(a, b)
    }

    pub fn exists_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.graph.exists_edge(a, b)
    }

    pub fn clique(&self, id: NodeId) -> Result<&NodeSet> {
        self.cliques.get(&id).ok_or(GraphError::NoNode(id))
    }

    /// Replace the variables of a clique, updating the separators of its edges.
    pub fn set_clique(&mut self, id: NodeId, clique: NodeSet) -> Result<()> {
        let slot = self.cliques.get_mut(&id).ok_or(GraphError::NoNode(id))?;
        *slot = clique;
        self.refresh_separators(id)
    }

    pub fn add_to_clique(&mut self, id: NodeId, var: NodeId) -> Result<()> {
        self.cliques
            .get_mut(&id)
            .ok_or(GraphError::NoNode(id))?
            .insert(var);
        self.refresh_separators(id)
    }

    fn refresh_separators(&mut self, id: NodeId) -> Result<()> {
        for n in self.graph.neighbours(id)?.iter() {
            let sep = self.cliques[&id]
                .intersection(&self.cliques[n])
                .copied()
                .collect();
            self.separators.insert(Edge::new(id, *n), sep);
        }
        Ok(())
    }

    pub fn separator(&self, a: NodeId, b: NodeId) -> Result<&NodeSet> {
        self.separators
            .get(&Edge::new(a, b))
            .ok_or(GraphError::NoEdge(a, b))
    }

    pub fn neighbours(&self, id: NodeId) -> Result<&NodeSet> {
        self.graph.neighbours(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.nodes()
    }

    pub fn cliques(&self) -> impl Iterator<Item = (NodeId, &NodeSet)> + '_ {
        self.cliques.iter().map(|(id, c)| (*id, c))
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph.edges()
    }

    pub fn size(&self) -> usize {
        self.graph.size()
    }

    pub fn size_edges(&self) -> usize {
        self.graph.size_edges()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn graph(&self) -> &UndiGraph {
        &self.graph
    }

    /// Lowest-id clique containing all of `vars`.
    pub fn container_clique(&self, vars: &NodeSet) -> Option<NodeId> {
        self.cliques
            .iter()
            .find(|(_, c)| vars.is_subset(c))
            .map(|(id, _)| *id)
    }

    pub fn cliques_containing(&self, var: NodeId) -> NodeSet {
        self.cliques
            .iter()
            .filter(|(_, c)| c.contains(&var))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Whether the graph is a forest.
    pub fn is_join_tree(&self) -> bool {
        self.size_edges() + self.graph.connected_components().len() == self.size()
    }

    /// Whether, for every variable, the cliques containing it induce a connected subgraph.
    pub fn has_running_intersection(&self) -> bool {
        let mut holders: BTreeMap<NodeId, NodeSet> = BTreeMap::new();
        for (id, clique) in self.cliques.iter() {
            for v in clique.iter() {
                holders.entry(*v).or_default().insert(*id);
            }
        }
        holders.values().all(|cliques| {
            let Some(&start) = cliques.first() else {
                return true;
            };
            let mut seen = NodeSet::from([start]);
            let mut queue = VecDeque::from([start]);
            while let Some(c) = queue.pop_front() {
                for n in self.graph.neighbours(c).into_iter().flatten() {
                    if cliques.contains(n) && seen.insert(*n) {
                        queue.push_back(*n);
                    }
                }
            }
            seen.len() == cliques.len()
        })
    }

    /// Check both join-tree invariants, reporting the first violation.
    pub fn check_junction_tree(&self) -> Result<()> {
        if !self.is_join_tree() {
            return Err(GraphError::NotAJoinTree(format!(
                "{} cliques, {} edges, {} components",
                self.size(),
                self.size_edges(),
                self.graph.connected_components().len()
            )));
        }
        if !self.has_running_intersection() {
            return Err(GraphError::NotAJoinTree(
                "running intersection property violated".to_owned(),
            ));
        }
        Ok(())
    }
}
