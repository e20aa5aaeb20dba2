use std::fmt::Debug;

use pgmgraph::CliqueGraph;
use serde::{Deserialize, Serialize};

use super::EliminationRecord;
use crate::{NodeId, NodeProperty, NodeSet, PgmError, Result};

/// A junction tree (a forest when the graph is not connected) and, for each node of the
/// triangulated graph, the clique created by its elimination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JunctionTree {
    tree: CliqueGraph,
    created_cliques: NodeProperty<NodeId>,
}

impl JunctionTree {
    pub fn new(tree: CliqueGraph, created_cliques: NodeProperty<NodeId>) -> Self {
        Self {
            tree,
            created_cliques,
        }
    }
    pub fn tree(&self) -> &CliqueGraph {
        &self.tree
    }
    /// Clique where the table of a family containing `node` and later eliminated nodes fits.
    pub fn created_clique(&self, node: NodeId) -> Result<NodeId> {
        self.created_cliques
            .get(&node)
            .copied()
            .ok_or_else(|| PgmError::NotFound(format!("node {} in the junction tree", node)))
    }
    pub fn created_cliques(&self) -> &NodeProperty<NodeId> {
        &self.created_cliques
    }
}

/// Lowest clique id of each connected component.
pub fn component_roots(tree: &CliqueGraph) -> NodeSet {
    tree.graph()
        .connected_components()
        .into_iter()
        .filter_map(|c| c.first().copied())
        .collect()
}

pub trait JunctionTreeStrategy: Debug + Send {
    /// Whether the elimination must record fill-in edges for [`JunctionTreeStrategy::build`].
    fn requires_fill_ins(&self) -> bool;

    fn build(&self, elimination: &EliminationRecord) -> Result<JunctionTree>;

    fn new_factory(&self) -> Box<dyn JunctionTreeStrategy>;
}

/// Junction tree obtained from the elimination tree by merging every clique into a
/// neighbour that contains it, so that only maximal cliques remain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultJunctionTreeStrategy;

impl JunctionTreeStrategy for DefaultJunctionTreeStrategy {
    fn requires_fill_ins(&self) -> bool {
        false
    }

    fn build(&self, elimination: &EliminationRecord) -> Result<JunctionTree> {
        let mut tree = elimination.elimination_tree().clone();
        let mut created: NodeProperty<NodeId> =
            elimination.order().iter().map(|n| (*n, *n)).collect();
        let mut changed = true;
        while changed {
            changed = false;
            for &c in elimination.order() {
                if !tree.graph().exists_node(c) {
                    continue;
                }
                let clique = tree.clique(c)?;
                let mut target = None;
                for n in tree.neighbours(c)?.iter() {
                    if clique.is_subset(tree.clique(*n)?) {
                        target = Some(*n);
                        break;
                    }
                }
                if let Some(t) = target {
                    let others: Vec<NodeId> = tree
                        .neighbours(c)?
                        .iter()
                        .copied()
                        .filter(|n| *n != t)
                        .collect();
                    tree.erase_clique(c)?;
                    for n in others {
                        tree.add_edge(n, t)?;
                    }
                    created.values_mut().filter(|v| **v == c).for_each(|v| *v = t);
                    changed = true;
                }
            }
        }
        tree.check_junction_tree()?;
        Ok(JunctionTree::new(tree, created))
    }

    fn new_factory(&self) -> Box<dyn JunctionTreeStrategy> {
        Box::new(*self)
    }
}
