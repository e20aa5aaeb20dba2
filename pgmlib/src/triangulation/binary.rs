use itertools::Itertools;
use pgmgraph::{CliqueGraph, GraphError};
use tracing::debug;

use crate::{DomainSizes, NodeId, NodeProperty, NodeSet, Result};

/// Turns a junction tree into a binary one: once rooted, every clique has at most two
/// children.
///
/// A clique with more children gets a new child clique holding the union of the
/// separators of two of its children, which become the children of the new clique. The
/// pair whose union has the smallest table is chosen first (lowest ids on ties), which
/// keeps every combination of messages pairwise and as small as possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryJoinTreeConverter;

impl BinaryJoinTreeConverter {
    pub fn new() -> Self {
        Self
    }

    /// Binarize `tree`, rooted at `roots`. Components without a root in `roots` are rooted
    /// at their lowest clique id. Original clique ids are kept.
    pub fn convert(
        &self,
        tree: &CliqueGraph,
        domain_sizes: &DomainSizes,
        roots: &NodeSet,
    ) -> Result<CliqueGraph> {
        if !tree.is_join_tree() {
            return Err(GraphError::NotAJoinTree("the clique graph has a cycle".to_owned()).into());
        }
        let mut result = tree.clone();
        let log_size = |vars: &NodeSet| -> f64 {
            vars.iter()
                .map(|v| domain_sizes.get(v).map_or(0.0, |d| (*d as f64).ln()))
                .sum()
        };
        let mut created = 0;
        for root in effective_roots(tree, roots)? {
            // Parents are known before children are visited.
            let mut stack = vec![(root, None)];
            while let Some((node, parent)) = stack.pop() {
                let mut children: NodeSet = result.neighbours(node)?.clone();
                if let Some(p) = parent {
                    children.remove(&p);
                }
                while children.len() > 2 {
                    let seps: NodeProperty<NodeSet> = children
                        .iter()
                        .map(|c| -> Result<(NodeId, NodeSet)> {
                            Ok((*c, result.separator(node, *c)?.clone()))
                        })
                        .collect::<Result<_>>()?;
                    let (a, b) = children
                        .iter()
                        .tuple_combinations()
                        .map(|(a, b)| {
                            let union: NodeSet = seps[a].union(&seps[b]).copied().collect();
                            (*a, *b, log_size(&union))
                        })
                        .fold(None, |best: Option<(NodeId, NodeId, f64)>, cand| match best {
                            Some(best) if best.2 <= cand.2 => Some(best),
                            _ => Some(cand),
                        })
                        .map(|(a, b, _)| (a, b))
                        .expect("at least three children");
                    let union: NodeSet = seps[&a].union(&seps[&b]).copied().collect();
                    let k = result.add_clique(union);
                    result.erase_edge(node, a);
                    result.erase_edge(node, b);
                    result.add_edge(k, a)?;
                    result.add_edge(k, b)?;
                    result.add_edge(k, node)?;
                    children.remove(&a);
                    children.remove(&b);
                    children.insert(k);
                    created += 1;
                }
                for c in children {
                    stack.push((c, Some(node)));
                }
            }
        }
        debug!(
            cliques = result.size(),
            created, "junction tree binarized"
        );
        Ok(result)
    }

    /// Whether every clique has at most two children when rooted at `roots`.
    pub fn is_binary(tree: &CliqueGraph, roots: &NodeSet) -> Result<bool> {
        let roots = effective_roots(tree, roots)?;
        Ok(tree.nodes().all(|n| {
            let degree = tree.neighbours(n).map_or(0, |nb| nb.len());
            if roots.contains(&n) {
                degree <= 2
            } else {
                degree <= 3
            }
        }))
    }
}

fn effective_roots(tree: &CliqueGraph, roots: &NodeSet) -> Result<NodeSet> {
    let mut result = NodeSet::new();
    for component in tree.graph().connected_components() {
        let mut given = component.intersection(roots).copied();
        let root = match (given.next(), given.next()) {
            (Some(r), None) => r,
            (None, _) => *component.first().expect("components are not empty"),
            (Some(_), Some(_)) => {
                return Err(GraphError::NotAJoinTree(format!(
                    "component {:?} has several roots",
                    component
                ))
                .into())
            }
        };
        result.insert(root);
    }
    Ok(result)
}
