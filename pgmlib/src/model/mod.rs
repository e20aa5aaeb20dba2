//! Graphical models consumed by the inference engines.
//!
//! Engines only read a model through [`GraphicalModel`]; they never mutate it. A model is
//! shared with an engine through an `Arc`, so it cannot change while an engine holds it.

mod bayes_net;
mod markov_random_field;

pub use bayes_net::BayesNet;
pub use markov_random_field::MarkovRandomField;

use std::fmt::Debug;

use indexmap::IndexMap;
use pgmgraph::UndiGraph;

use crate::{DiscreteVariable, DomainSizes, NodeId, NodeSet, PgmError, Potential, Result};

/// Variable names to node ids, in insertion order.
pub(crate) type NamedNodes = IndexMap<String, NodeId>;

pub trait GraphicalModel: Debug + Send + Sync {
    /// Number of variables.
    fn size(&self) -> usize;

    fn nodes(&self) -> NodeSet;

    fn variable(&self, node: NodeId) -> Result<&DiscreteVariable>;

    fn id_from_name(&self, name: &str) -> Result<NodeId>;

    fn variable_by_name(&self, name: &str) -> Result<&DiscreteVariable> {
        self.variable(self.id_from_name(name)?)
    }

    fn domain_sizes(&self) -> DomainSizes {
        self.nodes()
            .into_iter()
            .filter_map(|n| self.variable(n).ok().map(|v| (n, v.domain_size())))
            .collect()
    }

    /// Undirected graph in which the scope of every local table is complete: the moral
    /// graph of a Bayesian network, the interaction graph of a Markov random field.
    fn moral_graph(&self) -> UndiGraph;

    /// All the local tables (CPTs or factors).
    fn factors(&self) -> Vec<&Potential>;

    /// Local tables needed to answer a query over `query` (targets and observed nodes).
    /// Tables that provably sum to one once the others are fixed may be left out.
    fn relevant_factors(&self, query: &NodeSet) -> Vec<&Potential> {
        let _ = query;
        self.factors()
    }
}

fn unknown_node(node: NodeId) -> PgmError {
    PgmError::NotFound(format!("node {} in the model", node))
}

fn unknown_name(name: &str) -> PgmError {
    PgmError::NotFound(format!("variable {}", name))
}

/// Complete every factor scope in `graph`, which must contain the nodes of the scopes.
fn complete_scopes<'a>(
    graph: &mut UndiGraph,
    scopes: impl IntoIterator<Item = &'a Potential>,
) -> Result<()> {
    for p in scopes {
        graph.make_complete(&p.var_set())?;
    }
    Ok(())
}
