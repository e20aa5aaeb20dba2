//! Exact inference engines.
//!
//! [`ShaferShenoy`] passes messages on a junction tree and answers every posterior query
//! from one inference. [`VariableElimination`] answers each query separately, only touching
//! the tables relevant to it.

mod shafer_shenoy;
mod variable_elimination;

pub use shafer_shenoy::ShaferShenoy;
pub use variable_elimination::VariableElimination;

use serde::{Deserialize, Serialize};

use crate::model::GraphicalModel;
use crate::{NodeId, NodeProperty, NodeSet, PgmError, Potential, Result, TableAlgebra};

/// Observation of a single variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evidence {
    /// The variable takes this value.
    Hard(usize),
    /// Likelihood of each value of the variable.
    Soft(Vec<f64>),
}

/// Progress of a junction-tree engine.
///
/// `Prepared` engines have a junction tree and their tables assigned to cliques. `Dirty`
/// ones also have messages, which are stale because the evidence or the algebra changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InferenceState {
    Uninitialized,
    Prepared,
    Dirty,
    Inferred,
}

/// Evidence table of `node` in probability space, after checking it against the model.
pub(crate) fn evidence_table<M: GraphicalModel + ?Sized>(
    model: &M,
    node: NodeId,
    evidence: &Evidence,
) -> Result<Potential> {
    let var = model.variable(node)?;
    let ds = var.domain_size();
    match evidence {
        Evidence::Hard(value) => Potential::indicator(node, ds, *value).map_err(|_| {
            PgmError::OutOfBounds {
                var: var.name().to_owned(),
                value: *value,
                domain_size: ds,
            }
        }),
        Evidence::Soft(values) => {
            if values.len() != ds {
                return Err(PgmError::Size(format!(
                    "likelihood of {} has {} values for a domain of size {}",
                    var.name(),
                    values.len(),
                    ds
                )));
            }
            Potential::likelihood(node, values.clone())
        }
    }
}

/// Evidence shared by the engines.
#[derive(Debug, Clone, Default)]
pub(crate) struct EvidenceSet {
    evidence: NodeProperty<Evidence>,
    tables: NodeProperty<Potential>,
}

impl EvidenceSet {
    pub(crate) fn add<M: GraphicalModel + ?Sized>(
        &mut self,
        model: &M,
        node: NodeId,
        evidence: Evidence,
    ) -> Result<()> {
        if self.evidence.contains_key(&node) {
            return Err(PgmError::InvalidArgument(format!(
                "node {} already has evidence",
                node
            )));
        }
        let table = evidence_table(model, node, &evidence)?;
        self.evidence.insert(node, evidence);
        self.tables.insert(node, table);
        Ok(())
    }

    pub(crate) fn change<M: GraphicalModel + ?Sized>(
        &mut self,
        model: &M,
        node: NodeId,
        evidence: Evidence,
    ) -> Result<()> {
        if !self.evidence.contains_key(&node) {
            return Err(PgmError::NotFound(format!("evidence on node {}", node)));
        }
        let table = evidence_table(model, node, &evidence)?;
        self.evidence.insert(node, evidence);
        self.tables.insert(node, table);
        Ok(())
    }

    pub(crate) fn erase(&mut self, node: NodeId) -> Result<()> {
        self.tables.remove(&node);
        self.evidence
            .remove(&node)
            .map(|_| ())
            .ok_or_else(|| PgmError::NotFound(format!("evidence on node {}", node)))
    }

    pub(crate) fn clear(&mut self) {
        self.evidence.clear();
        self.tables.clear();
    }

    pub(crate) fn get(&self, node: NodeId) -> Option<&Evidence> {
        self.evidence.get(&node)
    }

    pub(crate) fn nodes(&self) -> NodeSet {
        self.evidence.keys().copied().collect()
    }

    pub(crate) fn all(&self) -> &NodeProperty<Evidence> {
        &self.evidence
    }

    /// Evidence tables in probability space, by node.
    pub(crate) fn tables(&self) -> impl Iterator<Item = (NodeId, &Potential)> + '_ {
        self.tables.iter().map(|(n, t)| (*n, t))
    }
}

/// Marginal over `vars` of the (unnormalized) `belief`, as a normalized probability table
/// with its variables in increasing id order.
pub(crate) fn normalized_marginal<M: GraphicalModel + ?Sized>(
    model: &M,
    algebra: &TableAlgebra,
    belief: &Potential,
    vars: &NodeSet,
) -> Result<Potential> {
    let order: Vec<NodeId> = vars.iter().copied().collect();
    let dims = order
        .iter()
        .map(|v| -> Result<usize> { Ok(model.variable(*v)?.domain_size()) })
        .collect::<Result<Vec<usize>>>()?;
    // Variables absent from the belief are uniform.
    let support = Potential::constant(order.clone(), dims, algebra.combine.neutral())?;
    let marginal = belief
        .project_onto(vars, algebra.project)
        .combine(&support, algebra.combine)?
        .reorganize(&order)?;
    let mut marginal = algebra.to_probabilities(marginal);
    marginal.normalize()?;
    Ok(marginal)
}

/// Total mass of `table` in probability space, for sum-based algebras.
pub(crate) fn total_mass(algebra: &TableAlgebra, table: &Potential) -> Result<f64> {
    let all = table.var_set();
    match algebra.project {
        crate::ProjectOp::Sum => Ok(table.project(&all, algebra.project).sum()),
        crate::ProjectOp::LogSumExp => Ok(table.project(&all, algebra.project).sum().exp()),
        op => Err(PgmError::OperationNotAllowed(format!(
            "the probability of evidence needs a sum projection, not {:?}",
            op
        ))),
    }
}
