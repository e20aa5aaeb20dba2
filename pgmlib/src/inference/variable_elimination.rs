use std::sync::Arc;

use pgmgraph::UndiGraph;
use tracing::debug;

use super::{normalized_marginal, total_mass, Evidence, EvidenceSet};
use crate::model::GraphicalModel;
use crate::triangulation::{
    EliminationHeuristic, EliminationSequenceStrategy, PartialOrderedEliminationSequenceStrategy,
};
use crate::{DomainSizes, NodeId, NodeProperty, NodeSet, Potential, Result, TableAlgebra};

/// Variable elimination: each query combines the relevant tables of the model and sums out
/// the other variables, in the order chosen by an elimination heuristic.
///
/// Nothing is cached between queries.
#[derive(Debug)]
pub struct VariableElimination<M: GraphicalModel> {
    model: Arc<M>,
    algebra: TableAlgebra,
    heuristic: EliminationHeuristic,
    evidence: EvidenceSet,
}

impl<M: GraphicalModel> VariableElimination<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            model,
            algebra: TableAlgebra::default(),
            heuristic: EliminationHeuristic::default(),
            evidence: EvidenceSet::default(),
        }
    }

    pub fn with_heuristic(mut self, heuristic: EliminationHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    pub fn set_model(&mut self, model: Arc<M>) {
        self.model = model;
        self.evidence.clear();
    }

    pub fn set_algebra(&mut self, algebra: TableAlgebra) {
        self.algebra = algebra;
    }

    pub fn add_evidence(&mut self, node: NodeId, value: usize) -> Result<()> {
        self.evidence
            .add(self.model.as_ref(), node, Evidence::Hard(value))
    }

    pub fn add_evidence_by_label(&mut self, node: NodeId, label: &str) -> Result<()> {
        let value = self.model.variable(node)?.index_of(label)?;
        self.add_evidence(node, value)
    }

    pub fn add_soft_evidence(&mut self, node: NodeId, likelihood: Vec<f64>) -> Result<()> {
        self.evidence
            .add(self.model.as_ref(), node, Evidence::Soft(likelihood))
    }

    pub fn chg_evidence(&mut self, node: NodeId, evidence: Evidence) -> Result<()> {
        self.evidence.change(self.model.as_ref(), node, evidence)
    }

    pub fn erase_evidence(&mut self, node: NodeId) -> Result<()> {
        self.evidence.erase(node)
    }

    pub fn erase_all_evidence(&mut self) {
        self.evidence.clear();
    }

    pub fn evidence(&self) -> &NodeProperty<Evidence> {
        self.evidence.all()
    }

    /// Tables left once every node outside `keep` has been eliminated.
    fn eliminate(&self, keep: &NodeSet) -> Result<Vec<Potential>> {
        let mut query = keep.clone();
        query.extend(self.evidence.nodes());
        let mut tables: Vec<Potential> = self
            .model
            .relevant_factors(&query)
            .into_iter()
            .map(|f| self.algebra.from_probabilities(f.clone()))
            .collect();
        tables.extend(
            self.evidence
                .tables()
                .map(|(_, t)| self.algebra.from_probabilities(t.clone())),
        );

        let mut graph = UndiGraph::new();
        let mut domain_sizes = DomainSizes::new();
        for n in tables.iter().flat_map(|t| t.vars().to_vec()).chain(keep.iter().copied()) {
            if !graph.exists_node(n) {
                graph.add_node_with_id(n)?;
                domain_sizes.insert(n, self.model.variable(n)?.domain_size());
            }
        }
        for t in tables.iter() {
            graph.make_complete(&t.var_set())?;
        }
        let to_eliminate: NodeSet = graph.node_set().difference(keep).copied().collect();
        let mut strategy = PartialOrderedEliminationSequenceStrategy::new(
            self.heuristic,
            vec![to_eliminate.clone()],
        )?;
        strategy.set_graph(Some(&graph), Some(&domain_sizes))?;

        for _ in 0..to_eliminate.len() {
            let node = strategy.next_node_to_eliminate()?;
            strategy.elimination_update(node)?;
            let (bucket, rest): (Vec<Potential>, Vec<Potential>) =
                tables.into_iter().partition(|t| t.contains(node));
            tables = rest;
            let combined = self.algebra.combine_all(bucket.iter())?;
            tables.push(combined.project(&NodeSet::from([node]), self.algebra.project));
        }
        debug!(
            tables = tables.len(),
            eliminated = to_eliminate.len(),
            "variable elimination done"
        );
        Ok(tables)
    }

    /// Normalized marginal of `node` given the evidence.
    pub fn posterior(&self, node: NodeId) -> Result<Potential> {
        self.joint_posterior(&NodeSet::from([node]))
    }

    pub fn posterior_by_name(&self, name: &str) -> Result<Potential> {
        self.posterior(self.model.id_from_name(name)?)
    }

    /// Normalized joint marginal of `nodes`, variables in increasing id order.
    pub fn joint_posterior(&self, nodes: &NodeSet) -> Result<Potential> {
        for n in nodes.iter() {
            self.model.variable(*n)?;
        }
        let tables = self.eliminate(nodes)?;
        let belief = self.algebra.combine_all(tables.iter())?;
        normalized_marginal(self.model.as_ref(), &self.algebra, &belief, nodes)
    }

    /// Probability of the evidence.
    pub fn evidence_probability(&self) -> Result<f64> {
        let tables = self.eliminate(&NodeSet::new())?;
        total_mass(&self.algebra, &self.algebra.combine_all(tables.iter())?)
    }
}
