use pgmgraph::{DiGraph, UndiGraph};
use serde::{Deserialize, Serialize};

use super::{unknown_name, unknown_node, GraphicalModel, NamedNodes};
use crate::multidim::{Aggregator, TableRepr};
use crate::{
    CombineOp, DiscreteVariable, NodeId, NodeProperty, NodeSet, PgmError, Potential, ProjectOp,
    Result,
};

/// Tolerance of [`BayesNet::check_cpts`].
const CPT_TOLERANCE: f64 = 1e-6;

/// Bayesian network: a DAG over discrete variables with one CPT per node.
///
/// The CPT of a node has the node as first variable, then its parents in the order the
/// arcs were added. A new node gets a uniform CPT. Adding an arc keeps the values of the
/// CPT (repeated for every value of the new parent); erasing one makes the CPT uniform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BayesNet {
    dag: DiGraph,
    variables: NodeProperty<DiscreteVariable>,
    names: NamedNodes,
    cpts: NodeProperty<Potential>,
}

impl BayesNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, var: DiscreteVariable) -> Result<NodeId> {
        if self.names.contains_key(var.name()) {
            return Err(PgmError::InvalidArgument(format!(
                "a variable named {} already exists",
                var.name()
            )));
        }
        let id = self.dag.add_node();
        let ds = var.domain_size();
        self.cpts
            .insert(id, Potential::constant(vec![id], vec![ds], 1.0 / ds as f64)?);
        self.names.insert(var.name().to_owned(), id);
        self.variables.insert(id, var);
        Ok(id)
    }

    pub fn erase_variable(&mut self, node: NodeId) -> Result<()> {
        let children = self.dag.children(node)?.clone();
        for c in children {
            self.erase_arc(node, c)?;
        }
        self.dag.erase_node(node)?;
        self.cpts.remove(&node);
        if let Some(var) = self.variables.remove(&node) {
            self.names.shift_remove(var.name());
        }
        Ok(())
    }

    /// Add `tail -> head`, failing if it would create a directed cycle.
    pub fn add_arc(&mut self, tail: NodeId, head: NodeId) -> Result<()> {
        let tail_ds = self.variable(tail)?.domain_size();
        self.variable(head)?;
        if !self.dag.add_arc_acyclic(tail, head)? {
            return Ok(());
        }
        let cpt = &self.cpts[&head];
        let new_cpt = match cpt.repr() {
            TableRepr::Aggregator(kind) => {
                let mut vars = cpt.vars().to_vec();
                vars.push(tail);
                self.aggregator_cpt(*kind, &vars)?
            }
            _ => cpt.combine(&Potential::new(vec![tail], vec![tail_ds])?, CombineOp::Multiply)?,
        };
        self.cpts.insert(head, new_cpt);
        Ok(())
    }

    pub fn erase_arc(&mut self, tail: NodeId, head: NodeId) -> Result<()> {
        if !self.dag.erase_arc(tail, head) {
            return Err(pgmgraph::GraphError::NoArc(tail, head).into());
        }
        let cpt = &self.cpts[&head];
        let vars: Vec<NodeId> = cpt.vars().iter().copied().filter(|v| *v != tail).collect();
        let new_cpt = match cpt.repr() {
            TableRepr::Aggregator(kind) => self.aggregator_cpt(*kind, &vars)?,
            _ => {
                let dims = self.dims(&vars)?;
                let ds = self.variable(head)?.domain_size();
                Potential::constant(vars, dims, 1.0 / ds as f64)?
            }
        };
        self.cpts.insert(head, new_cpt);
        Ok(())
    }

    /// Add `var` with the given parents and set its CPT values (node fastest,
    /// then parents in the given order).
    pub fn add_node_with_cpt(
        &mut self,
        var: DiscreteVariable,
        parents: &[NodeId],
        values: Vec<f64>,
    ) -> Result<NodeId> {
        let id = self.add_variable(var)?;
        for p in parents {
            self.add_arc(*p, id)?;
        }
        self.cpt_mut(id)?.fill_with(values)?;
        Ok(id)
    }

    fn dims(&self, vars: &[NodeId]) -> Result<Vec<usize>> {
        vars.iter()
            .map(|v| -> Result<usize> { Ok(self.variable(*v)?.domain_size()) })
            .collect()
    }

    fn aggregator_cpt(&self, kind: Aggregator, vars: &[NodeId]) -> Result<Potential> {
        let dims = self.dims(vars)?;
        let scope: Vec<(NodeId, usize)> = vars.iter().copied().zip(dims).collect();
        Potential::aggregator(kind, scope[0], &scope[1..])
    }

    /// Replace the CPT of `node` by a deterministic aggregation of its parents.
    pub fn set_aggregator(&mut self, node: NodeId, kind: Aggregator) -> Result<()> {
        let vars = self.cpt(node)?.vars().to_vec();
        let cpt = self.aggregator_cpt(kind, &vars)?;
        self.cpts.insert(node, cpt);
        Ok(())
    }

    pub fn dag(&self) -> &DiGraph {
        &self.dag
    }

    pub fn parents(&self, node: NodeId) -> Result<&NodeSet> {
        Ok(self.dag.parents(node)?)
    }

    pub fn children(&self, node: NodeId) -> Result<&NodeSet> {
        Ok(self.dag.children(node)?)
    }

    pub fn cpt(&self, node: NodeId) -> Result<&Potential> {
        self.cpts.get(&node).ok_or_else(|| unknown_node(node))
    }

    /// Mutable access to the values of a CPT. Its variables cannot be changed this way.
    pub fn cpt_mut(&mut self, node: NodeId) -> Result<&mut Potential> {
        self.cpts.get_mut(&node).ok_or_else(|| unknown_node(node))
    }

    /// Replace the CPT of `node` by `table`, whose variables must be the node and its
    /// parents (in any order).
    pub fn set_cpt(&mut self, node: NodeId, table: Potential) -> Result<()> {
        let family = self.dag.family(node)?;
        if table.var_set() != family {
            return Err(PgmError::InvalidArgument(format!(
                "table over {:?} is not a CPT of node {} (family {:?})",
                table.vars(),
                node,
                family
            )));
        }
        let table = table.reorganize(self.cpts[&node].vars())?;
        if table.dims() != self.cpts[&node].dims() {
            return Err(PgmError::Size(format!(
                "table domain sizes {:?} do not match the variables of node {}",
                table.dims(),
                node
            )));
        }
        self.cpts.insert(node, table);
        Ok(())
    }

    /// Check that every CPT sums to one over its node, for every value of the parents.
    pub fn check_cpts(&self) -> Result<()> {
        for (node, cpt) in self.cpts.iter() {
            let sums = cpt.project(&NodeSet::from([*node]), ProjectOp::Sum);
            if let Some(s) = sums
                .to_vec()
                .into_iter()
                .find(|s| (s - 1.0).abs() > CPT_TOLERANCE)
            {
                return Err(PgmError::InvalidArgument(format!(
                    "CPT of {} sums to {} for some parent values",
                    self.variables[node].name(),
                    s
                )));
            }
        }
        Ok(())
    }
}

impl GraphicalModel for BayesNet {
    fn size(&self) -> usize {
        self.dag.size()
    }

    fn nodes(&self) -> NodeSet {
        self.dag.node_set()
    }

    fn variable(&self, node: NodeId) -> Result<&DiscreteVariable> {
        self.variables.get(&node).ok_or_else(|| unknown_node(node))
    }

    fn id_from_name(&self, name: &str) -> Result<NodeId> {
        self.names.get(name).copied().ok_or_else(|| unknown_name(name))
    }

    fn moral_graph(&self) -> UndiGraph {
        self.dag.moral_graph().clone()
    }

    fn factors(&self) -> Vec<&Potential> {
        self.cpts.values().collect()
    }

    /// CPTs of the ancestors of the query: the other nodes are barren and their CPTs sum to
    /// one.
    fn relevant_factors(&self, query: &NodeSet) -> Vec<&Potential> {
        self.dag
            .ancestors(query)
            .iter()
            .filter_map(|n| self.cpts.get(n))
            .collect()
    }
}
