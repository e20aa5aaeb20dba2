use std::collections::BTreeMap;

use pgmgraph::UndiGraph;
use serde::{Deserialize, Serialize};

use super::{complete_scopes, unknown_name, unknown_node, GraphicalModel, NamedNodes};
use crate::{DiscreteVariable, NodeId, NodeProperty, NodeSet, PgmError, Potential, Result};

/// Markov random field: non-negative factors over sets of discrete variables.
///
/// At most one factor per set of variables. The interaction graph links two variables when
/// they appear in a common factor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkovRandomField {
    graph: UndiGraph,
    variables: NodeProperty<DiscreteVariable>,
    names: NamedNodes,
    factors: BTreeMap<Vec<NodeId>, Potential>,
}

fn scope_key(vars: &NodeSet) -> Vec<NodeId> {
    vars.iter().copied().collect()
}

impl MarkovRandomField {
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
        let id = self.graph.add_node();
        self.names.insert(var.name().to_owned(), id);
        self.variables.insert(id, var);
        Ok(id)
    }

    /// Erase a variable together with every factor over it.
    pub fn erase_variable(&mut self, node: NodeId) -> Result<()> {
        let var = self.variables.remove(&node).ok_or_else(|| unknown_node(node))?;
        self.names.shift_remove(var.name());
        self.factors.retain(|scope, _| !scope.contains(&node));
        self.graph.erase_node(node)?;
        self.rebuild_edges()
    }

    fn rebuild_edges(&mut self) -> Result<()> {
        for e in self.graph.edge_set() {
            self.graph.erase_edge(e.first(), e.second());
        }
        complete_scopes(&mut self.graph, self.factors.values())
    }

    fn check_new_factor(&self, vars: &[NodeId]) -> Result<Potential> {
        if vars.is_empty() {
            return Err(PgmError::InvalidArgument(
                "a factor needs at least one variable".to_owned(),
            ));
        }
        let dims = vars
            .iter()
            .map(|v| -> Result<usize> { Ok(self.variable(*v)?.domain_size()) })
            .collect::<Result<Vec<usize>>>()?;
        let factor = Potential::new(vars.to_vec(), dims)?;
        if self.factors.contains_key(&scope_key(&factor.var_set())) {
            return Err(PgmError::InvalidArgument(format!(
                "a factor over {:?} already exists",
                vars
            )));
        }
        Ok(factor)
    }

    fn insert_factor(&mut self, factor: Potential) -> Result<&mut Potential> {
        let scope = factor.var_set();
        self.graph.make_complete(&scope)?;
        Ok(self.factors.entry(scope_key(&scope)).or_insert(factor))
    }

    /// Add a factor over `vars` (in that order), filled with ones.
    pub fn add_factor(&mut self, vars: &[NodeId]) -> Result<&mut Potential> {
        let factor = self.check_new_factor(vars)?;
        self.insert_factor(factor)
    }

    /// Add a factor over `vars` with the given values (first variable fastest).
    pub fn add_factor_with_values(&mut self, vars: &[NodeId], values: Vec<f64>) -> Result<()> {
        if values.iter().any(|v| *v < 0.0) {
            return Err(PgmError::InvalidArgument(
                "factor values must be non-negative".to_owned(),
            ));
        }
        let mut factor = self.check_new_factor(vars)?;
        factor.fill_with(values)?;
        self.insert_factor(factor)?;
        Ok(())
    }

    pub fn erase_factor(&mut self, vars: &NodeSet) -> Result<()> {
        self.factors
            .remove(&scope_key(vars))
            .ok_or_else(|| PgmError::NotFound(format!("factor over {:?}", vars)))?;
        self.rebuild_edges()
    }

    pub fn factor(&self, vars: &NodeSet) -> Result<&Potential> {
        self.factors
            .get(&scope_key(vars))
            .ok_or_else(|| PgmError::NotFound(format!("factor over {:?}", vars)))
    }

    pub fn factor_mut(&mut self, vars: &NodeSet) -> Result<&mut Potential> {
        self.factors
            .get_mut(&scope_key(vars))
            .ok_or_else(|| PgmError::NotFound(format!("factor over {:?}", vars)))
    }

    pub fn graph(&self) -> &UndiGraph {
        &self.graph
    }

    pub fn neighbours(&self, node: NodeId) -> Result<&NodeSet> {
        Ok(self.graph.neighbours(node)?)
    }
}

impl GraphicalModel for MarkovRandomField {
    fn size(&self) -> usize {
        self.graph.size()
    }

    fn nodes(&self) -> NodeSet {
        self.graph.node_set()
    }

    fn variable(&self, node: NodeId) -> Result<&DiscreteVariable> {
        self.variables.get(&node).ok_or_else(|| unknown_node(node))
    }

    fn id_from_name(&self, name: &str) -> Result<NodeId> {
        self.names.get(name).copied().ok_or_else(|| unknown_name(name))
    }

    fn moral_graph(&self) -> UndiGraph {
        self.graph.clone()
    }

    fn factors(&self) -> Vec<&Potential> {
        self.factors.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (MarkovRandomField, [NodeId; 3]) {
        let mut mrf = MarkovRandomField::new();
        let ids = ["a", "b", "c"].map(|n| mrf.add_variable(DiscreteVariable::binary(n)).unwrap());
        mrf.add_factor_with_values(&[ids[0], ids[1]], vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        mrf.add_factor_with_values(&[ids[1], ids[2]], vec![1.0; 4])
            .unwrap();
        (mrf, ids)
    }

    #[test]
    fn interaction_graph_follows_factors() {
        let (mut mrf, [a, b, c]) = triangle();
        assert!(mrf.graph().exists_edge(a, b));
        assert!(!mrf.graph().exists_edge(a, c));
        assert!(mrf.add_factor(&[b, a]).is_err());
        mrf.erase_factor(&NodeSet::from([b, c])).unwrap();
        assert!(!mrf.graph().exists_edge(b, c));
        assert!(mrf.graph().exists_edge(a, b));
        assert_eq!(mrf.factors().len(), 1);
    }

    #[test]
    fn erase_variable_drops_its_factors() {
        let (mut mrf, [a, b, _]) = triangle();
        mrf.erase_variable(b).unwrap();
        assert!(mrf.factors().is_empty());
        assert!(mrf.factor(&NodeSet::from([a, b])).is_err());
        assert!(matches!(mrf.id_from_name("b"), Err(PgmError::NotFound(_))));
        assert!(mrf.add_factor_with_values(&[a], vec![-1.0, 1.0]).is_err());
    }
}
