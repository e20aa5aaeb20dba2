use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use pgmgraph::CliqueGraph;
use tracing::debug;

use super::{normalized_marginal, total_mass, Evidence, EvidenceSet, InferenceState};
use crate::model::GraphicalModel;
use crate::schedule::{Schedule, Scheduler, TableKey};
use crate::triangulation::{component_roots, BinaryJoinTreeConverter, Triangulation};
use crate::{
    Config, DomainSizes, NodeId, NodeProperty, NodeSet, PgmError, Potential, Result, TableAlgebra,
};

type Messages = BTreeMap<(NodeId, NodeId), Potential>;

/// Junction tree and the assignment of the tables of the model to its cliques.
#[derive(Debug, Clone)]
struct Structure {
    tree: CliqueGraph,
    roots: NodeSet,
    /// Clique holding the evidence table of each node.
    node_cliques: NodeProperty<NodeId>,
    /// Indices in `GraphicalModel::factors` of the tables of each clique.
    factor_cliques: NodeProperty<Vec<usize>>,
    /// Every directed message, each after the messages it depends on.
    message_order: Vec<(NodeId, NodeId)>,
}

/// Shafer-Shenoy message passing on a junction tree.
///
/// The junction tree is built once by [`ShaferShenoy::prepare_inference`] and kept as long
/// as the model, the joint targets and the binarization option are unchanged. Changing the
/// evidence or the algebra only invalidates the messages.
///
/// Posteriors are computed on demand: querying one runs the inference if needed.
#[derive(Debug)]
pub struct ShaferShenoy<M: GraphicalModel> {
    model: Arc<M>,
    config: Config,
    algebra: TableAlgebra,
    triangulation: Triangulation,
    binary_join_tree: bool,
    targets: NodeSet,
    joint_targets: BTreeSet<NodeSet>,
    evidence: EvidenceSet,
    state: InferenceState,
    structure: Option<Structure>,
    potentials: NodeProperty<Potential>,
    messages: Messages,
}

impl<M: GraphicalModel> ShaferShenoy<M> {
    pub fn new(model: Arc<M>, config: &Config) -> Self {
        Self {
            model,
            config: config.clone(),
            algebra: TableAlgebra::default(),
            triangulation: Triangulation::default(),
            binary_join_tree: false,
            targets: NodeSet::new(),
            joint_targets: BTreeSet::new(),
            evidence: EvidenceSet::default(),
            state: InferenceState::Uninitialized,
            structure: None,
            potentials: NodeProperty::new(),
            messages: Messages::new(),
        }
    }

    /// Use `triangulation` (its strategies and options) to build junction trees.
    pub fn with_triangulation(mut self, triangulation: Triangulation) -> Self {
        self.triangulation = triangulation.new_factory();
        self.invalidate_structure();
        self
    }

    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    /// Switch to another model. Targets and evidence are dropped.
    pub fn set_model(&mut self, model: Arc<M>) {
        self.model = model;
        self.targets.clear();
        self.joint_targets.clear();
        self.evidence.clear();
        self.invalidate_structure();
    }

    pub fn state(&self) -> InferenceState {
        self.state
    }

    pub fn algebra(&self) -> &TableAlgebra {
        &self.algebra
    }

    pub fn set_algebra(&mut self, algebra: TableAlgebra) {
        if algebra != self.algebra {
            self.algebra = algebra;
            self.invalidate_messages();
        }
    }

    /// Pass messages on a binarized junction tree.
    pub fn use_binary_join_tree(&mut self, binary: bool) {
        if binary != self.binary_join_tree {
            self.binary_join_tree = binary;
            self.invalidate_structure();
        }
    }

    fn invalidate_structure(&mut self) {
        self.structure = None;
        self.potentials.clear();
        self.messages.clear();
        if self.state != InferenceState::Uninitialized {
            debug!(from = ?self.state, "inference reset");
        }
        self.state = InferenceState::Uninitialized;
    }

    fn invalidate_messages(&mut self) {
        if self.state == InferenceState::Inferred {
            debug!("messages invalidated");
            self.state = InferenceState::Dirty;
        }
    }

    /// Restrict posterior queries to the targets. With no target, every variable is one.
    pub fn add_target(&mut self, node: NodeId) -> Result<()> {
        self.model.variable(node)?;
        self.targets.insert(node);
        Ok(())
    }

    pub fn erase_target(&mut self, node: NodeId) -> Result<()> {
        if self.targets.remove(&node) {
            Ok(())
        } else {
            Err(PgmError::NotFound(format!("target {}", node)))
        }
    }

    pub fn targets(&self) -> &NodeSet {
        &self.targets
    }

    /// Allow [`ShaferShenoy::joint_posterior`] over `nodes` (or any subset of it). The
    /// nodes are forced into a common clique, so the junction tree is rebuilt.
    pub fn add_joint_target(&mut self, nodes: NodeSet) -> Result<()> {
        if nodes.is_empty() {
            return Err(PgmError::InvalidArgument(
                "a joint target needs at least one node".to_owned(),
            ));
        }
        for n in nodes.iter() {
            self.model.variable(*n)?;
        }
        if self.joint_targets.insert(nodes) {
            self.invalidate_structure();
        }
        Ok(())
    }

    pub fn erase_joint_target(&mut self, nodes: &NodeSet) -> Result<()> {
        if !self.joint_targets.remove(nodes) {
            return Err(PgmError::NotFound(format!("joint target {:?}", nodes)));
        }
        self.invalidate_structure();
        Ok(())
    }

    pub fn joint_targets(&self) -> &BTreeSet<NodeSet> {
        &self.joint_targets
    }

    pub fn add_evidence(&mut self, node: NodeId, value: usize) -> Result<()> {
        self.evidence
            .add(self.model.as_ref(), node, Evidence::Hard(value))?;
        self.invalidate_messages();
        Ok(())
    }

    pub fn add_evidence_by_label(&mut self, node: NodeId, label: &str) -> Result<()> {
        let value = self.model.variable(node)?.index_of(label)?;
        self.add_evidence(node, value)
    }

    /// Likelihood evidence: one non-negative weight per value of `node`.
    pub fn add_soft_evidence(&mut self, node: NodeId, likelihood: Vec<f64>) -> Result<()> {
        self.evidence
            .add(self.model.as_ref(), node, Evidence::Soft(likelihood))?;
        self.invalidate_messages();
        Ok(())
    }

    /// Replace the existing evidence on `node`.
    pub fn chg_evidence(&mut self, node: NodeId, evidence: Evidence) -> Result<()> {
        self.evidence.change(self.model.as_ref(), node, evidence)?;
        self.invalidate_messages();
        Ok(())
    }

    pub fn erase_evidence(&mut self, node: NodeId) -> Result<()> {
        self.evidence.erase(node)?;
        self.invalidate_messages();
        Ok(())
    }

    pub fn erase_all_evidence(&mut self) {
        self.evidence.clear();
        self.invalidate_messages();
    }

    pub fn evidence(&self) -> &NodeProperty<Evidence> {
        self.evidence.all()
    }

    pub fn has_evidence(&self, node: NodeId) -> bool {
        self.evidence.get(node).is_some()
    }

    /// Junction tree used for message passing (binarized if requested).
    pub fn junction_tree(&mut self) -> Result<&CliqueGraph> {
        self.prepare_inference()?;
        Ok(&self.structure()?.tree)
    }

    fn structure(&self) -> Result<&Structure> {
        self.structure.as_ref().ok_or_else(|| {
            PgmError::OperationNotAllowed("inference is not prepared".to_owned())
        })
    }

    /// Build the junction tree and assign every table of the model to a clique.
    pub fn prepare_inference(&mut self) -> Result<()> {
        if self.structure.is_some() {
            return Ok(());
        }
        let mut graph = self.model.moral_graph();
        for nodes in self.joint_targets.iter() {
            graph.make_complete(nodes)?;
        }
        let domain_sizes = self.model.domain_sizes();
        self.triangulation
            .set_graph(Some(&graph), Some(&domain_sizes))?;
        let jt = self.triangulation.junction_tree_with_cliques()?;
        let node_cliques = jt.created_cliques().clone();
        let mut tree = jt.tree().clone();
        if self.binary_join_tree {
            tree = BinaryJoinTreeConverter::new().convert(
                &tree,
                &domain_sizes,
                &component_roots(&tree),
            )?;
        }
        let roots = component_roots(&tree);
        let mut factor_cliques: NodeProperty<Vec<usize>> = NodeProperty::new();
        for (i, f) in self.model.factors().iter().enumerate() {
            let clique = assign_clique(&tree, &domain_sizes, &f.var_set(), &roots)?;
            factor_cliques.entry(clique).or_default().push(i);
        }
        let message_order = message_order(&tree, &roots)?;
        debug!(
            cliques = tree.size(),
            components = roots.len(),
            binary = self.binary_join_tree,
            "inference prepared"
        );
        self.structure = Some(Structure {
            tree,
            roots,
            node_cliques,
            factor_cliques,
            message_order,
        });
        self.state = InferenceState::Prepared;
        Ok(())
    }

    /// Compute every message. On failure, the engine keeps its previous state.
    pub fn make_inference(&mut self) -> Result<()> {
        self.prepare_inference()?;
        if self.state == InferenceState::Inferred {
            return Ok(());
        }
        let structure = self.structure()?;
        let potentials = self.clique_potentials(structure)?;
        let messages = if self.config.use_scheduler() {
            self.scheduled_messages(structure, &potentials)?
        } else {
            self.sequential_messages(structure, &potentials)?
        };
        debug!(
            messages = messages.len(),
            evidence = self.evidence.all().len(),
            scheduled = self.config.use_scheduler(),
            "inference done"
        );
        self.potentials = potentials;
        self.messages = messages;
        self.state = InferenceState::Inferred;
        Ok(())
    }

    /// Tables of each clique (and evidence) combined, in the domain of the algebra.
    fn clique_potentials(&self, structure: &Structure) -> Result<NodeProperty<Potential>> {
        let factors = self.model.factors();
        let mut tables: NodeProperty<Vec<Potential>> =
            structure.tree.nodes().map(|c| (c, Vec::new())).collect();
        for (clique, indices) in structure.factor_cliques.iter() {
            let slot = tables.entry(*clique).or_default();
            slot.extend(
                indices
                    .iter()
                    .map(|i| self.algebra.from_probabilities(factors[*i].clone())),
            );
        }
        for (node, table) in self.evidence.tables() {
            let clique = structure.node_cliques.get(&node).ok_or_else(|| {
                PgmError::NotFound(format!("node {} in the junction tree", node))
            })?;
            tables
                .entry(*clique)
                .or_default()
                .push(self.algebra.from_probabilities(table.clone()));
        }
        tables
            .into_iter()
            .map(|(c, ts)| -> Result<(NodeId, Potential)> {
                Ok((c, self.algebra.combine_all(ts.iter())?))
            })
            .collect()
    }

    /// Variables eliminated by the message from `from` to `to`.
    fn eliminated(tree: &CliqueGraph, from: NodeId, to: NodeId) -> Result<NodeSet> {
        let sep = tree.separator(from, to)?;
        Ok(tree.clique(from)?.difference(sep).copied().collect())
    }

    fn sequential_messages(
        &self,
        structure: &Structure,
        potentials: &NodeProperty<Potential>,
    ) -> Result<Messages> {
        let tree = &structure.tree;
        let mut messages = Messages::new();
        for (from, to) in structure.message_order.iter() {
            let mut acc = potentials[from].clone();
            for n in tree.neighbours(*from)?.iter().filter(|n| *n != to) {
                acc = acc.combine(&messages[&(*n, *from)], self.algebra.combine)?;
            }
            let del = Self::eliminated(tree, *from, *to)?;
            messages.insert((*from, *to), acc.project(&del, self.algebra.project));
        }
        Ok(messages)
    }

    /// Same computations as [`Self::sequential_messages`], run by the scheduler.
    fn scheduled_messages(
        &self,
        structure: &Structure,
        potentials: &NodeProperty<Potential>,
    ) -> Result<Messages> {
        let tree = &structure.tree;
        let mut schedule = Schedule::new();
        let potential_keys: NodeProperty<TableKey> = potentials
            .iter()
            .map(|(c, p)| (*c, schedule.insert_table(p.clone())))
            .collect();
        let mut keys: BTreeMap<(NodeId, NodeId), TableKey> = BTreeMap::new();
        for (from, to) in structure.message_order.iter() {
            let mut acc = potential_keys[from];
            for n in tree.neighbours(*from)?.iter().filter(|n| *n != to) {
                acc = schedule.combine(acc, keys[&(*n, *from)], self.algebra.combine)?;
            }
            let del = Self::eliminated(tree, *from, *to)?;
            let key = schedule.project(acc, del, self.algebra.project)?;
            schedule.set_persistent(key, true)?;
            keys.insert((*from, *to), key);
        }
        Scheduler::new(&self.config).execute(&mut schedule)?;
        keys.into_iter()
            .map(|(edge, key)| -> Result<((NodeId, NodeId), Potential)> {
                Ok((edge, schedule.table(key)?.clone()))
            })
            .collect()
    }

    /// Potential of `clique` combined with all its incoming messages.
    fn belief(&self, clique: NodeId) -> Result<Potential> {
        let tree = &self.structure()?.tree;
        let mut acc = self
            .potentials
            .get(&clique)
            .ok_or_else(|| PgmError::NotFound(format!("clique {}", clique)))?
            .clone();
        for n in tree.neighbours(clique)? {
            acc = acc.combine(&self.messages[&(*n, clique)], self.algebra.combine)?;
        }
        Ok(acc)
    }

    fn check_queryable(&self, node: NodeId) -> Result<()> {
        self.model.variable(node)?;
        if !self.targets.is_empty()
            && !self.targets.contains(&node)
            && !self.joint_targets.iter().any(|t| t.contains(&node))
        {
            return Err(PgmError::OperationNotAllowed(format!(
                "node {} is not a target",
                node
            )));
        }
        Ok(())
    }

    /// Normalized marginal of `node` given the evidence.
    ///
    /// Fails with [`PgmError::IncompatibleEvidence`] when the evidence has probability zero.
    pub fn posterior(&mut self, node: NodeId) -> Result<Potential> {
        self.check_queryable(node)?;
        self.make_inference()?;
        let clique = *self
            .structure()?
            .node_cliques
            .get(&node)
            .ok_or_else(|| PgmError::NotFound(format!("node {} in the junction tree", node)))?;
        let belief = self.belief(clique)?;
        normalized_marginal(
            self.model.as_ref(),
            &self.algebra,
            &belief,
            &NodeSet::from([node]),
        )
    }

    pub fn posterior_by_name(&mut self, name: &str) -> Result<Potential> {
        let node = self.model.id_from_name(name)?;
        self.posterior(node)
    }

    /// Normalized joint marginal of `nodes`, which must be included in a joint target. The
    /// variables of the result are in increasing id order.
    pub fn joint_posterior(&mut self, nodes: &NodeSet) -> Result<Potential> {
        if let Some(node) = nodes.first().filter(|_| nodes.len() == 1) {
            return self.posterior(*node);
        }
        for n in nodes.iter() {
            self.model.variable(*n)?;
        }
        if !self.joint_targets.iter().any(|t| nodes.is_subset(t)) {
            return Err(PgmError::OperationNotAllowed(format!(
                "{:?} is not part of a joint target",
                nodes
            )));
        }
        self.make_inference()?;
        let clique = self
            .structure()?
            .tree
            .container_clique(nodes)
            .ok_or_else(|| PgmError::NotFound(format!("clique containing {:?}", nodes)))?;
        let belief = self.belief(clique)?;
        normalized_marginal(self.model.as_ref(), &self.algebra, &belief, nodes)
    }

    /// Probability of the evidence (the partition function for a Markov random field).
    pub fn evidence_probability(&mut self) -> Result<f64> {
        self.make_inference()?;
        let roots = self.structure()?.roots.clone();
        let mut prob = 1.0;
        for root in roots {
            prob *= total_mass(&self.algebra, &self.belief(root)?)?;
        }
        Ok(prob)
    }
}

/// Smallest clique (by table size, then id) containing `scope`. Tables without variables
/// go to the first root.
fn assign_clique(
    tree: &CliqueGraph,
    domain_sizes: &DomainSizes,
    scope: &NodeSet,
    roots: &NodeSet,
) -> Result<NodeId> {
    if scope.is_empty() {
        return roots
            .first()
            .copied()
            .ok_or_else(|| PgmError::OperationNotAllowed("empty junction tree".to_owned()));
    }
    tree.cliques()
        .filter(|(_, c)| scope.is_subset(c))
        .map(|(id, c)| {
            let size = c
                .iter()
                .map(|v| domain_sizes.get(v).copied().unwrap_or(1))
                .fold(1usize, usize::saturating_mul);
            (size, id)
        })
        .min()
        .map(|(_, id)| id)
        .ok_or_else(|| PgmError::NotFound(format!("clique containing {:?}", scope)))
}

/// Collect messages (towards the roots, in post-order) then diffuse messages (from the
/// roots, in pre-order).
fn message_order(tree: &CliqueGraph, roots: &NodeSet) -> Result<Vec<(NodeId, NodeId)>> {
    let mut collect = Vec::new();
    let mut diffuse = Vec::new();
    for root in roots.iter() {
        let mut down = Vec::new();
        let mut stack = vec![(*root, None)];
        while let Some((node, parent)) = stack.pop() {
            if let Some(p) = parent {
                down.push((p, node));
            }
            for n in tree.neighbours(node)?.iter().rev() {
                if Some(*n) != parent {
                    stack.push((*n, Some(node)));
                }
            }
        }
        collect.extend(down.iter().rev().map(|(p, c)| (*c, *p)));
        diffuse.extend(down);
    }
    collect.extend(diffuse);
    Ok(collect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BayesNet, MarkovRandomField};
    use crate::DiscreteVariable;

    /// rain -> wet <- sprinkler
    fn sprinkler() -> (BayesNet, [NodeId; 3]) {
        let mut bn = BayesNet::new();
        let rain = bn
            .add_node_with_cpt(DiscreteVariable::binary("rain"), &[], vec![0.8, 0.2])
            .unwrap();
        let sprinkler = bn
            .add_node_with_cpt(DiscreteVariable::binary("sprinkler"), &[], vec![0.6, 0.4])
            .unwrap();
        let wet = bn
            .add_node_with_cpt(
                DiscreteVariable::binary("wet"),
                &[rain, sprinkler],
                vec![1.0, 0.0, 0.2, 0.8, 0.1, 0.9, 0.01, 0.99],
            )
            .unwrap();
        (bn, [rain, sprinkler, wet])
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn state_machine() {
        let (bn, [rain, _, wet]) = sprinkler();
        let mut ss = ShaferShenoy::new(Arc::new(bn), &Config::default());
        assert_eq!(ss.state(), InferenceState::Uninitialized);
        ss.prepare_inference().unwrap();
        assert_eq!(ss.state(), InferenceState::Prepared);
        ss.make_inference().unwrap();
        assert_eq!(ss.state(), InferenceState::Inferred);
        ss.add_evidence(wet, 1).unwrap();
        assert_eq!(ss.state(), InferenceState::Dirty);
        ss.posterior(rain).unwrap();
        assert_eq!(ss.state(), InferenceState::Inferred);
        ss.use_binary_join_tree(true);
        assert_eq!(ss.state(), InferenceState::Uninitialized);
        // Evidence survives a structure change.
        assert!(ss.has_evidence(wet));
    }

    #[test]
    fn explaining_away() {
        let (bn, [rain, sprinkler, wet]) = sprinkler();
        let mut ss = ShaferShenoy::new(Arc::new(bn), &Config::default());
        let p_wet = 0.8 * 0.6 * 0.0 + 0.8 * 0.4 * 0.9 + 0.2 * 0.6 * 0.8 + 0.2 * 0.4 * 0.99;
        assert!(close(&ss.posterior(wet).unwrap().to_vec(), &[1.0 - p_wet, p_wet]));
        ss.add_evidence(wet, 1).unwrap();
        let rain_wet = ss.posterior(rain).unwrap().to_vec()[1];
        assert!((rain_wet - (0.2 * 0.6 * 0.8 + 0.2 * 0.4 * 0.99) / p_wet).abs() < 1e-9);
        assert!((ss.evidence_probability().unwrap() - p_wet).abs() < 1e-12);
        ss.add_evidence(sprinkler, 1).unwrap();
        assert!(ss.posterior(rain).unwrap().to_vec()[1] < rain_wet);
        assert!(close(&ss.posterior(wet).unwrap().to_vec(), &[0.0, 1.0]));
    }

    #[test]
    fn joint_targets_share_a_clique() {
        let (bn, [rain, sprinkler, wet]) = sprinkler();
        let mut ss = ShaferShenoy::new(Arc::new(bn), &Config::default());
        let pair = NodeSet::from([rain, sprinkler]);
        assert!(matches!(
            ss.joint_posterior(&pair),
            Err(PgmError::OperationNotAllowed(_))
        ));
        ss.add_joint_target(pair.clone()).unwrap();
        ss.add_evidence(wet, 0).unwrap();
        let joint = ss.joint_posterior(&pair).unwrap();
        assert_eq!(joint.vars(), &[rain, sprinkler]);
        let marg = joint.project(&NodeSet::from([sprinkler]), crate::ProjectOp::Sum);
        assert!(close(&marg.to_vec(), &ss.posterior(rain).unwrap().to_vec()));
    }

    #[test]
    fn scheduled_messages_match_sequential_ones() {
        let (bn, [rain, _, wet]) = sprinkler();
        let bn = Arc::new(bn);
        let mut seq = ShaferShenoy::new(bn.clone(), &Config::default());
        let mut sch = ShaferShenoy::new(
            bn,
            &Config::default().with_scheduler(true).with_max_threads(3),
        );
        for ss in [&mut seq, &mut sch] {
            ss.add_soft_evidence(wet, vec![0.3, 0.9]).unwrap();
        }
        assert_eq!(
            seq.posterior(rain).unwrap().to_vec(),
            sch.posterior(rain).unwrap().to_vec()
        );
    }

    #[test]
    fn queries_are_checked() {
        let (bn, [rain, sprinkler, wet]) = sprinkler();
        let mut ss = ShaferShenoy::new(Arc::new(bn), &Config::default());
        assert!(matches!(ss.posterior(42), Err(PgmError::NotFound(_))));
        assert!(matches!(
            ss.add_evidence(rain, 2),
            Err(PgmError::OutOfBounds { .. })
        ));
        assert!(matches!(
            ss.add_soft_evidence(rain, vec![1.0]),
            Err(PgmError::Size(_))
        ));
        ss.add_target(rain).unwrap();
        assert!(matches!(
            ss.posterior(sprinkler),
            Err(PgmError::OperationNotAllowed(_))
        ));
        ss.erase_target(rain).unwrap();
        // The grass cannot be wet without a cause.
        ss.add_evidence(rain, 0).unwrap();
        ss.add_evidence_by_label(sprinkler, "false").unwrap();
        ss.add_soft_evidence(wet, vec![0.0, 1.0]).unwrap();
        assert!(matches!(
            ss.posterior(rain),
            Err(PgmError::IncompatibleEvidence)
        ));
        assert_eq!(ss.evidence_probability().unwrap(), 0.0);
        ss.chg_evidence(wet, Evidence::Hard(0)).unwrap();
        assert!(close(&ss.posterior(wet).unwrap().to_vec(), &[1.0, 0.0]));
        ss.chg_evidence(rain, Evidence::Soft(vec![1.0, 0.0])).unwrap();
        ss.chg_evidence(rain, Evidence::Hard(1)).unwrap();
        ss.erase_evidence(sprinkler).unwrap();
        assert!(ss.erase_evidence(sprinkler).is_err());
        ss.erase_all_evidence();
        assert!(ss.evidence().is_empty());
    }

    #[test]
    fn markov_random_field_partition_function() {
        let mut mrf = MarkovRandomField::new();
        let a = mrf.add_variable(DiscreteVariable::binary("a")).unwrap();
        let b = mrf.add_variable(DiscreteVariable::binary("b")).unwrap();
        let c = mrf.add_variable(DiscreteVariable::binary("c")).unwrap();
        mrf.add_factor_with_values(&[a, b], vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        mrf.add_factor_with_values(&[b, c], vec![2.0, 1.0, 1.0, 2.0])
            .unwrap();
        let mrf = Arc::new(mrf);
        let mut ss = ShaferShenoy::new(mrf.clone(), &Config::default());
        // sum_b (sum_a f(a,b)) (sum_c g(b,c)) = 3 * 3 + 7 * 3
        assert!((ss.evidence_probability().unwrap() - 30.0).abs() < 1e-9);
        let p_b = ss.posterior(b).unwrap().to_vec();
        assert!(close(&p_b, &[9.0 / 30.0, 21.0 / 30.0]));

        let mut log = ShaferShenoy::new(mrf, &Config::default());
        log.set_algebra(TableAlgebra::log_sum());
        assert!((log.evidence_probability().unwrap() - 30.0).abs() < 1e-9);
        assert!(close(&log.posterior(b).unwrap().to_vec(), &p_b));
    }
}
