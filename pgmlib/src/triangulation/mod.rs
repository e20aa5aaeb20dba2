//! Triangulation of undirected graphs and construction of junction trees.
//!
//! A [`Triangulation`] drives an [`EliminationSequenceStrategy`] until the graph is empty,
//! recording for every eliminated node the clique it formed with its neighbours. From this
//! [`EliminationRecord`] a [`JunctionTreeStrategy`] builds the junction tree used by the
//! inference engines.
//!
//! Results are computed lazily on first access and cached until [`Triangulation::clear`] or
//! [`Triangulation::set_graph`].

mod binary;
mod elimination;
mod junction_tree;

pub use binary::BinaryJoinTreeConverter;
pub use elimination::{
    DefaultEliminationSequenceStrategy, EliminationHeuristic, EliminationSequenceStrategy,
    OrderedEliminationSequenceStrategy, PartialOrderedEliminationSequenceStrategy,
};
pub use junction_tree::{
    component_roots, DefaultJunctionTreeStrategy, JunctionTree, JunctionTreeStrategy,
};

use pgmgraph::{CliqueGraph, EdgeSet, UndiGraph};
use tracing::debug;

use crate::{DomainSizes, NodeId, NodeProperty, NodeSet, PgmError, Result};

/// Outcome of running an elimination sequence to completion.
#[derive(Debug, Clone, Default)]
pub struct EliminationRecord {
    order: Vec<NodeId>,
    order_index: NodeProperty<usize>,
    triangulated: UndiGraph,
    fill_ins: EdgeSet,
    cliques: NodeProperty<NodeSet>,
    elimination_tree: CliqueGraph,
}

impl EliminationRecord {
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }
    pub fn order_index(&self) -> &NodeProperty<usize> {
        &self.order_index
    }
    pub fn triangulated_graph(&self) -> &UndiGraph {
        &self.triangulated
    }
    pub fn fill_ins(&self) -> &EdgeSet {
        &self.fill_ins
    }
    /// The node together with its neighbours at the time it was eliminated.
    pub fn elimination_clique(&self, node: NodeId) -> Result<&NodeSet> {
        self.cliques
            .get(&node)
            .ok_or_else(|| PgmError::NotFound(format!("node {} in the elimination", node)))
    }
    /// Clique `n` holds the elimination clique of node `n` and is linked to the clique of
    /// the first node eliminated among the neighbours of `n`.
    pub fn elimination_tree(&self) -> &CliqueGraph {
        &self.elimination_tree
    }
}

/// Eliminate every node of `graph` in the order chosen by `strategy`.
fn eliminate_all(
    strategy: &mut dyn EliminationSequenceStrategy,
    graph: &UndiGraph,
    domain_sizes: &DomainSizes,
) -> Result<EliminationRecord> {
    strategy.set_graph(Some(graph), Some(domain_sizes))?;
    let mut record = EliminationRecord {
        triangulated: graph.clone(),
        ..Default::default()
    };
    for _ in 0..graph.size() {
        let node = strategy.next_node_to_eliminate()?;
        let neighbours = strategy
            .graph()
            .ok_or_else(|| PgmError::OperationNotAllowed("strategy lost its graph".to_owned()))?
            .neighbours(node)?
            .clone();
        record
            .fill_ins
            .extend(record.triangulated.make_complete(&neighbours)?);
        strategy.elimination_update(node)?;
        let mut clique = neighbours;
        clique.insert(node);
        record.order_index.insert(node, record.order.len());
        record.order.push(node);
        record.cliques.insert(node, clique);
    }
    for (node, clique) in record.cliques.iter() {
        record
            .elimination_tree
            .add_clique_with_id(*node, clique.clone())?;
    }
    for node in record.order.iter() {
        let parent = record.cliques[node]
            .iter()
            .filter(|n| *n != node)
            .min_by_key(|n| record.order_index[*n]);
        if let Some(parent) = parent {
            record.elimination_tree.add_edge(*node, *parent)?;
        }
    }
    Ok(record)
}

/// Whether eliminating in `order` adds no edge to `graph`.
fn is_perfect_elimination_order(graph: &UndiGraph, order: &[NodeId]) -> bool {
    let position: NodeProperty<usize> = order.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    order.iter().all(|n| {
        let later: NodeSet = graph
            .neighbours(*n)
            .map(|nb| {
                nb.iter()
                    .filter(|m| position[*m] > position[n])
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        graph.is_complete_set(&later)
    })
}

/// Remove fill-ins one at a time while the graph stays chordal, then eliminate again.
///
/// An edge `uv` of a chordal graph can be removed without breaking chordality iff the
/// common neighbours of `u` and `v` are pairwise adjacent. A triangulation in which no
/// fill-in can be removed this way is minimal.
fn minimalize(
    record: EliminationRecord,
    graph: &UndiGraph,
    domain_sizes: &DomainSizes,
) -> Result<EliminationRecord> {
    let mut triangulated = record.triangulated.clone();
    let mut fill_ins = record.fill_ins.clone();
    loop {
        let removable = fill_ins.iter().copied().find(|e| {
            let common: NodeSet = match (
                triangulated.neighbours(e.first()),
                triangulated.neighbours(e.second()),
            ) {
                (Ok(a), Ok(b)) => a.intersection(b).copied().collect(),
                _ => return false,
            };
            triangulated.is_complete_set(&common)
        });
        match removable {
            Some(e) => {
                triangulated.erase_edge(e.first(), e.second());
                fill_ins.remove(&e);
            }
            None => break,
        }
    }
    if fill_ins.len() == record.fill_ins.len() {
        return Ok(record);
    }
    let order = if is_perfect_elimination_order(&triangulated, &record.order) {
        record.order
    } else {
        triangulated.perfect_elimination_order()
    };
    let mut strategy = OrderedEliminationSequenceStrategy::new(order);
    let mut minimal = eliminate_all(&mut strategy, &triangulated, domain_sizes)?;
    debug_assert!(minimal.fill_ins.is_empty());
    debug_assert_eq!(graph.size(), triangulated.size());
    minimal.fill_ins = fill_ins;
    Ok(minimal)
}

/// Triangulation of an undirected graph with cached elimination results and junction tree.
#[derive(Debug)]
pub struct Triangulation {
    elimination_strategy: Box<dyn EliminationSequenceStrategy>,
    junction_tree_strategy: Box<dyn JunctionTreeStrategy>,
    minimality: bool,
    graph: Option<UndiGraph>,
    domain_sizes: DomainSizes,
    record: Option<EliminationRecord>,
    junction_tree: Option<JunctionTree>,
}

impl Default for Triangulation {
    fn default() -> Self {
        Self::new(
            Box::new(DefaultEliminationSequenceStrategy::default()),
            Box::new(DefaultJunctionTreeStrategy),
        )
    }
}

impl Triangulation {
    pub fn new(
        elimination_strategy: Box<dyn EliminationSequenceStrategy>,
        junction_tree_strategy: Box<dyn JunctionTreeStrategy>,
    ) -> Self {
        Self {
            elimination_strategy,
            junction_tree_strategy,
            minimality: false,
            graph: None,
            domain_sizes: DomainSizes::new(),
            record: None,
            junction_tree: None,
        }
    }

    /// Ask for a minimal triangulation (see [`Triangulation::set_minimality`]).
    pub fn with_minimality(mut self, minimality: bool) -> Self {
        self.set_minimality(minimality);
        self
    }

    /// When set, fill-ins that are not needed for chordality are removed after elimination.
    /// If the elimination order is not a perfect elimination order of the minimal graph any
    /// more, it is replaced by one computed with maximum cardinality search, which may
    /// not respect the constraints of an ordered strategy.
    pub fn set_minimality(&mut self, minimality: bool) {
        if minimality != self.minimality {
            self.minimality = minimality;
            self.invalidate();
        }
    }

    pub fn is_minimality_required(&self) -> bool {
        self.minimality
    }

    /// Bind a graph and the domain sizes of its nodes, or detach with `(None, None)`.
    ///
    /// Inputs are validated eagerly: giving only one of them, or a graph whose nodes lack
    /// domain sizes, fails with a graph error and leaves the triangulation cleared.
    pub fn set_graph(
        &mut self,
        graph: Option<&UndiGraph>,
        domain_sizes: Option<&DomainSizes>,
    ) -> Result<()> {
        self.clear();
        self.elimination_strategy
            .ask_fill_ins(self.junction_tree_strategy.requires_fill_ins());
        self.elimination_strategy.set_graph(graph, domain_sizes)?;
        if let (Some(graph), Some(domain_sizes)) = (graph, domain_sizes) {
            self.domain_sizes = graph.nodes().map(|n| (n, domain_sizes[&n])).collect();
            self.graph = Some(graph.clone());
        }
        Ok(())
    }

    /// Forget the graph and everything computed from it.
    pub fn clear(&mut self) {
        self.elimination_strategy.clear();
        self.graph = None;
        self.domain_sizes.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.record = None;
        self.junction_tree = None;
    }

    pub fn original_graph(&self) -> Option<&UndiGraph> {
        self.graph.as_ref()
    }

    pub fn domain_sizes(&self) -> &DomainSizes {
        &self.domain_sizes
    }

    /// Same strategies and options, with no graph bound.
    pub fn new_factory(&self) -> Triangulation {
        Triangulation::new(
            self.elimination_strategy.new_factory(),
            self.junction_tree_strategy.new_factory(),
        )
        .with_minimality(self.minimality)
    }

    fn record(&mut self) -> Result<&EliminationRecord> {
        if self.record.is_none() {
            let graph = self
                .graph
                .as_ref()
                .ok_or_else(|| PgmError::OperationNotAllowed("no graph to triangulate".to_owned()))?;
            let mut record =
                eliminate_all(self.elimination_strategy.as_mut(), graph, &self.domain_sizes)?;
            if self.minimality {
                record = minimalize(record, graph, &self.domain_sizes)?;
            }
            debug!(
                nodes = graph.size(),
                fill_ins = record.fill_ins.len(),
                max_log10_clique = max_log10_clique(&record, &self.domain_sizes),
                minimal = self.minimality,
                "triangulation done"
            );
            self.record = Some(record);
        }
        Ok(self.record.as_ref().expect("computed above"))
    }

    /// Full elimination data.
    pub fn elimination(&mut self) -> Result<&EliminationRecord> {
        self.record()
    }

    pub fn elimination_order(&mut self) -> Result<&[NodeId]> {
        Ok(self.record()?.order())
    }

    /// Position of each node in the elimination order.
    pub fn elimination_order_index(&mut self) -> Result<&NodeProperty<usize>> {
        Ok(self.record()?.order_index())
    }

    /// Original graph plus fill-ins.
    pub fn triangulated_graph(&mut self) -> Result<&UndiGraph> {
        Ok(self.record()?.triangulated_graph())
    }

    pub fn fill_ins(&mut self) -> Result<&EdgeSet> {
        Ok(self.record()?.fill_ins())
    }

    pub fn elimination_tree(&mut self) -> Result<&CliqueGraph> {
        Ok(self.record()?.elimination_tree())
    }

    /// Log10 of the largest elimination clique table.
    pub fn max_log10_clique_domain_size(&mut self) -> Result<f64> {
        self.record()?;
        let record = self.record.as_ref().expect("computed above");
        Ok(max_log10_clique(record, &self.domain_sizes))
    }

    fn built_junction_tree(&mut self) -> Result<&JunctionTree> {
        if self.junction_tree.is_none() {
            self.record()?;
            let record = self.record.as_ref().expect("computed above");
            let jt = self.junction_tree_strategy.build(record)?;
            debug!(
                cliques = jt.tree().size(),
                "junction tree built"
            );
            self.junction_tree = Some(jt);
        }
        Ok(self.junction_tree.as_ref().expect("computed above"))
    }

    pub fn junction_tree(&mut self) -> Result<&CliqueGraph> {
        Ok(self.built_junction_tree()?.tree())
    }

    /// Junction tree together with the clique created by each node.
    pub fn junction_tree_with_cliques(&mut self) -> Result<&JunctionTree> {
        self.built_junction_tree()
    }

    /// Junction tree clique created by the elimination of `node`.
    pub fn created_junction_tree_clique(&mut self, node: NodeId) -> Result<NodeId> {
        self.built_junction_tree()?.created_clique(node)
    }

    pub fn created_junction_tree_cliques(&mut self) -> Result<&NodeProperty<NodeId>> {
        Ok(self.built_junction_tree()?.created_cliques())
    }
}

fn max_log10_clique(record: &EliminationRecord, domain_sizes: &DomainSizes) -> f64 {
    record
        .cliques
        .values()
        .map(|c| c.iter().map(|n| (domain_sizes[n] as f64).log10()).sum::<f64>())
        .fold(0.0, f64::max)
}
