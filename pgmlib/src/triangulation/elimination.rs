//! Elimination sequence strategies.
//!
//! A strategy works on its own copy of an undirected graph. Each call to
//! [`EliminationSequenceStrategy::elimination_update`] connects the neighbours of the
//! eliminated node (the fill-in edges) and removes it from that copy, so that the heuristic
//! scores of the next steps are computed on the partially eliminated graph.

use std::fmt::Debug;

use pgmgraph::{EdgeSet, GraphError, UndiGraph};

use crate::{DomainSizes, NodeId, NodeProperty, NodeSet, PgmError, Result};

/// Scores closer than this are considered equal (weighted heuristics are computed in log
/// space and accumulate rounding errors).
const SCORE_EPSILON: f64 = 1e-9;

pub trait EliminationSequenceStrategy: Debug + Send {
    /// Bind a graph and the domain sizes of its nodes, or detach with `(None, None)`.
    ///
    /// Giving only one of them, or a graph with a node that has no domain size, is a
    /// [`GraphError`].
    fn set_graph(
        &mut self,
        graph: Option<&UndiGraph>,
        domain_sizes: Option<&DomainSizes>,
    ) -> Result<()>;

    /// Detach the graph and forget the fill-ins.
    fn clear(&mut self);

    /// Node that should be eliminated next.
    ///
    /// Fails with [`PgmError::OperationNotAllowed`] when every node has been eliminated.
    fn next_node_to_eliminate(&mut self) -> Result<NodeId>;

    /// Eliminate `node`: connect its neighbours then remove it.
    ///
    /// Eliminating a node twice fails with [`PgmError::OperationNotAllowed`].
    fn elimination_update(&mut self, node: NodeId) -> Result<()>;

    /// Whether fill-in edges should be recorded.
    fn ask_fill_ins(&mut self, track: bool);

    fn provides_fill_ins(&self) -> bool;

    /// Fill-in edges added so far (empty when not tracked).
    fn fill_ins(&self) -> &EdgeSet;

    /// The partially eliminated graph.
    fn graph(&self) -> Option<&UndiGraph>;

    /// Fresh strategy of the same kind and parameters, with no graph bound.
    fn new_factory(&self) -> Box<dyn EliminationSequenceStrategy>;
}

/// Working graph and caches shared by all strategies.
#[derive(Debug, Clone, Default)]
struct EliminationGraph {
    graph: Option<UndiGraph>,
    log_sizes: NodeProperty<f64>,
    track_fill_ins: bool,
    fill_ins: EdgeSet,
}

impl EliminationGraph {
    fn bind(
        &mut self,
        graph: Option<&UndiGraph>,
        domain_sizes: Option<&DomainSizes>,
    ) -> Result<()> {
        match (graph, domain_sizes) {
            (None, None) => {
                self.clear();
                Ok(())
            }
            (Some(graph), Some(domain_sizes)) => {
                let mut log_sizes = NodeProperty::new();
                for n in graph.nodes() {
                    match domain_sizes.get(&n) {
                        Some(0) => {
                            return Err(PgmError::Size(format!("node {} has an empty domain", n)))
                        }
                        Some(d) => {
                            log_sizes.insert(n, (*d as f64).ln());
                        }
                        None => return Err(GraphError::NoDomainSize(n).into()),
                    }
                }
                self.log_sizes = log_sizes;
                self.graph = Some(graph.clone());
                self.fill_ins.clear();
                Ok(())
            }
            _ => Err(GraphError::MissingDomainSizes.into()),
        }
    }

    fn clear(&mut self) {
        self.graph = None;
        self.log_sizes.clear();
        self.fill_ins.clear();
    }

    fn working(&self) -> Result<&UndiGraph> {
        self.graph
            .as_ref()
            .ok_or_else(|| PgmError::OperationNotAllowed("no graph to eliminate".to_owned()))
    }

    fn check_not_exhausted(&self) -> Result<&UndiGraph> {
        let graph = self.working()?;
        if graph.is_empty() {
            return Err(PgmError::OperationNotAllowed(
                "every node has already been eliminated".to_owned(),
            ));
        }
        Ok(graph)
    }

    /// Eliminate `node`, returning its neighbours at elimination time.
    fn eliminate(&mut self, node: NodeId) -> Result<NodeSet> {
        let graph = self
            .graph
            .as_mut()
            .ok_or_else(|| PgmError::OperationNotAllowed("no graph to eliminate".to_owned()))?;
        if !graph.exists_node(node) {
            return Err(PgmError::OperationNotAllowed(format!(
                "node {} is not in the graph (unknown or already eliminated)",
                node
            )));
        }
        let neighbours = graph.neighbours(node)?.clone();
        let added = graph.make_complete(&neighbours)?;
        if self.track_fill_ins {
            self.fill_ins.extend(added);
        }
        graph.erase_node(node)?;
        Ok(neighbours)
    }
}

/// Cost function of the unconstrained strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EliminationHeuristic {
    /// Number of fill-in edges eliminating the node would add.
    MinFill,
    /// Current degree of the node.
    MinDegree,
    /// Log of the domain size of the clique formed by the node and its neighbours.
    #[default]
    WeightedMinFill,
}

impl EliminationHeuristic {
    fn score(self, graph: &UndiGraph, log_sizes: &NodeProperty<f64>, node: NodeId) -> f64 {
        let neighbours = graph.neighbours(node).expect("scored nodes are in the graph");
        match self {
            EliminationHeuristic::MinDegree => neighbours.len() as f64,
            EliminationHeuristic::MinFill => neighbours
                .iter()
                .map(|a| {
                    neighbours
                        .range((a + 1)..)
                        .filter(|b| !graph.exists_edge(*a, **b))
                        .count()
                })
                .sum::<usize>() as f64,
            EliminationHeuristic::WeightedMinFill => {
                log_sizes[&node] + neighbours.iter().map(|n| log_sizes[n]).sum::<f64>()
            }
        }
    }
}

/// Unconstrained elimination: always the node of lowest score, lowest id on ties.
#[derive(Debug, Clone, Default)]
pub struct DefaultEliminationSequenceStrategy {
    heuristic: EliminationHeuristic,
    state: EliminationGraph,
    scores: NodeProperty<f64>,
}

impl DefaultEliminationSequenceStrategy {
    pub fn new(heuristic: EliminationHeuristic) -> Self {
        Self {
            heuristic,
            ..Default::default()
        }
    }

    pub fn heuristic(&self) -> EliminationHeuristic {
        self.heuristic
    }

    fn rescore(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        if let Some(graph) = self.state.graph.as_ref() {
            for n in nodes {
                let s = self.heuristic.score(graph, &self.state.log_sizes, n);
                self.scores.insert(n, s);
            }
        }
    }

    /// Lowest-score node among `candidates`, which must be in the working graph and sorted
    /// by increasing id.
    fn best_among(&self, candidates: impl IntoIterator<Item = NodeId>) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for n in candidates {
            let s = self.scores[&n];
            match best {
                Some((_, b)) if s >= b - SCORE_EPSILON => {}
                _ => best = Some((n, s)),
            }
        }
        best.map(|(n, _)| n)
    }
}

impl EliminationSequenceStrategy for DefaultEliminationSequenceStrategy {
    fn set_graph(
        &mut self,
        graph: Option<&UndiGraph>,
        domain_sizes: Option<&DomainSizes>,
    ) -> Result<()> {
        self.state.bind(graph, domain_sizes)?;
        self.scores.clear();
        let nodes: Vec<NodeId> = self
            .state
            .graph
            .as_ref()
            .map(|g| g.nodes().collect())
            .unwrap_or_default();
        self.rescore(nodes);
        Ok(())
    }

    fn clear(&mut self) {
        self.state.clear();
        self.scores.clear();
    }

    fn next_node_to_eliminate(&mut self) -> Result<NodeId> {
        let graph = self.state.check_not_exhausted()?;
        Ok(self
            .best_among(graph.nodes())
            .expect("the graph is not empty"))
    }

    fn elimination_update(&mut self, node: NodeId) -> Result<()> {
        let neighbours = self.state.eliminate(node)?;
        self.scores.remove(&node);
        let graph = self.state.working()?;
        // Fill-ins between two neighbours change the scores of their common neighbours.
        let mut affected = neighbours.clone();
        for n in neighbours.iter() {
            affected.extend(graph.neighbours(*n)?.iter().copied());
        }
        self.rescore(affected);
        Ok(())
    }

    fn ask_fill_ins(&mut self, track: bool) {
        self.state.track_fill_ins = track;
    }

    fn provides_fill_ins(&self) -> bool {
        self.state.track_fill_ins
    }

    fn fill_ins(&self) -> &EdgeSet {
        &self.state.fill_ins
    }

    fn graph(&self) -> Option<&UndiGraph> {
        self.state.graph.as_ref()
    }

    fn new_factory(&self) -> Box<dyn EliminationSequenceStrategy> {
        let mut fresh = Self::new(self.heuristic);
        fresh.ask_fill_ins(self.provides_fill_ins());
        Box::new(fresh)
    }
}

/// Elimination in a fixed order.
///
/// Every node of the graph must appear in the order; nodes of the order that are not in the
/// graph are skipped.
#[derive(Debug, Clone, Default)]
pub struct OrderedEliminationSequenceStrategy {
    order: Vec<NodeId>,
    next: usize,
    state: EliminationGraph,
}

impl OrderedEliminationSequenceStrategy {
    pub fn new(order: Vec<NodeId>) -> Self {
        Self {
            order,
            ..Default::default()
        }
    }

    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Replace the order. If a graph is bound, it must be covered by the new order.
    pub fn set_order(&mut self, order: Vec<NodeId>) -> Result<()> {
        if let Some(graph) = self.state.graph.as_ref() {
            check_order_covers(&order, graph)?;
        }
        self.order = order;
        self.next = 0;
        Ok(())
    }
}

fn check_order_covers(order: &[NodeId], graph: &UndiGraph) -> Result<()> {
    let in_order: NodeSet = order.iter().copied().collect();
    match graph.nodes().find(|n| !in_order.contains(n)) {
        Some(n) => Err(PgmError::InvalidArgument(format!(
            "node {} is missing from the elimination order",
            n
        ))),
        None => Ok(()),
    }
}

impl EliminationSequenceStrategy for OrderedEliminationSequenceStrategy {
    fn set_graph(
        &mut self,
        graph: Option<&UndiGraph>,
        domain_sizes: Option<&DomainSizes>,
    ) -> Result<()> {
        if let Some(graph) = graph {
            check_order_covers(&self.order, graph)?;
        }
        self.state.bind(graph, domain_sizes)?;
        self.next = 0;
        Ok(())
    }

    fn clear(&mut self) {
        self.state.clear();
        self.next = 0;
    }

    fn next_node_to_eliminate(&mut self) -> Result<NodeId> {
        let graph = self.state.check_not_exhausted()?;
        while self.next < self.order.len() {
            let n = self.order[self.next];
            if graph.exists_node(n) {
                return Ok(n);
            }
            self.next += 1;
        }
        Err(PgmError::OperationNotAllowed(
            "the elimination order is exhausted".to_owned(),
        ))
    }

    fn elimination_update(&mut self, node: NodeId) -> Result<()> {
        self.state.eliminate(node)?;
        Ok(())
    }

    fn ask_fill_ins(&mut self, track: bool) {
        self.state.track_fill_ins = track;
    }

    fn provides_fill_ins(&self) -> bool {
        self.state.track_fill_ins
    }

    fn fill_ins(&self) -> &EdgeSet {
        &self.state.fill_ins
    }

    fn graph(&self) -> Option<&UndiGraph> {
        self.state.graph.as_ref()
    }

    fn new_factory(&self) -> Box<dyn EliminationSequenceStrategy> {
        let mut fresh = Self::new(self.order.clone());
        fresh.ask_fill_ins(self.provides_fill_ins());
        Box::new(fresh)
    }
}

/// Elimination constrained by an ordered partition: every node of subset `i` is eliminated
/// before any node of subset `i + 1`. Inside a subset, the heuristic decides.
///
/// Nodes of the graph that belong to no subset are eliminated last.
#[derive(Debug, Clone, Default)]
pub struct PartialOrderedEliminationSequenceStrategy {
    subsets: Vec<NodeSet>,
    current: usize,
    inner: DefaultEliminationSequenceStrategy,
}

impl PartialOrderedEliminationSequenceStrategy {
    pub fn new(heuristic: EliminationHeuristic, subsets: Vec<NodeSet>) -> Result<Self> {
        let mut s = Self {
            inner: DefaultEliminationSequenceStrategy::new(heuristic),
            ..Default::default()
        };
        s.set_partial_order(subsets)?;
        Ok(s)
    }

    pub fn partial_order(&self) -> &[NodeSet] {
        &self.subsets
    }

    pub fn set_partial_order(&mut self, subsets: Vec<NodeSet>) -> Result<()> {
        let mut seen = NodeSet::new();
        for subset in subsets.iter() {
            if let Some(n) = subset.iter().find(|n| seen.contains(n)) {
                return Err(PgmError::InvalidArgument(format!(
                    "node {} belongs to two subsets of the partial order",
                    n
                )));
            }
            seen.extend(subset.iter().copied());
        }
        self.subsets = subsets;
        self.current = 0;
        Ok(())
    }
}

impl EliminationSequenceStrategy for PartialOrderedEliminationSequenceStrategy {
    fn set_graph(
        &mut self,
        graph: Option<&UndiGraph>,
        domain_sizes: Option<&DomainSizes>,
    ) -> Result<()> {
        self.inner.set_graph(graph, domain_sizes)?;
        self.current = 0;
        Ok(())
    }

    fn clear(&mut self) {
        self.inner.clear();
        self.current = 0;
    }

    fn next_node_to_eliminate(&mut self) -> Result<NodeId> {
        let graph = self.inner.state.check_not_exhausted()?;
        while self.current < self.subsets.len() {
            let candidates = self.subsets[self.current]
                .iter()
                .copied()
                .filter(|n| graph.exists_node(*n));
            if let Some(n) = self.inner.best_among(candidates) {
                return Ok(n);
            }
            self.current += 1;
        }
        let candidates = graph
            .nodes()
            .filter(|n| !self.subsets.iter().any(|s| s.contains(n)));
        Ok(self
            .inner
            .best_among(candidates)
            .expect("the graph is not empty and every subset is eliminated"))
    }

    fn elimination_update(&mut self, node: NodeId) -> Result<()> {
        self.inner.elimination_update(node)
    }

    fn ask_fill_ins(&mut self, track: bool) {
        self.inner.ask_fill_ins(track);
    }

    fn provides_fill_ins(&self) -> bool {
        self.inner.provides_fill_ins()
    }

    fn fill_ins(&self) -> &EdgeSet {
        self.inner.fill_ins()
    }

    fn graph(&self) -> Option<&UndiGraph> {
        self.inner.graph()
    }

    fn new_factory(&self) -> Box<dyn EliminationSequenceStrategy> {
        let mut fresh = Self {
            subsets: self.subsets.clone(),
            current: 0,
            inner: DefaultEliminationSequenceStrategy::new(self.inner.heuristic),
        };
        fresh.ask_fill_ins(self.provides_fill_ins());
        Box::new(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cycle 0-1-2-3-0 with a pendant node 4 attached to 0.
    fn square_with_tail() -> (UndiGraph, DomainSizes) {
        let mut g = UndiGraph::with_nodes(5);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0), (0, 4)] {
            g.add_edge(a, b).unwrap();
        }
        let ds = (0..5).map(|n| (n, 2)).collect();
        (g, ds)
    }

    fn full_order(s: &mut dyn EliminationSequenceStrategy) -> Vec<NodeId> {
        let mut order = Vec::new();
        while s.graph().map_or(false, |g| !g.is_empty()) {
            let n = s.next_node_to_eliminate().unwrap();
            s.elimination_update(n).unwrap();
            order.push(n);
        }
        order
    }

    #[test]
    fn both_or_neither() {
        let (g, ds) = square_with_tail();
        let mut s = DefaultEliminationSequenceStrategy::new(EliminationHeuristic::MinFill);
        assert!(matches!(
            s.set_graph(Some(&g), None),
            Err(PgmError::Graph(GraphError::MissingDomainSizes))
        ));
        assert!(matches!(
            s.set_graph(None, Some(&ds)),
            Err(PgmError::Graph(GraphError::MissingDomainSizes))
        ));
        let mut partial = ds.clone();
        partial.remove(&3);
        assert!(matches!(
            s.set_graph(Some(&g), Some(&partial)),
            Err(PgmError::Graph(GraphError::NoDomainSize(3)))
        ));
        s.set_graph(None, None).unwrap();
        assert!(s.graph().is_none());
    }

    #[test]
    fn min_fill_order_and_fill_ins() {
        let (g, ds) = square_with_tail();
        let mut s = DefaultEliminationSequenceStrategy::new(EliminationHeuristic::MinFill);
        s.ask_fill_ins(true);
        s.set_graph(Some(&g), Some(&ds)).unwrap();
        // 4 has a single neighbour: no fill-in. Then every node of the square needs one;
        // 0 is the lowest id.
        assert_eq!(full_order(&mut s), vec![4, 0, 1, 2, 3]);
        assert_eq!(s.fill_ins().len(), 1);
        assert!(s.fill_ins().contains(&pgmgraph::Edge::new(1, 3)));
    }

    #[test]
    fn min_degree_prefers_leaves() {
        let (g, ds) = square_with_tail();
        let mut s = DefaultEliminationSequenceStrategy::new(EliminationHeuristic::MinDegree);
        s.set_graph(Some(&g), Some(&ds)).unwrap();
        assert_eq!(s.next_node_to_eliminate().unwrap(), 4);
        assert!(s.fill_ins().is_empty());
    }

    #[test]
    fn weighted_min_fill_uses_domain_sizes() {
        let mut g = UndiGraph::with_nodes(3);
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        let ds = DomainSizes::from([(0, 10), (1, 2), (2, 3)]);
        let mut s = DefaultEliminationSequenceStrategy::default();
        s.set_graph(Some(&g), Some(&ds)).unwrap();
        // Cliques: {0,1} -> 20, {0,1,2} -> 60, {1,2} -> 6.
        assert_eq!(full_order(&mut s)[0], 2);
    }

    #[test]
    fn double_elimination_is_rejected() {
        let (g, ds) = square_with_tail();
        let mut s = DefaultEliminationSequenceStrategy::default();
        s.set_graph(Some(&g), Some(&ds)).unwrap();
        s.elimination_update(2).unwrap();
        assert!(matches!(
            s.elimination_update(2),
            Err(PgmError::OperationNotAllowed(_))
        ));
    }

    #[test]
    fn exhausted_graph() {
        let g = UndiGraph::with_nodes(1);
        let ds = DomainSizes::from([(0, 2)]);
        let mut s = OrderedEliminationSequenceStrategy::new(vec![0]);
        s.set_graph(Some(&g), Some(&ds)).unwrap();
        assert_eq!(s.next_node_to_eliminate().unwrap(), 0);
        s.elimination_update(0).unwrap();
        assert!(s.next_node_to_eliminate().is_err());
    }

    #[test]
    fn ordered_requires_every_node() {
        let (g, ds) = square_with_tail();
        let mut s = OrderedEliminationSequenceStrategy::new(vec![3, 2, 1, 0]);
        assert!(s.set_graph(Some(&g), Some(&ds)).is_err());
        s.set_order(vec![9, 3, 2, 1, 4, 0]).unwrap();
        s.set_graph(Some(&g), Some(&ds)).unwrap();
        assert_eq!(full_order(&mut s), vec![3, 2, 1, 4, 0]);
    }

    #[test]
    fn partial_order_is_respected() {
        let (g, ds) = square_with_tail();
        let subsets = vec![NodeSet::from([0, 2]), NodeSet::from([1, 3])];
        let mut s =
            PartialOrderedEliminationSequenceStrategy::new(EliminationHeuristic::MinFill, subsets)
                .unwrap();
        s.set_graph(Some(&g), Some(&ds)).unwrap();
        let order = full_order(&mut s);
        let pos = |n| order.iter().position(|m| *m == n).unwrap();
        assert!(pos(0).max(pos(2)) < pos(1).min(pos(3)));
        assert_eq!(pos(4), 4);
        assert!(PartialOrderedEliminationSequenceStrategy::new(
            EliminationHeuristic::MinFill,
            vec![NodeSet::from([0]), NodeSet::from([0, 1])]
        )
        .is_err());
    }
}
