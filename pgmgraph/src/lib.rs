//! Graph primitives used by the probabilistic graphical model library.
//!
//! Nodes are plain integer ids handed out by the graph that owns them. Every
//! other structure (variables, tables, cliques) refers to nodes through these
//! ids, never through references into the graph.

mod clique_graph;
mod di_graph;
mod mixed_graph;
mod undi_graph;

pub use clique_graph::CliqueGraph;
pub use di_graph::DiGraph;
pub use mixed_graph::MixedGraph;
pub use undi_graph::UndiGraph;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type NodeId = usize;
pub type NodeSet = BTreeSet<NodeId>;
pub type NodeProperty<T> = BTreeMap<NodeId, T>;
pub type EdgeSet = BTreeSet<Edge>;
pub type ArcSet = BTreeSet<Arc>;

/// Unordered pair of nodes. The smallest id is always stored first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    first: NodeId,
    second: NodeId,
}

impl Edge {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }
    pub fn first(&self) -> NodeId {
        self.first
    }
    pub fn second(&self) -> NodeId {
        self.second
    }
    /// The endpoint which is not `node`, if `node` is an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.first {
            Some(self.second)
        } else if node == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

/// Ordered pair of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Arc {
    tail: NodeId,
    head: NodeId,
}

impl Arc {
    pub fn new(tail: NodeId, head: NodeId) -> Self {
        Self { tail, head }
    }
    pub fn tail(&self) -> NodeId {
        self.tail
    }
    pub fn head(&self) -> NodeId {
        self.head
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node {0} does not exist.")]
    NoNode(NodeId),
    #[error("Node {0} already exists.")]
    DuplicateNode(NodeId),
    #[error("No edge between nodes {0} and {1}.")]
    NoEdge(NodeId, NodeId),
    #[error("No arc from node {0} to node {1}.")]
    NoArc(NodeId, NodeId),
    #[error("Self loops are not allowed (node {0}).")]
    SelfLoop(NodeId),
    #[error("Adding arc {tail} -> {head} would create a directed cycle.")]
    Cycle { tail: NodeId, head: NodeId },
    #[error("The directed graph contains a cycle.")]
    Cyclic,
    #[error("Not a join tree: {0}")]
    NotAJoinTree(String),
    #[error("A graph and its domain sizes must be given together.")]
    MissingDomainSizes,
    #[error("Node {0} has no domain size.")]
    NoDomainSize(NodeId),
}

pub type Result<T> = std::result::Result<T, GraphError>;
