//! Exact inference for discrete probabilistic graphical models.
//!
//! The pipeline goes from a [`model::GraphicalModel`] (Bayesian network or Markov random field)
//! to its moral graph, triangulated by an [`triangulation::EliminationSequenceStrategy`], then to
//! a junction tree on which [`inference::ShaferShenoy`] passes messages made of
//! [`multidim::Potential`] combinations and projections. Messages may be computed directly or
//! through a [`schedule::Schedule`] executed by a multi-threaded [`schedule::Scheduler`].

pub mod inference;
pub mod instantiation;
pub mod model;
pub mod multidim;
pub mod schedule;
pub mod triangulation;
pub(crate) mod utils;
pub mod variable;

pub use instantiation::Instantiation;
pub use multidim::{CombineOp, Potential, ProjectOp, TableAlgebra};
pub use pgmgraph::{NodeId, NodeProperty, NodeSet};
pub use variable::DiscreteVariable;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PgmError>;

/// Domain size of each node of a graph.
pub type DomainSizes = NodeProperty<usize>;

#[derive(Error, Debug, Clone)]
pub enum PgmError {
    #[error("Graph error: {0}")]
    Graph(#[from] pgmgraph::GraphError),
    #[error("Not found: {0}.")]
    NotFound(String),
    #[error("Operation not allowed: {0}.")]
    OperationNotAllowed(String),
    #[error("Size error: {0}.")]
    Size(String),
    #[error("Value {value} is out of the domain of variable {var} (domain size {domain_size}).")]
    OutOfBounds {
        var: String,
        value: usize,
        domain_size: usize,
    },
    #[error("The evidence has probability zero.")]
    IncompatibleEvidence,
    #[error("Invalid argument: {0}.")]
    InvalidArgument(String),
    #[error("Scheduling error: {0}")]
    Schedule(#[from] schedule::ScheduleError),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Computation time after which a progress bar is displayed.
    /// This avoids showing progress bars for negligible amounts of time.
    /// If None, never display the progress bar
    progress_min_time: Option<std::time::Duration>,
    /// Maximum number of threads used by the scheduler.
    max_threads: usize,
    /// Memory budget of the scheduler, in megabytes.
    max_memory: f64,
    /// Compute messages through a schedule instead of sequentially.
    use_scheduler: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::no_progress()
    }
}

impl Config {
    pub fn with_default_timing() -> Self {
        Self {
            progress_min_time: Some(std::time::Duration::from_millis(500)),
            ..Self::no_progress()
        }
    }
    pub fn no_progress() -> Self {
        Self {
            progress_min_time: None,
            max_threads: num_cpus::get(),
            max_memory: f64::INFINITY,
            use_scheduler: false,
        }
    }
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads.max(1);
        self
    }
    pub fn with_max_memory(mut self, megabytes: f64) -> Self {
        self.max_memory = megabytes;
        self
    }
    pub fn with_scheduler(mut self, use_scheduler: bool) -> Self {
        self.use_scheduler = use_scheduler;
        self
    }
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }
    pub fn max_memory(&self) -> f64 {
        self.max_memory
    }
    pub fn use_scheduler(&self) -> bool {
        self.use_scheduler
    }
    pub fn progress_min_time(&self) -> Option<std::time::Duration> {
        self.progress_min_time
    }
}
