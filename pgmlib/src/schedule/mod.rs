//! Deferred table computations.
//!
//! A [`Schedule`] is a DAG of [`Operation`]s over [`TableKey`] handles. A handle is
//! *abstract* until the operation producing it has been executed by a [`Scheduler`], which
//! runs every operation exactly once, in dependency order, on a bounded thread pool and
//! within a memory budget.

mod operation;
mod scheduler;

pub use operation::{OpId, Operation, Schedule};
pub use scheduler::Scheduler;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Handle of a table of a schedule. Keys are unique across all schedules of the process and
/// increase with creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableKey(u64);

static NEXT_TABLE_KEY: AtomicU64 = AtomicU64::new(0);

impl TableKey {
    fn fresh() -> Self {
        TableKey(NEXT_TABLE_KEY.fetch_add(1, Ordering::Relaxed))
    }
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Error, Debug, Clone)]
pub enum ScheduleError {
    #[error("Table {0} is not part of the schedule.")]
    UnknownTable(TableKey),
    #[error("Table {0} is already produced by an operation.")]
    AlreadyProduced(TableKey),
    #[error("Table {0} is neither materialized nor produced by a pending operation.")]
    Unproduced(TableKey),
    #[error("Producing table {0} with this operation would create a dependency cycle.")]
    Cycle(TableKey),
    #[error("An operation needs {needed:.3} MB but the memory budget is {available:.3} MB.")]
    OutOfMemory { needed: f64, available: f64 },
    #[error("Operation {op} failed: {msg}")]
    Worker { op: OpId, msg: String },
    #[error("Cannot build the thread pool: {0}")]
    ThreadPool(String),
}
