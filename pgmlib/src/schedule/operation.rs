use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use super::{ScheduleError, TableKey};
use crate::multidim::table_size;
use crate::{CombineOp, NodeId, NodeSet, PgmError, Potential, ProjectOp, Result};

/// Index of an operation in its [`Schedule`].
pub type OpId = usize;

const BYTES_PER_MB: f64 = (1 << 20) as f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Pointwise combination of two tables. Produces a table.
    Combine {
        left: TableKey,
        right: TableKey,
        op: CombineOp,
    },
    /// Elimination of variables from a table. Produces a table.
    Project {
        arg: TableKey,
        del_vars: NodeSet,
        op: ProjectOp,
    },
    /// Copy of a table into the store of the schedule, under `name`.
    Store { arg: TableKey, name: String },
    /// Release of a table. Runs after every other operation reading it.
    Delete { arg: TableKey },
}

impl Operation {
    pub fn args(&self) -> Vec<TableKey> {
        match self {
            Operation::Combine { left, right, .. } => vec![*left, *right],
            Operation::Project { arg, .. }
            | Operation::Store { arg, .. }
            | Operation::Delete { arg } => vec![*arg],
        }
    }
    pub fn produces_table(&self) -> bool {
        matches!(self, Operation::Combine { .. } | Operation::Project { .. })
    }
}

#[derive(Debug)]
struct TableSlot {
    vars: Vec<NodeId>,
    dims: Vec<usize>,
    data: Option<Potential>,
    producer: Option<OpId>,
    persistent: bool,
    released: bool,
}

impl TableSlot {
    fn memory_mb(&self) -> f64 {
        // Sizes were checked when the table was declared.
        table_size(&self.dims).unwrap_or(usize::MAX) as f64 * std::mem::size_of::<f64>() as f64
            / BYTES_PER_MB
    }
}

#[derive(Debug)]
struct OpSlot {
    op: Operation,
    result: Option<TableKey>,
    executed: bool,
    runs: AtomicUsize,
}

/// DAG of deferred table operations.
///
/// Tables inserted with [`Schedule::insert_table`] are materialized and persistent. Tables
/// produced by operations are abstract until executed, and are released once every
/// operation reading them has run, unless marked persistent. Operations are validated when
/// inserted, so an executable schedule is always acyclic.
#[derive(Debug, Default)]
pub struct Schedule {
    tables: BTreeMap<TableKey, TableSlot>,
    ops: Vec<OpSlot>,
    stored: BTreeMap<String, Potential>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a materialized source table.
    pub fn insert_table(&mut self, table: Potential) -> TableKey {
        let key = TableKey::fresh();
        self.tables.insert(
            key,
            TableSlot {
                vars: table.vars().to_vec(),
                dims: table.dims().to_vec(),
                data: Some(table),
                producer: None,
                persistent: true,
                released: false,
            },
        );
        key
    }

    /// Declare an abstract table over `vars`, to be produced later by
    /// [`Schedule::insert_operation_into`].
    pub fn declare_table(&mut self, vars: Vec<NodeId>, dims: Vec<usize>) -> Result<TableKey> {
        if vars.len() != dims.len() {
            return Err(PgmError::Size(format!(
                "{} variables for {} domain sizes",
                vars.len(),
                dims.len()
            )));
        }
        table_size(&dims)?;
        let key = TableKey::fresh();
        self.tables.insert(
            key,
            TableSlot {
                vars,
                dims,
                data: None,
                producer: None,
                persistent: false,
                released: false,
            },
        );
        Ok(key)
    }

    fn slot(&self, key: TableKey) -> std::result::Result<&TableSlot, ScheduleError> {
        self.tables.get(&key).ok_or(ScheduleError::UnknownTable(key))
    }

    /// Variables and domain sizes of the table `op` would produce.
    fn result_scope(&self, op: &Operation) -> Result<(Vec<NodeId>, Vec<usize>)> {
        match op {
            Operation::Combine { left, right, .. } => {
                let l = self.slot(*left)?;
                let r = self.slot(*right)?;
                let mut vars = l.vars.clone();
                let mut dims = l.dims.clone();
                for (v, d) in r.vars.iter().zip(r.dims.iter()) {
                    match l.vars.iter().position(|x| x == v) {
                        Some(i) if l.dims[i] != *d => {
                            return Err(PgmError::Size(format!(
                                "node {} has domain size {} and {}",
                                v, l.dims[i], d
                            )));
                        }
                        Some(_) => {}
                        None => {
                            vars.push(*v);
                            dims.push(*d);
                        }
                    }
                }
                table_size(&dims)?;
                Ok((vars, dims))
            }
            Operation::Project { arg, del_vars, .. } => {
                let a = self.slot(*arg)?;
                Ok(a.vars
                    .iter()
                    .zip(a.dims.iter())
                    .filter(|(v, _)| !del_vars.contains(v))
                    .map(|(v, d)| (*v, *d))
                    .unzip())
            }
            Operation::Store { .. } | Operation::Delete { .. } => Ok((Vec::new(), Vec::new())),
        }
    }

    fn check_args(&self, op: &Operation) -> Result<()> {
        for a in op.args() {
            let slot = self.slot(a)?;
            if slot.released {
                return Err(ScheduleError::Unproduced(a).into());
            }
        }
        Ok(())
    }

    fn push(&mut self, op: Operation, result: Option<TableKey>) -> OpId {
        let id = self.ops.len();
        if let Some(r) = result {
            if let Some(slot) = self.tables.get_mut(&r) {
                slot.producer = Some(id);
            }
        }
        self.ops.push(OpSlot {
            op,
            result,
            executed: false,
            runs: AtomicUsize::new(0),
        });
        id
    }

    /// Insert an operation, returning the abstract table it produces (if any).
    pub fn insert_operation(&mut self, op: Operation) -> Result<Option<TableKey>> {
        self.check_args(&op)?;
        let result = if op.produces_table() {
            let (vars, dims) = self.result_scope(&op)?;
            Some(self.declare_table(vars, dims)?)
        } else {
            None
        };
        self.push(op, result);
        Ok(result)
    }

    /// Insert an operation producing the abstract table `result`, declared beforehand.
    pub fn insert_operation_into(&mut self, op: Operation, result: TableKey) -> Result<OpId> {
        self.check_args(&op)?;
        if !op.produces_table() {
            return Err(PgmError::InvalidArgument(format!(
                "{:?} does not produce a table",
                op
            )));
        }
        let slot = self.slot(result)?;
        if slot.producer.is_some() || slot.data.is_some() {
            return Err(ScheduleError::AlreadyProduced(result).into());
        }
        let (vars, dims) = self.result_scope(&op)?;
        let mut declared: Vec<(NodeId, usize)> =
            slot.vars.iter().copied().zip(slot.dims.iter().copied()).collect();
        let mut produced: Vec<(NodeId, usize)> = vars.into_iter().zip(dims).collect();
        declared.sort_unstable();
        produced.sort_unstable();
        if declared != produced {
            return Err(PgmError::InvalidArgument(format!(
                "operation produces a table over {:?}, not over {:?}",
                produced, declared
            )));
        }
        if self.depends_on(&op, result) {
            return Err(ScheduleError::Cycle(result).into());
        }
        Ok(self.push(op, Some(result)))
    }

    /// Whether the arguments of `op` are, transitively, computed from `key`.
    fn depends_on(&self, op: &Operation, key: TableKey) -> bool {
        let mut stack = op.args();
        let mut seen = std::collections::BTreeSet::new();
        while let Some(t) = stack.pop() {
            if t == key {
                return true;
            }
            if !seen.insert(t) {
                continue;
            }
            if let Some(p) = self.tables.get(&t).and_then(|s| s.producer) {
                stack.extend(self.ops[p].op.args());
            }
        }
        false
    }

    pub fn combine(&mut self, left: TableKey, right: TableKey, op: CombineOp) -> Result<TableKey> {
        let res = self.insert_operation(Operation::Combine { left, right, op })?;
        Ok(res.expect("combinations produce a table"))
    }

    pub fn project(&mut self, arg: TableKey, del_vars: NodeSet, op: ProjectOp) -> Result<TableKey> {
        let res = self.insert_operation(Operation::Project { arg, del_vars, op })?;
        Ok(res.expect("projections produce a table"))
    }

    pub fn store(&mut self, arg: TableKey, name: impl Into<String>) -> Result<()> {
        self.insert_operation(Operation::Store {
            arg,
            name: name.into(),
        })?;
        Ok(())
    }

    pub fn delete(&mut self, arg: TableKey) -> Result<()> {
        self.insert_operation(Operation::Delete { arg })?;
        Ok(())
    }

    /// Keep (or not) a table once the operations reading it have run.
    pub fn set_persistent(&mut self, key: TableKey, persistent: bool) -> Result<()> {
        self.tables
            .get_mut(&key)
            .ok_or(ScheduleError::UnknownTable(key))?
            .persistent = persistent;
        Ok(())
    }

    pub fn is_materialized(&self, key: TableKey) -> bool {
        self.tables.get(&key).is_some_and(|s| s.data.is_some())
    }

    /// A materialized table.
    pub fn table(&self, key: TableKey) -> Result<&Potential> {
        Ok(self
            .slot(key)?
            .data
            .as_ref()
            .ok_or(ScheduleError::Unproduced(key))?)
    }

    /// Table stored under `name` by a [`Operation::Store`].
    pub fn stored(&self, name: &str) -> Option<&Potential> {
        self.stored.get(name)
    }

    pub fn take_stored(&mut self, name: &str) -> Option<Potential> {
        self.stored.remove(name)
    }

    pub fn operation(&self, id: OpId) -> Option<&Operation> {
        self.ops.get(id).map(|s| &s.op)
    }

    pub fn result(&self, id: OpId) -> Option<TableKey> {
        self.ops.get(id).and_then(|s| s.result)
    }

    pub fn nb_operations(&self) -> usize {
        self.ops.len()
    }

    pub fn pending_operations(&self) -> Vec<OpId> {
        (0..self.ops.len()).filter(|i| !self.ops[*i].executed).collect()
    }

    pub fn is_executed(&self, id: OpId) -> bool {
        self.ops.get(id).is_some_and(|s| s.executed)
    }

    /// Number of times the body of each operation has been run.
    pub fn run_counts(&self) -> Vec<usize> {
        self.ops
            .iter()
            .map(|s| s.runs.load(Ordering::Relaxed))
            .collect()
    }

    /// Estimated memory needed to run `id`, in megabytes.
    pub(super) fn memory_mb(&self, id: OpId) -> f64 {
        let slot = &self.ops[id];
        match (&slot.op, slot.result) {
            (_, Some(r)) => self.tables[&r].memory_mb(),
            (Operation::Store { arg, .. }, None) => self.tables[arg].memory_mb(),
            _ => 0.0,
        }
    }

    /// Check that every pending operation can eventually run.
    pub(super) fn check_executable(&self) -> std::result::Result<(), ScheduleError> {
        for id in self.pending_operations() {
            for a in self.ops[id].op.args() {
                let slot = self.slot(a)?;
                let producible = slot
                    .producer
                    .is_some_and(|p| !self.ops[p].executed || slot.data.is_some());
                if slot.released || (slot.data.is_none() && !producible) {
                    return Err(ScheduleError::Unproduced(a));
                }
            }
        }
        Ok(())
    }

    /// Number of pending operations reading each table.
    pub(super) fn pending_readers(&self) -> BTreeMap<TableKey, usize> {
        let mut readers = BTreeMap::new();
        for id in self.pending_operations() {
            for a in self.ops[id].op.args() {
                *readers.entry(a).or_insert(0) += 1;
            }
        }
        readers
    }

    /// Pending operations whose arguments are materialized. A deletion is ready once it is
    /// the last pending reader of its table.
    pub(super) fn ready_operations(&self, readers: &BTreeMap<TableKey, usize>) -> Vec<OpId> {
        self.pending_operations()
            .into_iter()
            .filter(|id| {
                let op = &self.ops[*id].op;
                let materialized = op.args().iter().all(|a| self.is_materialized(*a));
                match op {
                    Operation::Delete { arg } => {
                        materialized && readers.get(arg).copied().unwrap_or(0) <= 1
                    }
                    _ => materialized,
                }
            })
            .collect()
    }

    /// Run the body of `id`, reading its materialized arguments. Nothing is committed.
    pub(super) fn run(&self, id: OpId) -> Result<Option<Potential>> {
        let slot = &self.ops[id];
        slot.runs.fetch_add(1, Ordering::Relaxed);
        match &slot.op {
            Operation::Combine { left, right, op } => {
                Ok(Some(self.table(*left)?.combine(self.table(*right)?, *op)?))
            }
            Operation::Project { arg, del_vars, op } => {
                Ok(Some(self.table(*arg)?.project(del_vars, *op)))
            }
            Operation::Store { arg, name } => {
                if self.stored.contains_key(name) {
                    return Err(PgmError::OperationNotAllowed(format!(
                        "a table is already stored under {}",
                        name
                    )));
                }
                Ok(Some(self.table(*arg)?.clone()))
            }
            Operation::Delete { .. } => Ok(None),
        }
    }

    /// Record the outcome of an executed operation and release the tables it was the last
    /// reader of.
    pub(super) fn commit(
        &mut self,
        id: OpId,
        output: Option<Potential>,
        readers: &mut BTreeMap<TableKey, usize>,
    ) {
        let op = self.ops[id].op.clone();
        match (&op, output) {
            (Operation::Store { name, .. }, Some(table)) => {
                self.stored.insert(name.clone(), table);
            }
            (_, Some(table)) => {
                if let Some(r) = self.ops[id].result {
                    if let Some(slot) = self.tables.get_mut(&r) {
                        slot.data = Some(table);
                    }
                }
            }
            _ => {}
        }
        self.ops[id].executed = true;
        for a in op.args() {
            let remaining = readers.entry(a).or_insert(1);
            *remaining = remaining.saturating_sub(1);
            let last = *remaining == 0;
            if let Some(slot) = self.tables.get_mut(&a) {
                let explicit = matches!(op, Operation::Delete { .. });
                if explicit || (last && !slot.persistent) {
                    slot.data = None;
                    slot.released = true;
                }
            }
        }
    }
}
