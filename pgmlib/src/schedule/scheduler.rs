use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use tracing::{debug, trace};

use super::{OpId, Schedule, ScheduleError};
use crate::{Config, Potential};

/// Executes the pending operations of a [`Schedule`].
///
/// Ready operations run in batches of at most `max_nb_threads` operations whose summed
/// memory estimate fits in `max_memory` megabytes. A failing batch is rolled back: none of
/// its outputs is committed, and the error is returned once every worker has finished.
#[derive(Debug, Clone)]
pub struct Scheduler {
    max_nb_threads: usize,
    max_memory: f64,
    config: Config,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Scheduler {
    pub fn new(config: &Config) -> Self {
        Self {
            max_nb_threads: config.max_threads().max(1),
            max_memory: config.max_memory(),
            config: config.clone(),
        }
    }

    pub fn max_nb_threads(&self) -> usize {
        self.max_nb_threads
    }

    pub fn set_max_nb_threads(&mut self, nb_threads: usize) {
        self.max_nb_threads = nb_threads.max(1);
    }

    /// Memory budget, in megabytes.
    pub fn max_memory(&self) -> f64 {
        self.max_memory
    }

    pub fn set_max_memory(&mut self, megabytes: f64) {
        self.max_memory = megabytes;
    }

    /// Run every pending operation of `schedule` exactly once.
    pub fn execute(&self, schedule: &mut Schedule) -> Result<(), ScheduleError> {
        let pending = schedule.pending_operations();
        if pending.is_empty() {
            return Ok(());
        }
        schedule.check_executable()?;
        if let Some(needed) = pending
            .iter()
            .map(|id| schedule.memory_mb(*id))
            .find(|m| *m > self.max_memory)
        {
            return Err(ScheduleError::OutOfMemory {
                needed,
                available: self.max_memory,
            });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_nb_threads)
            .build()
            .map_err(|e| ScheduleError::ThreadPool(e.to_string()))?;
        debug!(
            nb_operations = pending.len(),
            nb_threads = self.max_nb_threads,
            "executing schedule"
        );
        crate::utils::with_progress(
            |it_cnt| {
                let mut readers = schedule.pending_readers();
                loop {
                    let ready = schedule.ready_operations(&readers);
                    if ready.is_empty() {
                        return match schedule.pending_operations().first() {
                            None => Ok(()),
                            Some(id) => Err(ScheduleError::Worker {
                                op: *id,
                                msg: "operation can never become ready".to_owned(),
                            }),
                        };
                    }
                    let batch = self.select_batch(schedule, &ready);
                    trace!(batch = ?batch, "running batch");
                    let outputs = Self::run_batch(&pool, schedule, &batch);
                    // Commit only if the whole batch succeeded.
                    let mut committed = Vec::with_capacity(outputs.len());
                    for (id, output) in outputs {
                        committed.push((id, output?));
                    }
                    for (id, output) in committed {
                        schedule.commit(id, output, &mut readers);
                        it_cnt.inc(1);
                    }
                }
            },
            pending.len() as u64,
            "Scheduling",
            &self.config,
        )
    }

    fn select_batch(&self, schedule: &Schedule, ready: &[OpId]) -> Vec<OpId> {
        let mut batch = Vec::new();
        let mut memory = 0.0;
        for id in ready {
            if batch.len() >= self.max_nb_threads {
                break;
            }
            let m = schedule.memory_mb(*id);
            if !batch.is_empty() && memory + m > self.max_memory {
                continue;
            }
            memory += m;
            batch.push(*id);
        }
        batch
    }

    fn run_batch(
        pool: &rayon::ThreadPool,
        schedule: &Schedule,
        batch: &[OpId],
    ) -> Vec<(OpId, Result<Option<Potential>, ScheduleError>)> {
        pool.install(|| {
            batch
                .par_iter()
                .map(|id| {
                    let res = catch_unwind(AssertUnwindSafe(|| schedule.run(*id)));
                    let res = match res {
                        Ok(Ok(output)) => Ok(output),
                        Ok(Err(e)) => Err(ScheduleError::Worker {
                            op: *id,
                            msg: e.to_string(),
                        }),
                        Err(payload) => Err(ScheduleError::Worker {
                            op: *id,
                            msg: panic_message(payload.as_ref()),
                        }),
                    };
                    (*id, res)
                })
                .collect()
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_owned()
    }
}
