use serde::{Deserialize, Serialize};

use super::Potential;
use crate::{NodeSet, Result};

/// Pointwise binary operator used by [`Potential::combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombineOp {
    Multiply,
    Add,
    Subtract,
    Divide,
    Max,
    Min,
}

impl CombineOp {
    #[inline(always)]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            CombineOp::Multiply => a * b,
            CombineOp::Add => a + b,
            CombineOp::Subtract => a - b,
            // 0/0 is 0, as when dividing out an already-absorbed message.
            CombineOp::Divide => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            CombineOp::Max => a.max(b),
            CombineOp::Min => a.min(b),
        }
    }
    pub fn is_commutative(self) -> bool {
        !matches!(self, CombineOp::Subtract | CombineOp::Divide)
    }
    /// Value `e` such that `apply(x, e) == x`.
    pub fn neutral(self) -> f64 {
        match self {
            CombineOp::Multiply | CombineOp::Divide => 1.0,
            CombineOp::Add | CombineOp::Subtract => 0.0,
            CombineOp::Max => f64::NEG_INFINITY,
            CombineOp::Min => f64::INFINITY,
        }
    }
}

/// Reduction used by [`Potential::project`] to eliminate variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectOp {
    Sum,
    Max,
    Min,
    Product,
    /// `ln(sum(exp(x)))`, the sum of a table stored in log space.
    LogSumExp,
}

impl ProjectOp {
    pub fn reduce(self, values: impl Iterator<Item = f64>) -> f64 {
        match self {
            ProjectOp::Sum => values.sum(),
            ProjectOp::Max => values.fold(f64::NEG_INFINITY, f64::max),
            ProjectOp::Min => values.fold(f64::INFINITY, f64::min),
            ProjectOp::Product => values.product(),
            ProjectOp::LogSumExp => {
                let values: Vec<f64> = values.collect();
                log_sum_exp(&values)
            }
        }
    }
    /// Reduction of `n` copies of `c`.
    pub fn reduce_constant(self, c: f64, n: usize) -> f64 {
        match self {
            ProjectOp::Sum => c * n as f64,
            ProjectOp::Max | ProjectOp::Min => c,
            ProjectOp::Product => c.powi(n as i32),
            ProjectOp::LogSumExp => c + (n as f64).ln(),
        }
    }
}

pub(crate) fn log_sum_exp(values: &[f64]) -> f64 {
    let m = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if m == f64::NEG_INFINITY || m.is_nan() {
        return m;
    }
    m + values.iter().map(|x| (x - m).exp()).sum::<f64>().ln()
}

/// Pair of combination and projection operators that message passing works with.
///
/// This is passed explicitly to the inference engines instead of being looked up in a
/// global table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAlgebra {
    pub combine: CombineOp,
    pub project: ProjectOp,
}

impl Default for TableAlgebra {
    fn default() -> Self {
        Self::sum_product()
    }
}

impl TableAlgebra {
    /// Marginal probabilities.
    pub fn sum_product() -> Self {
        Self {
            combine: CombineOp::Multiply,
            project: ProjectOp::Sum,
        }
    }
    /// Max-marginals, for most probable explanations.
    pub fn max_product() -> Self {
        Self {
            combine: CombineOp::Multiply,
            project: ProjectOp::Max,
        }
    }
    /// Marginals of tables stored in log space.
    pub fn log_sum() -> Self {
        Self {
            combine: CombineOp::Add,
            project: ProjectOp::LogSumExp,
        }
    }
    /// Minimum energies, an energy being `-ln(p)`. Normalized results match
    /// [`TableAlgebra::max_product`].
    pub fn min_sum() -> Self {
        Self {
            combine: CombineOp::Add,
            project: ProjectOp::Min,
        }
    }

    /// Whether tables hold logarithms (or energies) rather than probabilities.
    pub fn is_log_domain(&self) -> bool {
        self.combine == CombineOp::Add
    }

    /// Whether tables hold energies `-ln(p)`, minimized by the projection.
    pub fn is_energy_domain(&self) -> bool {
        self.is_log_domain() && self.project == ProjectOp::Min
    }

    pub fn combine(&self, a: &Potential, b: &Potential) -> Result<Potential> {
        a.combine(b, self.combine)
    }

    pub fn project(&self, p: &Potential, del_vars: &NodeSet) -> Potential {
        p.project(del_vars, self.project)
    }

    /// Combination of all the tables, or the neutral scalar if there is none.
    pub fn combine_all<'a>(&self, tables: impl IntoIterator<Item = &'a Potential>) -> Result<Potential> {
        let mut acc: Option<Potential> = None;
        for t in tables {
            acc = Some(match acc {
                None => t.clone(),
                Some(acc) => acc.combine(t, self.combine)?,
            });
        }
        Ok(acc.unwrap_or_else(|| Potential::scalar(self.combine.neutral())))
    }

    /// Convert a probability table (evidence, CPT) to the domain of this algebra.
    pub fn from_probabilities(&self, p: Potential) -> Potential {
        if self.is_energy_domain() {
            p.map(|x| -x.ln())
        } else if self.is_log_domain() {
            p.map(f64::ln)
        } else {
            p
        }
    }

    /// Convert a table of this algebra to non-negative weights.
    pub fn to_probabilities(&self, p: Potential) -> Potential {
        if self.is_energy_domain() {
            let m = p.min();
            if m.is_finite() {
                p.map(|e| (-(e - m)).exp())
            } else {
                p.map(|e| (-e).exp())
            }
        } else if self.is_log_domain() {
            let m = p.max();
            if m.is_finite() {
                p.map(|x| (x - m).exp())
            } else {
                p.map(|x| x.exp())
            }
        } else {
            p
        }
    }
}
