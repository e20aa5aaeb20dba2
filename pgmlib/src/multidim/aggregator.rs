use serde::{Deserialize, Serialize};

/// Deterministic function of the parents of a node, used as a read-only CPT.
///
/// The table has the target variable first, then the parents. Its value is 1 when the
/// target equals the aggregated value of the parents and 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregator {
    /// 1 if some parent is non-zero.
    Or,
    /// 1 if all parents are non-zero.
    And,
    /// Number of parents equal to the value, clipped to the target domain.
    Count(usize),
    /// 1 if some parent equals the value.
    Exists(usize),
    /// 1 if all parents equal the value.
    Forall(usize),
    /// Maximum parent value, clipped to the target domain.
    Max,
    /// Minimum parent value, clipped to the target domain.
    Min,
}

impl Aggregator {
    /// Value taken by the target for the given parent values.
    pub fn compute(&self, parents: &[usize], target_domain: usize) -> usize {
        let top = target_domain - 1;
        match self {
            Aggregator::Or => parents.iter().any(|p| *p != 0) as usize,
            Aggregator::And => parents.iter().all(|p| *p != 0) as usize,
            Aggregator::Count(v) => parents.iter().filter(|p| **p == *v).count().min(top),
            Aggregator::Exists(v) => parents.iter().any(|p| *p == *v) as usize,
            Aggregator::Forall(v) => parents.iter().all(|p| *p == *v) as usize,
            Aggregator::Max => parents.iter().copied().max().unwrap_or(0).min(top),
            Aggregator::Min => parents.iter().copied().min().unwrap_or(0).min(top),
        }
    }

    /// Smallest target domain able to hold every value of this aggregator.
    pub fn min_target_domain(&self) -> usize {
        match self {
            Aggregator::Or
            | Aggregator::And
            | Aggregator::Exists(_)
            | Aggregator::Forall(_) => 2,
            Aggregator::Count(_) | Aggregator::Max | Aggregator::Min => 1,
        }
    }

    pub(super) fn value(&self, vals: &[usize], target_domain: usize) -> f64 {
        if self.compute(&vals[1..], target_domain) == vals[0] {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_values() {
        assert_eq!(Aggregator::Or.compute(&[0, 0, 1], 2), 1);
        assert_eq!(Aggregator::And.compute(&[0, 1], 2), 0);
        assert_eq!(Aggregator::Count(2).compute(&[2, 2, 2, 0], 3), 2);
        assert_eq!(Aggregator::Forall(1).compute(&[], 2), 1);
        assert_eq!(Aggregator::Max.compute(&[1, 4], 3), 2);
        assert_eq!(Aggregator::Min.compute(&[], 3), 0);
    }
}
