//! Multidimensional tables (potentials) indexed by a sequence of variables.
//!
//! A [`Potential`] is a table over the Cartesian product of the domains of its variables.
//! Variables are referenced by [`NodeId`]; the domain sizes are stored alongside so that a
//! table never needs access to the model that declared its variables.
//!
//! Values are enumerated with the first variable varying fastest, as in [`Instantiation`].

mod aggregator;
mod ops;

pub use aggregator::Aggregator;
pub use ops::{CombineOp, ProjectOp, TableAlgebra};

use std::borrow::Cow;

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, ShapeBuilder, Zip};
use serde::{Deserialize, Serialize};

use crate::{Instantiation, NodeId, NodeSet, PgmError, Result};

/// Above this number of entries, combinations are computed in parallel.
const PAR_COMBINE_SIZE: usize = 1 << 16;

/// Storage kinds of a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TableRepr {
    /// Same value for every assignment.
    Constant(f64),
    /// One value per assignment, axis `i` indexed by the `i`-th variable.
    Dense(ArrayD<f64>),
    /// Read-only deterministic CPT, see [`Aggregator`].
    Aggregator(Aggregator),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Potential {
    vars: Vec<NodeId>,
    dims: Vec<usize>,
    repr: TableRepr,
}

/// Number of entries of a table with the given domain sizes.
pub fn table_size(dims: &[usize]) -> Result<usize> {
    dims.iter().try_fold(1usize, |acc, d| {
        acc.checked_mul(*d)
            .ok_or_else(|| PgmError::Size(format!("table of domain sizes {:?} is too large", dims)))
    })
}

impl Potential {
    fn build(vars: Vec<NodeId>, dims: Vec<usize>, repr: TableRepr) -> Result<Self> {
        if vars.len() != dims.len() {
            return Err(PgmError::InvalidArgument(format!(
                "{} variables but {} domain sizes",
                vars.len(),
                dims.len()
            )));
        }
        for (i, v) in vars.iter().enumerate() {
            if vars[..i].contains(v) {
                return Err(PgmError::InvalidArgument(format!(
                    "node {} appears twice in a table",
                    v
                )));
            }
        }
        if let Some(i) = dims.iter().position(|d| *d == 0) {
            return Err(PgmError::Size(format!("node {} has an empty domain", vars[i])));
        }
        table_size(&dims)?;
        Ok(Self { vars, dims, repr })
    }

    /// Table filled with ones.
    pub fn new(vars: Vec<NodeId>, dims: Vec<usize>) -> Result<Self> {
        Self::build(vars, dims, TableRepr::Constant(1.0))
    }

    pub fn constant(vars: Vec<NodeId>, dims: Vec<usize>, value: f64) -> Result<Self> {
        Self::build(vars, dims, TableRepr::Constant(value))
    }

    /// Table without variables, holding a single value.
    pub fn scalar(value: f64) -> Self {
        Self {
            vars: Vec::new(),
            dims: Vec::new(),
            repr: TableRepr::Constant(value),
        }
    }

    pub fn zeros(vars: Vec<NodeId>, dims: Vec<usize>) -> Result<Self> {
        let data: ArrayD<f64> = ArrayD::zeros(IxDyn(&dims));
        Self::build(vars, dims, TableRepr::Dense(data))
    }

    /// Table with the given values, enumerated first variable fastest.
    pub fn from_values(vars: Vec<NodeId>, dims: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let mut p = Self::new(vars, dims)?;
        p.fill_with(values)?;
        Ok(p)
    }

    /// Read-only deterministic table of `target` given `parents`.
    pub fn aggregator(
        kind: Aggregator,
        target: (NodeId, usize),
        parents: &[(NodeId, usize)],
    ) -> Result<Self> {
        if target.1 < kind.min_target_domain() {
            return Err(PgmError::Size(format!(
                "aggregator {:?} needs a target domain of at least {}",
                kind,
                kind.min_target_domain()
            )));
        }
        let vars = std::iter::once(target.0)
            .chain(parents.iter().map(|p| p.0))
            .collect();
        let dims = std::iter::once(target.1)
            .chain(parents.iter().map(|p| p.1))
            .collect();
        Self::build(vars, dims, TableRepr::Aggregator(kind))
    }

    /// Hard evidence: 1 at `value`, 0 elsewhere.
    pub fn indicator(var: NodeId, domain_size: usize, value: usize) -> Result<Self> {
        if value >= domain_size {
            return Err(PgmError::OutOfBounds {
                var: format!("node {}", var),
                value,
                domain_size,
            });
        }
        let mut values = vec![0.0; domain_size];
        values[value] = 1.0;
        Self::from_values(vec![var], vec![domain_size], values)
    }

    /// Soft evidence: one non-negative weight per value, not all zero.
    pub fn likelihood(var: NodeId, values: Vec<f64>) -> Result<Self> {
        if values.iter().any(|x| *x < 0.0 || !x.is_finite()) {
            return Err(PgmError::InvalidArgument(format!(
                "likelihood of node {} has negative or non-finite entries",
                var
            )));
        }
        if values.iter().all(|x| *x == 0.0) {
            return Err(PgmError::IncompatibleEvidence);
        }
        let n = values.len();
        Self::from_values(vec![var], vec![n], values)
    }

    pub fn vars(&self) -> &[NodeId] {
        &self.vars
    }
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
    pub fn nb_vars(&self) -> usize {
        self.vars.len()
    }
    pub fn var_set(&self) -> NodeSet {
        self.vars.iter().copied().collect()
    }
    pub fn contains(&self, var: NodeId) -> bool {
        self.vars.contains(&var)
    }
    pub fn pos(&self, var: NodeId) -> Option<usize> {
        self.vars.iter().position(|v| *v == var)
    }
    pub fn domain_size(&self) -> usize {
        self.dims.iter().product()
    }
    pub fn repr(&self) -> &TableRepr {
        &self.repr
    }
    pub fn is_dense(&self) -> bool {
        matches!(self.repr, TableRepr::Dense(_))
    }
    /// Bytes needed to hold the table densely.
    pub fn memory_size(&self) -> usize {
        self.domain_size() * std::mem::size_of::<f64>()
    }
    /// Instantiation over the variables of the table, at its first assignment.
    pub fn instantiation(&self) -> Instantiation {
        Instantiation::from_vars(&self.vars, &self.dims)
            .expect("table variables are distinct with non-empty domains")
    }

    fn value_at(&self, vals: &[usize]) -> f64 {
        match &self.repr {
            TableRepr::Constant(c) => *c,
            TableRepr::Dense(data) => data[vals],
            TableRepr::Aggregator(agg) => agg.value(vals, self.dims[0]),
        }
    }

    fn checked_vals(&self, inst: &Instantiation) -> Result<Vec<usize>> {
        self.vars
            .iter()
            .zip(self.dims.iter())
            .map(|(v, d)| {
                let val = inst.val(*v)?;
                if val >= *d {
                    Err(PgmError::OutOfBounds {
                        var: format!("node {}", v),
                        value: val,
                        domain_size: *d,
                    })
                } else {
                    Ok(val)
                }
            })
            .collect()
    }

    /// Value at the assignment of `inst`, which must contain every variable of the table.
    pub fn get(&self, inst: &Instantiation) -> Result<f64> {
        let vals = self.checked_vals(inst)?;
        Ok(self.value_at(&vals))
    }

    pub fn set(&mut self, inst: &Instantiation, value: f64) -> Result<()> {
        let vals = self.checked_vals(inst)?;
        self.dense_mut()?[vals.as_slice()] = value;
        Ok(())
    }

    /// All values, first variable fastest.
    pub fn to_vec(&self) -> Vec<f64> {
        self.dense_data().t().iter().copied().collect()
    }

    pub fn fill(&mut self, value: f64) -> Result<()> {
        if let TableRepr::Aggregator(_) = self.repr {
            return Err(PgmError::OperationNotAllowed(
                "aggregators are read-only".to_owned(),
            ));
        }
        self.repr = TableRepr::Constant(value);
        Ok(())
    }

    /// Replace all values, given first variable fastest.
    pub fn fill_with(&mut self, values: Vec<f64>) -> Result<()> {
        if let TableRepr::Aggregator(_) = self.repr {
            return Err(PgmError::OperationNotAllowed(
                "aggregators are read-only".to_owned(),
            ));
        }
        if values.len() != self.domain_size() {
            return Err(PgmError::Size(format!(
                "expected {} values, got {}",
                self.domain_size(),
                values.len()
            )));
        }
        let data = ArrayD::from_shape_vec(IxDyn(&self.dims).f(), values)
            .map_err(|e| PgmError::Size(e.to_string()))?;
        self.repr = TableRepr::Dense(data);
        Ok(())
    }

    /// The values as an array, axis `i` indexed by the `i`-th variable.
    pub fn dense_data(&self) -> Cow<'_, ArrayD<f64>> {
        match &self.repr {
            TableRepr::Dense(data) => Cow::Borrowed(data),
            TableRepr::Constant(c) => Cow::Owned(ArrayD::from_elem(IxDyn(&self.dims), *c)),
            TableRepr::Aggregator(_) => {
                let mut data: ArrayD<f64> = ArrayD::zeros(IxDyn(&self.dims));
                let mut inst = self.instantiation();
                while !inst.end() {
                    data[inst.values()] = self.value_at(inst.values());
                    inst.inc();
                }
                Cow::Owned(data)
            }
        }
    }

    fn dense_mut(&mut self) -> Result<&mut ArrayD<f64>> {
        match self.repr {
            TableRepr::Aggregator(_) => {
                return Err(PgmError::OperationNotAllowed(
                    "aggregators are read-only".to_owned(),
                ))
            }
            TableRepr::Constant(c) => {
                self.repr = TableRepr::Dense(ArrayD::from_elem(IxDyn(&self.dims), c))
            }
            TableRepr::Dense(_) => {}
        }
        match &mut self.repr {
            TableRepr::Dense(data) => Ok(data),
            _ => unreachable!("table was made dense"),
        }
    }

    /// View of the values with axes in the order of `vars`, a superset of the variables of
    /// this table. Missing variables get an axis of length 1.
    fn aligned<'a>(&self, data: &'a ArrayD<f64>, vars: &[NodeId]) -> ArrayViewD<'a, f64> {
        let mut view = data.view();
        let mut extra = self.vars.len();
        let perm: Vec<usize> = vars
            .iter()
            .map(|v| match self.pos(*v) {
                Some(i) => i,
                None => {
                    view = view.clone().insert_axis(Axis(view.ndim()));
                    extra += 1;
                    extra - 1
                }
            })
            .collect();
        view.permuted_axes(IxDyn(&perm))
    }

    /// Pointwise `op` over the union of the variables of both tables.
    ///
    /// The result holds the variables of `self` followed by those of `other` that are not in
    /// `self`.
    pub fn combine(&self, other: &Potential, op: CombineOp) -> Result<Potential> {
        let mut vars = self.vars.clone();
        let mut dims = self.dims.clone();
        for (v, d) in other.vars.iter().zip(other.dims.iter()) {
            match self.pos(*v) {
                Some(i) if self.dims[i] != *d => {
                    return Err(PgmError::Size(format!(
                        "node {} has domain size {} and {}",
                        v, self.dims[i], d
                    )));
                }
                Some(_) => {}
                None => {
                    vars.push(*v);
                    dims.push(*d);
                }
            }
        }
        let size = table_size(&dims)?;
        let shape = IxDyn(&dims);
        let broadcast_err = || PgmError::Size("cannot broadcast table".to_owned());
        let repr = match (&self.repr, &other.repr) {
            (TableRepr::Constant(a), TableRepr::Constant(b)) => {
                TableRepr::Constant(op.apply(*a, *b))
            }
            (TableRepr::Constant(a), _) => {
                let data = other.dense_data();
                let view = other.aligned(&data, &vars);
                let b = view.broadcast(shape).ok_or_else(broadcast_err)?;
                TableRepr::Dense(b.mapv(|y| op.apply(*a, y)))
            }
            (_, TableRepr::Constant(b)) => {
                let data = self.dense_data();
                let view = self.aligned(&data, &vars);
                let a = view.broadcast(shape).ok_or_else(broadcast_err)?;
                TableRepr::Dense(a.mapv(|x| op.apply(x, *b)))
            }
            _ => {
                let data_a = self.dense_data();
                let data_b = other.dense_data();
                let view_a = self.aligned(&data_a, &vars);
                let view_b = other.aligned(&data_b, &vars);
                let a = view_a.broadcast(shape.clone()).ok_or_else(broadcast_err)?;
                let b = view_b.broadcast(shape).ok_or_else(broadcast_err)?;
                let zip = Zip::from(a).and(b);
                TableRepr::Dense(if size >= PAR_COMBINE_SIZE {
                    zip.par_map_collect(|x, y| op.apply(*x, *y))
                } else {
                    zip.map_collect(|x, y| op.apply(*x, *y))
                })
            }
        };
        Ok(Potential { vars, dims, repr })
    }

    /// Eliminate `del_vars` with the reduction `op`. Variables not in the table are ignored;
    /// projecting over no variable returns a copy.
    pub fn project(&self, del_vars: &NodeSet, op: ProjectOp) -> Potential {
        let positions: Vec<usize> = (0..self.vars.len())
            .filter(|i| del_vars.contains(&self.vars[*i]))
            .collect();
        if positions.is_empty() {
            return self.clone();
        }
        let (vars, dims): (Vec<NodeId>, Vec<usize>) = self
            .vars
            .iter()
            .zip(self.dims.iter())
            .filter(|(v, _)| !del_vars.contains(v))
            .map(|(v, d)| (*v, *d))
            .unzip();
        let repr = match &self.repr {
            TableRepr::Constant(c) => {
                let n = positions.iter().map(|i| self.dims[*i]).product();
                TableRepr::Constant(op.reduce_constant(*c, n))
            }
            _ => {
                let mut data = self.dense_data().into_owned();
                for k in positions.into_iter().rev() {
                    data = match op {
                        ProjectOp::Sum => data.sum_axis(Axis(k)),
                        _ => data.map_axis(Axis(k), |lane| op.reduce(lane.iter().copied())),
                    };
                }
                TableRepr::Dense(data)
            }
        };
        Potential { vars, dims, repr }
    }

    /// Keep only the variables of `keep`.
    pub fn project_onto(&self, keep: &NodeSet, op: ProjectOp) -> Potential {
        let del_vars = self.var_set().difference(keep).copied().collect();
        self.project(&del_vars, op)
    }

    /// Same table with its variables in the order of `vars`.
    pub fn reorganize(&self, vars: &[NodeId]) -> Result<Potential> {
        if vars.len() != self.vars.len() || vars.iter().any(|v| !self.contains(*v)) {
            return Err(PgmError::InvalidArgument(format!(
                "{:?} is not a permutation of {:?}",
                vars, self.vars
            )));
        }
        let dims = vars
            .iter()
            .map(|v| self.dims[self.pos(*v).expect("checked above")])
            .collect();
        let repr = match &self.repr {
            TableRepr::Constant(c) => TableRepr::Constant(*c),
            _ => {
                let data = self.dense_data();
                TableRepr::Dense(self.aligned(&data, vars).to_owned())
            }
        };
        Ok(Potential {
            vars: vars.to_vec(),
            dims,
            repr,
        })
    }

    /// Fix the variables of `inst` to their values and drop them from the table.
    pub fn extract(&self, inst: &Instantiation) -> Result<Potential> {
        let fixed: Vec<(usize, usize)> = (0..self.vars.len())
            .filter_map(|i| inst.val(self.vars[i]).ok().map(|val| (i, val)))
            .collect();
        for (i, val) in fixed.iter() {
            if *val >= self.dims[*i] {
                return Err(PgmError::OutOfBounds {
                    var: format!("node {}", self.vars[*i]),
                    value: *val,
                    domain_size: self.dims[*i],
                });
            }
        }
        let (vars, dims): (Vec<NodeId>, Vec<usize>) = self
            .vars
            .iter()
            .zip(self.dims.iter())
            .filter(|(v, _)| !inst.contains(**v))
            .map(|(v, d)| (*v, *d))
            .unzip();
        let repr = match &self.repr {
            TableRepr::Constant(c) => TableRepr::Constant(*c),
            _ => {
                let mut data = self.dense_data().into_owned();
                for (i, val) in fixed.into_iter().rev() {
                    data = data.index_axis_move(Axis(i), val);
                }
                TableRepr::Dense(data)
            }
        };
        Ok(Potential { vars, dims, repr })
    }

    /// Apply `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Potential {
        let repr = match &self.repr {
            TableRepr::Constant(c) => TableRepr::Constant(f(*c)),
            _ => TableRepr::Dense(self.dense_data().mapv(f)),
        };
        Potential {
            vars: self.vars.clone(),
            dims: self.dims.clone(),
            repr,
        }
    }

    pub fn scale(&mut self, factor: f64) -> Result<()> {
        if let TableRepr::Constant(c) = &mut self.repr {
            *c *= factor;
            return Ok(());
        }
        self.dense_mut()?.mapv_inplace(|x| x * factor);
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        match &self.repr {
            TableRepr::Constant(c) => c * self.domain_size() as f64,
            _ => self.dense_data().sum(),
        }
    }
    pub fn max(&self) -> f64 {
        match &self.repr {
            TableRepr::Constant(c) => *c,
            _ => self.dense_data().fold(f64::NEG_INFINITY, |a, b| a.max(*b)),
        }
    }
    pub fn min(&self) -> f64 {
        match &self.repr {
            TableRepr::Constant(c) => *c,
            _ => self.dense_data().fold(f64::INFINITY, |a, b| a.min(*b)),
        }
    }

    /// First assignment (in enumeration order) reaching the maximum, with that maximum.
    pub fn argmax(&self) -> (Instantiation, f64) {
        let mut inst = self.instantiation();
        let mut best = inst.clone();
        let mut best_val = f64::NEG_INFINITY;
        while !inst.end() {
            let v = self.value_at(inst.values());
            if v > best_val {
                best_val = v;
                best = inst.clone();
            }
            inst.inc();
        }
        (best, best_val)
    }

    /// Divide by the sum of all values.
    ///
    /// Fails with [`PgmError::IncompatibleEvidence`] if that sum is zero (or not finite)
    /// instead of producing NaNs.
    pub fn normalize(&mut self) -> Result<()> {
        let s = self.sum();
        if !(s > 0.0) || !s.is_finite() {
            return Err(PgmError::IncompatibleEvidence);
        }
        self.scale(1.0 / s)
    }

    /// Normalize so that, for every assignment of the other variables, values sum to one
    /// over `var`.
    pub fn normalize_as_cpt(&mut self, var: NodeId) -> Result<()> {
        let k = self
            .pos(var)
            .ok_or_else(|| PgmError::NotFound(format!("node {} in table", var)))?;
        let data = self.dense_mut()?;
        for mut lane in data.lanes_mut(Axis(k)) {
            let s = lane.sum();
            if !(s > 0.0) {
                return Err(PgmError::InvalidArgument(format!(
                    "conditional distribution of node {} sums to {}",
                    var, s
                )));
            }
            lane.mapv_inplace(|x| x / s);
        }
        Ok(())
    }

    /// Shannon entropy (natural log) of the normalized table.
    pub fn entropy(&self) -> f64 {
        let s = self.sum();
        self.to_vec()
            .into_iter()
            .filter(|p| *p > 0.0)
            .map(|p| {
                let p = p / s;
                -p * p.ln()
            })
            .sum()
    }

    /// Same variables (in any order) and values within `eps`.
    pub fn approx_eq(&self, other: &Potential, eps: f64) -> bool {
        let Ok(other) = other.reorganize(&self.vars) else {
            return false;
        };
        if other.dims != self.dims {
            return false;
        }
        self.to_vec()
            .iter()
            .zip(other.to_vec().iter())
            .all(|(a, b)| (a - b).abs() <= eps || (a.is_infinite() && a == b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn values_first_variable_fastest() {
        let p = Potential::from_values(vec![4, 2], vec![2, 3], (0..6).map(f64::from).collect())
            .unwrap();
        let mut inst = Instantiation::from_vars(&[2, 4], &[3, 2]).unwrap();
        inst.chg_val(4, 1).unwrap();
        inst.chg_val(2, 2).unwrap();
        assert_eq!(p.get(&inst).unwrap(), 5.0);
        assert!(close(&p.to_vec(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]));
    }

    #[test]
    fn combine_broadcasts() {
        let a = Potential::from_values(vec![0], vec![2], vec![1.0, 2.0]).unwrap();
        let b = Potential::from_values(vec![1], vec![3], vec![1.0, 10.0, 100.0]).unwrap();
        let ab = a.combine(&b, CombineOp::Multiply).unwrap();
        assert_eq!(ab.vars(), &[0, 1]);
        assert!(close(
            &ab.to_vec(),
            &[1.0, 2.0, 10.0, 20.0, 100.0, 200.0]
        ));
        let c = Potential::from_values(vec![1, 0], vec![3, 2], vec![1.0; 6]).unwrap();
        let abc = ab.combine(&c, CombineOp::Add).unwrap();
        assert_eq!(abc.vars(), &[0, 1]);
        assert!(close(
            &abc.to_vec(),
            &[2.0, 3.0, 11.0, 21.0, 101.0, 201.0]
        ));
    }

    #[test]
    fn combine_with_constant_keeps_argument_order() {
        let a = Potential::constant(vec![0], vec![2], 6.0).unwrap();
        let b = Potential::from_values(vec![0], vec![2], vec![2.0, 3.0]).unwrap();
        assert!(close(
            &a.combine(&b, CombineOp::Divide).unwrap().to_vec(),
            &[3.0, 2.0]
        ));
        assert!(close(
            &b.combine(&a, CombineOp::Subtract).unwrap().to_vec(),
            &[-4.0, -3.0]
        ));
    }

    #[test]
    fn project_sum_and_max() {
        let p = Potential::from_values(vec![0, 1], vec![2, 2], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let s = p.project(&NodeSet::from([0]), ProjectOp::Sum);
        assert_eq!(s.vars(), &[1]);
        assert!(close(&s.to_vec(), &[0.30000000000000004, 0.7]));
        let m = p.project(&NodeSet::from([1]), ProjectOp::Max);
        assert!(close(&m.to_vec(), &[0.3, 0.4]));
        let id = p.project(&NodeSet::new(), ProjectOp::Sum);
        assert!(p.approx_eq(&id, 0.0));
    }

    #[test]
    fn aggregator_is_read_only() {
        let mut p = Potential::aggregator(Aggregator::Or, (0, 2), &[(1, 2), (2, 2)]).unwrap();
        assert!(close(
            &p.to_vec(),
            &[1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]
        ));
        assert!(p.fill(0.0).is_err());
        assert!(Potential::aggregator(Aggregator::And, (0, 1), &[]).is_err());
    }

    #[test]
    fn extract_and_reorganize() {
        let p = Potential::from_values(vec![0, 1], vec![2, 3], (0..6).map(f64::from).collect())
            .unwrap();
        let mut inst = Instantiation::from_vars(&[1], &[3]).unwrap();
        inst.chg_val(1, 2).unwrap();
        let e = p.extract(&inst).unwrap();
        assert_eq!(e.vars(), &[0]);
        assert!(close(&e.to_vec(), &[4.0, 5.0]));
        let r = p.reorganize(&[1, 0]).unwrap();
        assert!(close(&r.to_vec(), &[0.0, 2.0, 4.0, 1.0, 3.0, 5.0]));
        assert!(r.approx_eq(&p, 0.0));
    }

    #[test]
    fn normalization() {
        let mut p = Potential::zeros(vec![0], vec![3]).unwrap();
        assert!(matches!(
            p.normalize(),
            Err(PgmError::IncompatibleEvidence)
        ));
        let mut cpt = Potential::from_values(vec![0, 1], vec![2, 2], vec![1.0, 3.0, 2.0, 2.0])
            .unwrap();
        cpt.normalize_as_cpt(0).unwrap();
        assert!(close(&cpt.to_vec(), &[0.25, 0.75, 0.5, 0.5]));
    }

    #[test]
    fn evidence_tables() {
        let e = Potential::indicator(3, 4, 2).unwrap();
        assert!(close(&e.to_vec(), &[0.0, 0.0, 1.0, 0.0]));
        assert!(Potential::indicator(3, 4, 4).is_err());
        assert!(matches!(
            Potential::likelihood(3, vec![0.0, 0.0]),
            Err(PgmError::IncompatibleEvidence)
        ));
    }
}
