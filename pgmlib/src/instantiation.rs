//! Joint value assignment over an ordered sequence of variables.
//!
//! An [`Instantiation`] is a mixed-radix counter: [`Instantiation::inc`] advances the first
//! variable fastest and sets the end-of-iteration flag when the counter wraps around. While
//! that flag is set the current values are not a valid assignment.

use std::fmt;

use crate::{NodeId, NodeSet, PgmError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instantiation {
    vars: Vec<NodeId>,
    dims: Vec<usize>,
    vals: Vec<usize>,
    overflow: bool,
}

impl Instantiation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vars(vars: &[NodeId], dims: &[usize]) -> Result<Self> {
        if vars.len() != dims.len() {
            return Err(PgmError::InvalidArgument(format!(
                "{} variables but {} domain sizes",
                vars.len(),
                dims.len()
            )));
        }
        let mut inst = Self::new();
        for (v, d) in vars.iter().zip(dims.iter()) {
            inst.add(*v, *d)?;
        }
        Ok(inst)
    }

    /// Append a variable, with value 0.
    pub fn add(&mut self, var: NodeId, domain_size: usize) -> Result<()> {
        if self.vars.contains(&var) {
            return Err(PgmError::InvalidArgument(format!(
                "node {} is already in the instantiation",
                var
            )));
        }
        if domain_size == 0 {
            return Err(PgmError::Size(format!("node {} has an empty domain", var)));
        }
        self.vars.push(var);
        self.dims.push(domain_size);
        self.vals.push(0);
        Ok(())
    }

    pub fn erase(&mut self, var: NodeId) -> Result<()> {
        let i = self.pos(var)?;
        self.vars.remove(i);
        self.dims.remove(i);
        self.vals.remove(i);
        Ok(())
    }

    pub fn nb_vars(&self) -> usize {
        self.vars.len()
    }
    pub fn vars(&self) -> &[NodeId] {
        &self.vars
    }
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
    pub fn values(&self) -> &[usize] {
        &self.vals
    }
    pub fn contains(&self, var: NodeId) -> bool {
        self.vars.contains(&var)
    }
    pub fn pos(&self, var: NodeId) -> Result<usize> {
        self.vars
            .iter()
            .position(|v| *v == var)
            .ok_or_else(|| PgmError::NotFound(format!("node {} in instantiation", var)))
    }
    pub fn val(&self, var: NodeId) -> Result<usize> {
        Ok(self.vals[self.pos(var)?])
    }
    pub fn val_at(&self, i: usize) -> usize {
        self.vals[i]
    }

    /// Number of joint assignments.
    pub fn domain_size(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn chg_val(&mut self, var: NodeId, value: usize) -> Result<()> {
        let i = self.pos(var)?;
        if value >= self.dims[i] {
            return Err(PgmError::OutOfBounds {
                var: format!("node {}", var),
                value,
                domain_size: self.dims[i],
            });
        }
        self.vals[i] = value;
        self.overflow = false;
        Ok(())
    }

    /// Copy the values of the variables shared with `other`.
    pub fn set_vals(&mut self, other: &Instantiation) {
        for (i, v) in self.vars.iter().enumerate() {
            if let Ok(j) = other.pos(*v) {
                self.vals[i] = other.vals[j];
            }
        }
        self.overflow = false;
    }

    pub fn set_first(&mut self) {
        self.vals.iter_mut().for_each(|v| *v = 0);
        self.overflow = false;
    }

    pub fn set_last(&mut self) {
        for (v, d) in self.vals.iter_mut().zip(self.dims.iter()) {
            *v = d - 1;
        }
        self.overflow = false;
    }

    /// Whether the last `inc` wrapped around.
    pub fn end(&self) -> bool {
        self.overflow
    }

    /// Whether the last `dec` wrapped around.
    pub fn rend(&self) -> bool {
        self.overflow
    }

    pub fn inc(&mut self) {
        for (v, d) in self.vals.iter_mut().zip(self.dims.iter()) {
            *v += 1;
            if *v < *d {
                return;
            }
            *v = 0;
        }
        self.overflow = true;
    }

    pub fn dec(&mut self) {
        for (v, d) in self.vals.iter_mut().zip(self.dims.iter()) {
            if *v > 0 {
                *v -= 1;
                return;
            }
            *v = d - 1;
        }
        self.overflow = true;
    }

    /// Increment only the variables of `subset`, leaving the others unchanged.
    pub fn inc_in(&mut self, subset: &NodeSet) {
        self.inc_filtered(|v| subset.contains(&v));
    }

    /// Increment only the variables not in `subset`.
    pub fn inc_out(&mut self, subset: &NodeSet) {
        self.inc_filtered(|v| !subset.contains(&v));
    }

    fn inc_filtered(&mut self, keep: impl Fn(NodeId) -> bool) {
        for i in 0..self.vars.len() {
            if !keep(self.vars[i]) {
                continue;
            }
            self.vals[i] += 1;
            if self.vals[i] < self.dims[i] {
                return;
            }
            self.vals[i] = 0;
        }
        self.overflow = true;
    }

    /// Position of the assignment in the enumeration order (first variable fastest).
    pub fn offset(&self) -> usize {
        self.vals
            .iter()
            .zip(self.dims.iter())
            .rev()
            .fold(0, |acc, (v, d)| acc * d + v)
    }

    /// Instantiation over `vars` at the assignment of position `offset`.
    pub fn from_offset(vars: &[NodeId], dims: &[usize], offset: usize) -> Result<Self> {
        let mut inst = Self::from_vars(vars, dims)?;
        inst.set_offset(offset)?;
        Ok(inst)
    }

    pub fn set_offset(&mut self, mut offset: usize) -> Result<()> {
        if offset >= self.domain_size() {
            return Err(PgmError::OutOfBounds {
                var: "offset".to_owned(),
                value: offset,
                domain_size: self.domain_size(),
            });
        }
        for (v, d) in self.vals.iter_mut().zip(self.dims.iter()) {
            *v = offset % d;
            offset /= d;
        }
        self.overflow = false;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.vars.iter().copied().zip(self.vals.iter().copied())
    }
}

impl fmt::Display for Instantiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, (var, val)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{}:{}", var, val)?;
        }
        write!(f, ">")
    }
}
